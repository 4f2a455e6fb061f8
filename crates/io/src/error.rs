use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", .path.display())]
    Workbook { path: PathBuf, message: String },

    #[error("{}: invalid JSON: {message}", .path.display())]
    Json { path: PathBuf, message: String },

    #[error("reference data: {0}")]
    Reference(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("'{0}' does not exist")]
    NotFound(String),
}

impl IoError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Read { path: path.into(), source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Write { path: path.into(), source }
    }

    pub(crate) fn workbook(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        IoError::Workbook { path: path.into(), message: message.to_string() }
    }
}
