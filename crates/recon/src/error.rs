use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (no entities, empty reference path, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A configured entity class has no reference data.
    #[error("entity class '{0}': no reference data supplied")]
    MissingReference(String),
    /// Reference data is not shaped as a key → attributes object.
    #[error("reference data: {0}")]
    ReferenceShape(String),
}
