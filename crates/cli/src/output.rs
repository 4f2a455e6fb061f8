use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::CliError;

/// Pretty JSON to a file and/or stdout. stdout carries exactly one JSON
/// value; human summaries go to stderr.
pub(crate) fn emit_json<T: Serialize>(value: &T, to_stdout: bool, file: Option<&Path>) -> Result<(), CliError> {
    let json_str =
        serde_json::to_string_pretty(value).map_err(|e| CliError::data(format!("JSON serialization error: {e}")))?;

    if let Some(path) = file {
        std::fs::write(path, format!("{json_str}\n")).map_err(|e| CliError::file(path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if to_stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json_str}").map_err(|e| CliError::file(Path::new("<stdout>"), e))?;
    }
    Ok(())
}

/// Read a file as text, mapping failures to the I/O exit code.
pub(crate) fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::file(path, e))
}
