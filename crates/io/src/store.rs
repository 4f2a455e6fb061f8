//! Named JSON documents in one directory (templates, saved rule sets).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all `.json` files, sorted. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>, IoError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IoError::read(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IoError::read(&self.dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".json") {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<Value, IoError> {
        let path = self.path_for(name)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(IoError::NotFound(name.to_string())),
            Err(e) => return Err(IoError::read(&path, e)),
        };
        serde_json::from_str(&text).map_err(|e| IoError::Json { path, message: e.to_string() })
    }

    /// Write pretty-printed JSON, creating the directory if needed.
    pub fn save(&self, name: &str, document: &Value) -> Result<SaveOutcome, IoError> {
        let path = self.path_for(name)?;
        let outcome = if path.exists() { SaveOutcome::Updated } else { SaveOutcome::Created };

        std::fs::create_dir_all(&self.dir).map_err(|e| IoError::write(&self.dir, e))?;
        let mut text = serde_json::to_string_pretty(document)
            .map_err(|e| IoError::Json { path: path.clone(), message: e.to_string() })?;
        text.push('\n');
        std::fs::write(&path, text).map_err(|e| IoError::write(&path, e))?;

        log::info!("{outcome:?} {}", path.display());
        Ok(outcome)
    }

    pub fn delete(&self, name: &str) -> Result<(), IoError> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IoError::NotFound(name.to_string())),
            Err(e) => Err(IoError::write(&path, e)),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, IoError> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }
}

fn validate_name(name: &str) -> Result<(), IoError> {
    let reject = |reason| Err(IoError::InvalidName { name: name.to_string(), reason });

    if name.trim().is_empty() {
        return reject("empty");
    }
    if name.contains("..") {
        return reject("contains '..'");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("contains a path separator");
    }
    if name.chars().any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_control()) {
        return reject("contains a reserved character");
    }
    if !name.ends_with(".json") || name == ".json" {
        return reject("must end in .json");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn save_list_load_delete() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("templates"));
        assert!(store.list().unwrap().is_empty());

        let doc = json!({"id": "{func.next_id}", "name": "{row.Name}"});
        assert_eq!(store.save("vq.json", &doc).unwrap(), SaveOutcome::Created);
        assert_eq!(store.save("ag.json", &doc).unwrap(), SaveOutcome::Created);
        assert_eq!(store.save("vq.json", &json!({})).unwrap(), SaveOutcome::Updated);
        std::fs::write(dir.path().join("templates/notes.txt"), "x").unwrap();

        assert_eq!(store.list().unwrap(), ["ag.json", "vq.json"]);
        assert_eq!(store.load("ag.json").unwrap(), doc);
        assert_eq!(store.load("vq.json").unwrap(), json!({}));

        let text = std::fs::read_to_string(dir.path().join("templates/ag.json")).unwrap();
        assert!(text.starts_with("{\n  \"id\""));

        store.delete("vq.json").unwrap();
        assert_eq!(store.list().unwrap(), ["ag.json"]);
        assert!(matches!(store.delete("vq.json"), Err(IoError::NotFound(_))));
        assert!(matches!(store.load("vq.json"), Err(IoError::NotFound(_))));
    }

    #[test]
    fn rejects_unsafe_names() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        for name in ["../x.json", "a/b.json", "a\\b.json", "x.txt", "", ".json", "a:b.json", "a?.json"] {
            assert!(
                matches!(store.save(name, &json!({})), Err(IoError::InvalidName { .. })),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let store = JsonStore::new(dir.path());
        assert!(matches!(store.load("broken.json"), Err(IoError::Json { .. })));
    }
}
