use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A single JSON document on disk. Saves always write the whole document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when the file does not exist yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| AppError::Config {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Create the parent directory, then replace the file through a sibling temp file.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_all(json.as_bytes()).map_err(|source| AppError::Persist {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }
}
