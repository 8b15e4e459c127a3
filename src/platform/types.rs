use crate::error::AppError;
use std::io;
use std::path::Path;

/// Read/write access to system files such as the hosts file.
pub trait FileAccess: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Source of running process names, one snapshot per call.
pub trait ProcessSource: Send {
    fn process_names(&mut self) -> Result<Vec<String>, AppError>;
}
