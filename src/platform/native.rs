use super::{FileAccess, ProcessSource};
use crate::error::AppError;
use std::fs;
use std::io;
use std::path::Path;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Plain filesystem access. Writes need the privileges the target file demands.
pub struct NativeFiles;

impl FileAccess for NativeFiles {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        fs::write(path, content)
    }
}

/// Process snapshots backed by `sysinfo`.
pub struct NativeProcesses {
    system: System,
}

impl Default for NativeProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeProcesses {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl ProcessSource for NativeProcesses {
    fn process_names(&mut self) -> Result<Vec<String>, AppError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(AppError::Snapshot(
                "process enumeration is not supported on this platform".into(),
            ));
        }

        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

        Ok(self
            .system
            .processes()
            .values()
            .map(|p| p.name().to_string_lossy().to_lowercase())
            .collect())
    }
}
