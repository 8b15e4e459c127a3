//! Shared test utilities for Guardian.
//!
//! In-memory stand-ins for the platform capabilities, so tests never touch
//! the real hosts file or process table.

#![cfg(test)]

use crate::error::AppError;
use crate::platform::{FileAccess, ProcessSource};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared in-memory file map. Clones see the same files.
#[derive(Clone, Default)]
pub struct MemoryFiles {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryFiles {
    pub fn insert(&self, path: impl AsRef<Path>, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content.to_string());
    }

    pub fn content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Make every write fail as if the process lacked privileges.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl FileAccess for MemoryFiles {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.content(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.insert(path, content);
        Ok(())
    }
}

/// Replays queued snapshots, then keeps returning the fallback.
#[derive(Clone, Default)]
pub struct ScriptedProcesses {
    queue: Arc<Mutex<VecDeque<Result<Vec<String>, String>>>>,
    fallback: Vec<String>,
}

impl ScriptedProcesses {
    pub fn always(names: &[&str]) -> Self {
        Self {
            queue: Arc::default(),
            fallback: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    pub fn push(&self, names: &[&str]) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Ok(names.iter().map(|n| (*n).to_string()).collect()));
    }

    pub fn push_failure(&self, reason: &str) {
        self.queue.lock().unwrap().push_back(Err(reason.to_string()));
    }
}

impl ProcessSource for ScriptedProcesses {
    fn process_names(&mut self) -> Result<Vec<String>, AppError> {
        match self.queue.lock().unwrap().pop_front() {
            Some(Ok(names)) => Ok(names),
            Some(Err(reason)) => Err(AppError::Snapshot(reason)),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// A process source whose first snapshot panics, taking the monitor thread down.
pub struct CrashingProcesses;

impl ProcessSource for CrashingProcesses {
    #[allow(clippy::panic, reason = "simulates a crashing platform call")]
    fn process_names(&mut self) -> Result<Vec<String>, AppError> {
        panic!("process table exploded");
    }
}
