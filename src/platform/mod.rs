pub mod native;
pub mod types;

pub use native::{NativeFiles, NativeProcesses};
pub use types::{FileAccess, ProcessSource};

use std::path::PathBuf;

/// Return the system hosts file path.
#[cfg(target_os = "windows")]
pub fn hosts_file_path() -> PathBuf {
    let root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".into());
    PathBuf::from(root).join(r"System32\drivers\etc\hosts")
}

/// Return the system hosts file path.
#[cfg(target_os = "macos")]
pub fn hosts_file_path() -> PathBuf {
    PathBuf::from("/private/etc/hosts")
}

/// Return the system hosts file path.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub fn hosts_file_path() -> PathBuf {
    PathBuf::from("/etc/hosts")
}
