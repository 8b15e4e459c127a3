use crate::constants::BLOCK_ADDRESS;
use crate::error::AppError;
use crate::platform::FileAccess;
use log::info;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Domain blocking through `127.0.0.1` entries in the hosts file.
///
/// `blocked` mirrors what this process wrote. It is advisory: edits made to
/// the file by anything else are not reflected in it.
pub struct HostBlocklist {
    files: Box<dyn FileAccess>,
    hosts_path: PathBuf,
    blocked: BTreeSet<String>,
}

impl HostBlocklist {
    pub fn new(files: Box<dyn FileAccess>, hosts_path: impl Into<PathBuf>) -> Self {
        Self {
            files,
            hosts_path: hosts_path.into(),
            blocked: BTreeSet::new(),
        }
    }

    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    /// Append the entry unless the file already contains it.
    ///
    /// Presence is a substring check, so an existing entry for a longer
    /// domain with this one as a prefix also counts as present.
    pub fn block_site(&mut self, domain: &str) -> Result<(), AppError> {
        let entry = format!("{BLOCK_ADDRESS} {domain}");
        let mut content = self.read_hosts()?;

        if !content.contains(&entry) {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&entry);
            content.push('\n');
            self.write_hosts(&content)?;
            info!("Blocked site: {domain}");
        }

        self.blocked.insert(domain.to_string());
        Ok(())
    }

    /// Drop every line mentioning the domain, including unrelated hosts that contain it.
    pub fn unblock_site(&mut self, domain: &str) -> Result<(), AppError> {
        let content = self.read_hosts()?;
        let kept: String = content
            .split_inclusive('\n')
            .filter(|line| !line.contains(domain))
            .collect();

        if kept.len() != content.len() {
            self.write_hosts(&kept)?;
            info!("Unblocked site: {domain}");
        }

        self.blocked.remove(domain);
        Ok(())
    }

    pub fn blocked_sites(&self) -> &BTreeSet<String> {
        &self.blocked
    }

    /// Domains the file currently points at the block address.
    pub fn scan_hosts(&self) -> Result<Vec<String>, AppError> {
        let content = self.read_hosts()?;
        let mut domains = Vec::new();

        for line in content.lines().map(str::trim) {
            if line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            if parts.next() != Some(BLOCK_ADDRESS) {
                continue;
            }
            for domain in parts.take_while(|p| !p.starts_with('#')) {
                if domain != "localhost" && !domains.iter().any(|d| d == domain) {
                    domains.push(domain.to_string());
                }
            }
        }

        Ok(domains)
    }

    fn read_hosts(&self) -> Result<String, AppError> {
        match self.files.read(&self.hosts_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AppError::from_io(&self.hosts_path, e)),
        }
    }

    fn write_hosts(&self, content: &str) -> Result<(), AppError> {
        self.files
            .write(&self.hosts_path, content)
            .map_err(|e| AppError::from_io(&self.hosts_path, e))
    }
}
