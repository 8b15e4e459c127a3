//! File logging: one `<timestamp> [<LEVEL>] <message>` line per record.
//!
//! `log` macros are used everywhere; this module only installs the backend.
//! `RUST_LOG` overrides the level passed to [`init`].

use crate::error::AppError;
use chrono::{DateTime, Local};
use log::{Level, LevelFilter};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub fn format_line(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!("{} [{level}] {message}", timestamp.format("%Y-%m-%d %H:%M:%S%.3f"))
}

/// Install the global logger, appending to `log_path`.
pub fn init(log_path: &Path, level: LevelFilter) -> Result<(), AppError> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let line = format_line(&Local::now(), record.level(), &record.args().to_string());
            writeln!(buf, "{line}")
        })
        .try_init()
        .map_err(|e| AppError::Config {
            path: log_path.to_path_buf(),
            reason: e.to_string(),
        })
}
