// src/constants.rs

/// Seconds between two process snapshots
pub const POLL_INTERVAL_SECS: u64 = 1;

/// Points awarded for every block event
pub const POINTS_PER_BLOCK: u32 = 10;

/// Points needed per level
pub const POINTS_PER_LEVEL: u32 = 100;

/// Daily focus goal used by the productivity score (8 hours)
pub const FOCUS_GOAL_MINUTES: u32 = 480;

/// Days the weekly average is always divided by
pub const DAYS_PER_WEEK: u32 = 7;

/// Address that blocked domains resolve to
pub const BLOCK_ADDRESS: &str = "127.0.0.1";

/// Profile used when the configured one does not exist
pub const DEFAULT_PROFILE: &str = "default";

/// Maximum length of a blocked app name
pub const MAX_APP_NAME_LEN: usize = 100;

/// Maximum length of a domain (RFC 1035)
pub const MAX_DOMAIN_LEN: usize = 253;

pub const SETTINGS_FILE_NAME: &str = "guardian_settings.json";
pub const STATS_FILE_NAME: &str = "guardian_stats.json";
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = "guardian.log";
