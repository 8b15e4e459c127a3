pub mod analytics;
pub mod blocker;
pub mod config;
pub mod constants;
pub mod error;
pub mod gamification;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod platform;
pub mod session;
pub mod state;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod timer;
pub mod tracker;
pub mod validation;

use crate::blocker::HostBlocklist;
use crate::config::SettingsStore;
use crate::constants::{LOG_DIR_NAME, LOG_FILE_NAME, SETTINGS_FILE_NAME, STATS_FILE_NAME};
use crate::error::AppError;
use crate::gamification::ProgressTracker;
use crate::models::{
    AppBreakdown, DailyStats, ProgressStatus, Settings, StatsSnapshot, WeeklyStats,
};
use crate::monitor::ProcessMonitor;
use crate::platform::{FileAccess, NativeFiles, NativeProcesses, ProcessSource};
use crate::state::{safe_lock, GuardianState, SharedState};
use crate::store::JsonStore;
use crate::timer::{FocusTimer, TimerStatus};
use crate::tracker::{TrackerConfig, TrackerService};
use crate::validation::normalize_domain;
use chrono::Local;
use directories::ProjectDirs;
use log::{error, info, warn};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Where Guardian keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub settings_file: PathBuf,
    pub stats_file: PathBuf,
    pub log_file: PathBuf,
    pub hosts_file: PathBuf,
}

impl AppPaths {
    /// Everything under one directory.
    pub fn in_dir(home: &Path) -> Self {
        Self {
            settings_file: home.join(SETTINGS_FILE_NAME),
            stats_file: home.join(STATS_FILE_NAME),
            log_file: home.join(LOG_DIR_NAME).join(LOG_FILE_NAME),
            hosts_file: platform::hosts_file_path(),
        }
    }

    /// `home`, else `GUARDIAN_HOME`, else the platform's project directories.
    pub fn resolve(home: Option<PathBuf>) -> Result<Self, AppError> {
        if let Some(home) = home.or_else(|| std::env::var_os("GUARDIAN_HOME").map(PathBuf::from)) {
            return Ok(Self::in_dir(&home));
        }

        let dirs = ProjectDirs::from("com", "guardian", "Guardian").ok_or(AppError::NoProjectDirs)?;
        let data_dir = dirs.data_dir();
        Ok(Self {
            settings_file: dirs.config_dir().join(SETTINGS_FILE_NAME),
            stats_file: data_dir.join(STATS_FILE_NAME),
            log_file: data_dir.join(LOG_DIR_NAME).join(LOG_FILE_NAME),
            hosts_file: platform::hosts_file_path(),
        })
    }

    pub fn with_hosts_file(mut self, hosts_file: PathBuf) -> Self {
        self.hosts_file = hosts_file;
        self
    }
}

enum MonitorSlot {
    Idle(ProcessMonitor),
    Running(JoinHandle<ProcessMonitor>),
    /// The monitor thread panicked and took its process source with it.
    Empty,
}

/// The one context object built at startup. Front ends talk only to this.
pub struct Guardian {
    paths: AppPaths,
    settings_store: SettingsStore,
    settings: Mutex<Settings>,
    state: SharedState,
    blocklist: Mutex<HostBlocklist>,
    tracker: TrackerService,
    monitor: Mutex<MonitorSlot>,
}

impl Guardian {
    /// Build against the real hosts file and process table.
    pub fn open(paths: AppPaths) -> Self {
        Self::with_platform(
            paths,
            Box::new(NativeFiles),
            Box::new(NativeProcesses::new()),
            TrackerConfig::default(),
        )
    }

    pub fn with_platform(
        paths: AppPaths,
        files: Box<dyn FileAccess>,
        processes: Box<dyn ProcessSource>,
        config: TrackerConfig,
    ) -> Self {
        let settings_store = SettingsStore::new(&paths.settings_file);
        let settings = settings_store.load();

        let progress = ProgressTracker::open(&paths.stats_file);
        let state = GuardianState::new(progress).into_shared();

        let blocklist = HostBlocklist::new(files, &paths.hosts_file);
        let monitor = ProcessMonitor::new(processes, settings.active_blocked_apps(Local::now().time()));
        let tracker = TrackerService::new(Arc::clone(&state), config);

        Self {
            paths,
            settings_store,
            settings: Mutex::new(settings),
            state,
            blocklist: Mutex::new(blocklist),
            tracker,
            monitor: Mutex::new(MonitorSlot::Idle(monitor)),
        }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Returns `false` if the monitor was already running or has crashed.
    pub fn start(&self) -> bool {
        let settings = self.settings();
        let mut slot = safe_lock(&self.monitor, "Monitor");
        match mem::replace(&mut *slot, MonitorSlot::Empty) {
            MonitorSlot::Idle(monitor) => {
                *slot = MonitorSlot::Running(self.tracker.start(monitor, settings));
                info!("Guardian started");
                true
            }
            running @ MonitorSlot::Running(_) => {
                *slot = running;
                false
            }
            MonitorSlot::Empty => false,
        }
    }

    /// Stop the loop and wait for its current cycle to finish.
    ///
    /// Returns `Ok(false)` if it was not running. A panicked loop is reported
    /// once as [`AppError::MonitorCrashed`] and the monitor cannot be restarted.
    pub fn stop(&self) -> Result<bool, AppError> {
        let mut slot = safe_lock(&self.monitor, "Monitor");
        match mem::replace(&mut *slot, MonitorSlot::Empty) {
            MonitorSlot::Running(handle) => {
                self.tracker.stop();
                let monitor = handle.join().map_err(|_| {
                    error!("Monitor thread panicked");
                    AppError::MonitorCrashed
                })?;
                *slot = MonitorSlot::Idle(monitor);
                info!("Guardian stopped");
                Ok(true)
            }
            idle @ MonitorSlot::Idle(_) => {
                *slot = idle;
                Ok(false)
            }
            MonitorSlot::Empty => Ok(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.tracker.is_running()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        safe_lock(&self.state, "Guardian state").progress.snapshot()
    }

    pub fn progress_status(&self) -> ProgressStatus {
        safe_lock(&self.state, "Guardian state").progress.status()
    }

    /// Manual adjustment from the front end.
    pub fn add_points(&self, amount: u32) -> Result<(), AppError> {
        safe_lock(&self.state, "Guardian state").progress.add_points(amount)
    }

    pub fn update_streak(&self) -> Result<bool, AppError> {
        safe_lock(&self.state, "Guardian state").progress.update_streak()
    }

    /// Also warns once a day when focus time passes `daily_limit_minutes`.
    pub fn record_focus_session(&self, minutes: u32, quality: Option<f64>) -> Result<(), AppError> {
        let limit = self.settings().daily_limit_minutes;
        safe_lock(&self.state, "Guardian state").record_focus_session_at(minutes, quality, Local::now(), limit)
    }

    /// Begin a pomodoro cycle using the configured work and break lengths.
    ///
    /// The timer advances only while the monitor runs. Returns `false` if one is already going.
    pub fn start_focus_timer(&self) -> bool {
        let settings = self.settings();
        let mut state = safe_lock(&self.state, "Guardian state");
        if state.timer.is_some() {
            return false;
        }
        state.timer = Some(FocusTimer::from_settings(&settings, Local::now()));
        info!(
            "Focus timer started: {} min work, {} min break",
            settings.pomodoro_minutes, settings.break_minutes
        );
        true
    }

    /// Drops the running timer. The unfinished work block is not recorded.
    pub fn stop_focus_timer(&self) -> bool {
        let stopped = safe_lock(&self.state, "Guardian state").timer.take().is_some();
        if stopped {
            info!("Focus timer stopped");
        }
        stopped
    }

    pub fn timer_status(&self) -> Option<TimerStatus> {
        safe_lock(&self.state, "Guardian state")
            .timer
            .as_ref()
            .map(|t| t.status_at(Local::now()))
    }

    pub fn daily_stats(&self) -> DailyStats {
        safe_lock(&self.state, "Guardian state").analytics.daily_stats()
    }

    pub fn weekly_stats(&self) -> WeeklyStats {
        safe_lock(&self.state, "Guardian state").analytics.weekly_stats()
    }

    pub fn productivity_score(&self) -> u8 {
        safe_lock(&self.state, "Guardian state").analytics.productivity_score()
    }

    pub fn app_breakdown(&self) -> AppBreakdown {
        safe_lock(&self.state, "Guardian state").analytics.app_breakdown()
    }

    /// Placeholder for a configuration panel: logs and returns the settings path.
    pub fn open_config(&self) -> &Path {
        info!("Configuration panel requested");
        self.settings_store.path()
    }

    pub fn settings(&self) -> Settings {
        safe_lock(&self.settings, "Settings").clone()
    }

    /// Write a backup copy of the current settings to `path`.
    pub fn export_settings(&self, path: &Path) -> Result<(), AppError> {
        JsonStore::new(path).save(&self.settings())?;
        info!("Settings exported to {}", path.display());
        Ok(())
    }

    /// Replace the settings with a backup. The backup is repaired like a hand-edited file.
    pub fn import_settings(&self, path: &Path) -> Result<(), AppError> {
        let imported: Settings = JsonStore::new(path).load()?.ok_or_else(|| AppError::NotFound {
            entity: "Backup",
            name: path.display().to_string(),
        })?;
        self.update_settings(|settings| {
            *settings = imported;
            Ok(())
        })?;
        info!("Settings imported from {}", path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the settings, then validate, save and publish it.
    ///
    /// Nothing is kept if `change` or the save fails.
    pub fn update_settings<T>(
        &self,
        change: impl FnOnce(&mut Settings) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let (result, apps) = {
            let mut current = safe_lock(&self.settings, "Settings");
            let mut updated = current.clone();
            let result = change(&mut updated)?;
            updated.validate();

            self.settings_store.save(&updated)?;
            self.tracker.update_settings(&updated);
            let apps = updated.active_blocked_apps(Local::now().time());
            *current = updated;
            (result, apps)
        };

        if let MonitorSlot::Idle(monitor) = &mut *safe_lock(&self.monitor, "Monitor") {
            monitor.set_blocked_apps(apps);
        }
        Ok(result)
    }

    /// Returns the normalized domain. Whitelisted domains are refused.
    pub fn block_site(&self, input: &str) -> Result<String, AppError> {
        let domain = normalize_domain(input)?;
        if self.settings().is_whitelisted(&domain) {
            return Err(AppError::InvalidInput {
                field: "domain",
                reason: format!("'{domain}' is whitelisted"),
            });
        }
        safe_lock(&self.blocklist, "Blocklist").block_site(&domain)?;
        Ok(domain)
    }

    pub fn unblock_site(&self, input: &str) -> Result<String, AppError> {
        let domain = normalize_domain(input)?;
        safe_lock(&self.blocklist, "Blocklist").unblock_site(&domain)?;
        Ok(domain)
    }

    /// Domains blocked by this process (the in-memory mirror).
    pub fn blocked_sites(&self) -> Vec<String> {
        safe_lock(&self.blocklist, "Blocklist")
            .blocked_sites()
            .iter()
            .cloned()
            .collect()
    }

    /// Domains the hosts file currently blocks.
    pub fn scan_hosts(&self) -> Result<Vec<String>, AppError> {
        safe_lock(&self.blocklist, "Blocklist").scan_hosts()
    }
}

impl Drop for Guardian {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Shutdown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CrashingProcesses, MemoryFiles, ScriptedProcesses};
    use std::thread;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    const HOSTS: &str = "/etc/hosts";

    fn setup(processes: ScriptedProcesses) -> (Guardian, MemoryFiles, TempDir) {
        let dir = tempdir().unwrap();
        let files = MemoryFiles::default();
        files.insert(HOSTS, "127.0.0.1 localhost\n");
        let paths = AppPaths::in_dir(dir.path()).with_hosts_file(PathBuf::from(HOSTS));
        let guardian = Guardian::with_platform(
            paths,
            Box::new(files.clone()),
            Box::new(processes),
            TrackerConfig {
                poll_interval: Duration::from_millis(10),
            },
        );
        (guardian, files, dir)
    }

    #[test]
    fn test_app_paths_in_dir() {
        let paths = AppPaths::in_dir(Path::new("/tmp/g"));
        assert_eq!(paths.settings_file, PathBuf::from("/tmp/g/guardian_settings.json"));
        assert_eq!(paths.stats_file, PathBuf::from("/tmp/g/guardian_stats.json"));
        assert_eq!(paths.log_file, PathBuf::from("/tmp/g/logs/guardian.log"));
    }

    #[test]
    fn test_start_stop_restart() {
        let (guardian, _files, _dir) = setup(ScriptedProcesses::default());

        assert!(guardian.start());
        assert!(!guardian.start());
        assert!(guardian.is_running());

        assert!(guardian.stop().unwrap());
        assert!(!guardian.stop().unwrap());
        assert!(!guardian.is_running());

        assert!(guardian.start());
        assert!(guardian.stop().unwrap());
    }

    #[test]
    fn test_monitor_loop_updates_snapshot() {
        let processes = ScriptedProcesses::default();
        processes.push(&["instagram"]);
        let (guardian, _files, _dir) = setup(processes);

        guardian.start();
        thread::sleep(Duration::from_millis(100));
        guardian.stop().unwrap();

        let snapshot = guardian.stats_snapshot();
        assert_eq!(snapshot.blocks, 1);
        assert_eq!(snapshot.points, 35);
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.streak, 1);
        assert_eq!(guardian.app_breakdown().most_blocked.as_deref(), Some("Instagram"));
    }

    #[test]
    fn test_progress_survives_restart() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::in_dir(dir.path()).with_hosts_file(PathBuf::from(HOSTS));

        let guardian = Guardian::with_platform(
            paths.clone(),
            Box::new(MemoryFiles::default()),
            Box::new(ScriptedProcesses::default()),
            TrackerConfig::default(),
        );
        guardian.add_points(120).unwrap();
        drop(guardian);

        let reopened = Guardian::with_platform(
            paths,
            Box::new(MemoryFiles::default()),
            Box::new(ScriptedProcesses::default()),
            TrackerConfig::default(),
        );
        assert_eq!(reopened.stats_snapshot().points, 120);
        assert_eq!(reopened.stats_snapshot().level, 2);
    }

    #[test]
    fn test_update_settings_persists() {
        let (guardian, _files, dir) = setup(ScriptedProcesses::default());

        let added = guardian.update_settings(|s| s.add_blocked_app("Steam")).unwrap();
        assert!(added);
        assert!(guardian.settings().blocked_apps.contains("Steam"));

        let reloaded = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME)).load();
        assert!(reloaded.blocked_apps.contains("Steam"));
    }

    #[test]
    fn test_failed_update_keeps_settings() {
        let (guardian, _files, _dir) = setup(ScriptedProcesses::default());
        let before = guardian.settings();

        assert!(guardian.update_settings(|s| s.switch_profile("gaming")).is_err());
        assert_eq!(guardian.settings(), before);
    }

    #[test]
    fn test_block_and_unblock_site() {
        let (guardian, files, _dir) = setup(ScriptedProcesses::default());

        assert_eq!(guardian.block_site("https://www.reddit.com/r/rust").unwrap(), "www.reddit.com");
        assert!(files.content(HOSTS).unwrap().contains("127.0.0.1 www.reddit.com\n"));
        assert_eq!(guardian.blocked_sites(), vec!["www.reddit.com"]);
        assert_eq!(guardian.scan_hosts().unwrap(), vec!["www.reddit.com"]);

        guardian.unblock_site("www.reddit.com").unwrap();
        assert!(guardian.blocked_sites().is_empty());
        assert_eq!(files.content(HOSTS).unwrap(), "127.0.0.1 localhost\n");
    }

    #[test]
    fn test_whitelisted_site_is_refused() {
        let (guardian, files, _dir) = setup(ScriptedProcesses::default());

        let err = guardian.block_site("gist.github.com").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
        assert_eq!(files.content(HOSTS).unwrap(), "127.0.0.1 localhost\n");
    }

    #[test]
    fn test_block_site_without_privileges() {
        let (guardian, files, _dir) = setup(ScriptedProcesses::default());
        files.set_read_only(true);

        assert!(guardian.block_site("reddit.com").unwrap_err().is_permission_denied());
        assert!(guardian.blocked_sites().is_empty());
    }

    #[test]
    fn test_focus_sessions_feed_score() {
        let (guardian, _files, _dir) = setup(ScriptedProcesses::default());

        guardian.record_focus_session(240, Some(0.9)).unwrap();
        assert_eq!(guardian.daily_stats().total_focus_time_today, 240);
        assert_eq!(guardian.productivity_score(), 50);
        assert!(guardian.weekly_stats().best_day.is_some());
    }

    #[test]
    fn test_open_config_returns_settings_path() {
        let (guardian, _files, dir) = setup(ScriptedProcesses::default());
        assert_eq!(guardian.open_config(), dir.path().join(SETTINGS_FILE_NAME));
    }

    #[test]
    fn test_crashed_monitor_is_reported_not_replaced() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::in_dir(dir.path()).with_hosts_file(PathBuf::from(HOSTS));
        let guardian = Guardian::with_platform(
            paths,
            Box::new(MemoryFiles::default()),
            Box::new(CrashingProcesses),
            TrackerConfig {
                poll_interval: Duration::from_millis(10),
            },
        );

        assert!(guardian.start());
        thread::sleep(Duration::from_millis(50));

        assert!(matches!(guardian.stop(), Err(AppError::MonitorCrashed)));
        assert!(!guardian.is_running());
        assert!(!guardian.start());
        assert!(!guardian.stop().unwrap());
        // The rest of the context keeps working
        guardian.record_focus_session(25, None).unwrap();
        assert_eq!(guardian.daily_stats().focus_sessions_today, 1);
    }

    #[test]
    fn test_reading_status_does_not_touch_streak() {
        let (guardian, _files, dir) = setup(ScriptedProcesses::default());

        let status = guardian.progress_status();
        assert_eq!(status.streak, 0);
        assert_eq!(guardian.stats_snapshot().streak, 0);
        assert!(!dir.path().join(STATS_FILE_NAME).exists());
    }

    #[test]
    fn test_focus_timer_start_stop() {
        let (guardian, _files, _dir) = setup(ScriptedProcesses::default());
        assert!(guardian.timer_status().is_none());

        assert!(guardian.start_focus_timer());
        assert!(!guardian.start_focus_timer());
        let status = guardian.timer_status().unwrap();
        assert_eq!(status.phase, timer::Phase::Work);
        assert!(status.remaining_secs > 24 * 60);

        assert!(guardian.stop_focus_timer());
        assert!(!guardian.stop_focus_timer());
        assert!(guardian.timer_status().is_none());
    }

    #[test]
    fn test_settings_export_and_import() {
        let (guardian, _files, dir) = setup(ScriptedProcesses::default());
        let backup = dir.path().join("backup.json");

        guardian.update_settings(|s| s.add_blocked_app("Steam")).unwrap();
        guardian.export_settings(&backup).unwrap();

        guardian.update_settings(|s| Ok(s.remove_blocked_app("Steam"))).unwrap();
        assert!(!guardian.settings().blocked_apps.contains("Steam"));

        guardian.import_settings(&backup).unwrap();
        assert!(guardian.settings().blocked_apps.contains("Steam"));
        let saved = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME)).load();
        assert!(saved.blocked_apps.contains("Steam"));
    }

    #[test]
    fn test_import_repairs_and_rejects() {
        let (guardian, _files, dir) = setup(ScriptedProcesses::default());

        let missing = guardian.import_settings(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(AppError::NotFound { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(guardian.import_settings(&broken), Err(AppError::Config { .. })));

        let odd = dir.path().join("odd.json");
        std::fs::write(&odd, r#"{"current_profile": "gaming", "pomodoro_minutes": 0}"#).unwrap();
        guardian.import_settings(&odd).unwrap();
        let settings = guardian.settings();
        assert_eq!(settings.current_profile, "default");
        assert_eq!(settings.pomodoro_minutes, 25);
    }
}
