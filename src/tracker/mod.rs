use crate::constants::POLL_INTERVAL_SECS;
use crate::models::Settings;
use crate::monitor::ProcessMonitor;
use crate::state::{safe_lock, SharedState};
use chrono::Local;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub struct TrackerConfig {
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
        }
    }
}

/// Messages drained by the loop at the top of each cycle.
pub enum TrackerCommand {
    UpdateSettings(Box<Settings>),
}

/// Runs the check-and-sleep cycle on a background thread.
///
/// The stop flag is read once per cycle, so stopping takes up to one poll interval.
pub struct TrackerService {
    config: TrackerConfig,
    running: Arc<AtomicBool>,
    state: SharedState,
    commands: Mutex<Option<Sender<TrackerCommand>>>,
}

impl TrackerService {
    pub fn new(state: SharedState, config: TrackerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            state,
            commands: Mutex::new(None),
        }
    }

    /// Spawn the loop. The thread hands the monitor back when it exits.
    pub fn start(&self, monitor: ProcessMonitor, settings: Settings) -> thread::JoinHandle<ProcessMonitor> {
        self.running.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        *safe_lock(&self.commands, "Tracker commands") = Some(tx);

        let running = Arc::clone(&self.running);
        let state = Arc::clone(&self.state);
        let poll_interval = self.config.poll_interval;

        thread::spawn(move || run_loop(&running, &state, &rx, monitor, settings, poll_interval))
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        *safe_lock(&self.commands, "Tracker commands") = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns `false` when no loop is running to receive the settings.
    pub fn update_settings(&self, settings: &Settings) -> bool {
        let guard = safe_lock(&self.commands, "Tracker commands");
        guard.as_ref().is_some_and(|tx| {
            tx.send(TrackerCommand::UpdateSettings(Box::new(settings.clone())))
                .is_ok()
        })
    }
}

fn run_loop(
    running: &AtomicBool,
    state: &SharedState,
    commands: &Receiver<TrackerCommand>,
    mut monitor: ProcessMonitor,
    mut settings: Settings,
    poll_interval: Duration,
) -> ProcessMonitor {
    info!("Monitor started");
    let mut active_apps: Vec<String> = monitor.blocked_apps().map(String::from).collect();

    while running.load(Ordering::SeqCst) {
        while let Ok(command) = commands.try_recv() {
            match command {
                TrackerCommand::UpdateSettings(new_settings) => {
                    debug!("Monitor received new settings");
                    settings = *new_settings;
                }
            }
        }

        let apps = settings.active_blocked_apps(Local::now().time());
        if apps != active_apps {
            info!("Blocked apps now: {}", apps.join(", "));
            monitor.set_blocked_apps(apps.clone());
            active_apps = apps;
        }

        let events = monitor.check_apps();

        {
            let mut state = safe_lock(state, "Guardian state");
            if let Err(e) = state.progress.update_streak() {
                warn!("Streak update not saved: {e}");
            }
            for event in &events {
                state.handle_block(event);
            }
            state.tick_timer_at(Local::now(), settings.daily_limit_minutes);
        }

        thread::sleep(poll_interval);
    }

    info!("Monitor stopped");
    monitor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::ProgressTracker;
    use crate::state::GuardianState;
    use crate::test_utils::ScriptedProcesses;
    use crate::timer::{FocusTimer, Phase};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (SharedState, TempDir) {
        let dir = tempdir().unwrap();
        let progress = ProgressTracker::open(dir.path().join("guardian_stats.json"));
        (GuardianState::new(progress).into_shared(), dir)
    }

    fn fast() -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_millis(10),
        }
    }

    fn settings_blocking(apps: &[&str]) -> Settings {
        let mut settings = Settings::default();
        settings.blocked_apps = apps.iter().map(|a| (*a).to_string()).collect();
        settings
    }

    #[test]
    fn test_tracker_starts_and_stops() {
        let (state, _dir) = setup();
        let tracker = TrackerService::new(state, fast());
        let monitor = ProcessMonitor::new(Box::new(ScriptedProcesses::default()), Vec::new());

        assert!(!tracker.is_running());

        let handle = tracker.start(monitor, Settings::default());
        assert!(tracker.is_running());

        thread::sleep(Duration::from_millis(50));

        tracker.stop();
        let monitor = handle.join().unwrap();

        assert!(!tracker.is_running());
        assert_eq!(monitor.blocked_apps().count(), 3);
    }

    #[test]
    fn test_block_events_reach_progress_and_analytics() {
        let (state, _dir) = setup();
        let tracker = TrackerService::new(Arc::clone(&state), fast());
        let source = ScriptedProcesses::default();
        source.push(&["tiktok"]);
        let monitor = ProcessMonitor::new(Box::new(source), Vec::new());

        let handle = tracker.start(monitor, settings_blocking(&["TikTok"]));
        thread::sleep(Duration::from_millis(100));
        tracker.stop();
        handle.join().unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.progress.state().blocks_today, 1);
        assert_eq!(state.progress.state().points, 35);
        assert_eq!(state.analytics.daily_stats().blocks_today, 1);
        assert_eq!(state.progress.state().streak, 1);
    }

    #[test]
    fn test_update_settings_reaches_running_loop() {
        let (state, _dir) = setup();
        let tracker = TrackerService::new(Arc::clone(&state), fast());
        let monitor = ProcessMonitor::new(Box::new(ScriptedProcesses::always(&["steam"])), Vec::new());

        assert!(!tracker.update_settings(&Settings::default()));

        let handle = tracker.start(monitor, settings_blocking(&[]));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(state.lock().unwrap().progress.state().blocks_today, 0);

        assert!(tracker.update_settings(&settings_blocking(&["Steam"])));
        thread::sleep(Duration::from_millis(100));
        tracker.stop();
        let monitor = handle.join().unwrap();

        assert!(state.lock().unwrap().progress.state().blocks_today >= 1);
        assert_eq!(monitor.blocked_apps().collect::<Vec<_>>(), vec!["Steam"]);
    }

    #[test]
    fn test_loop_ticks_focus_timer() {
        let (state, _dir) = setup();
        let started = Local::now() - chrono::Duration::minutes(26);
        state.lock().unwrap().timer = Some(FocusTimer::new(25, 5, started));

        let tracker = TrackerService::new(Arc::clone(&state), fast());
        let monitor = ProcessMonitor::new(Box::new(ScriptedProcesses::default()), Vec::new());
        let handle = tracker.start(monitor, Settings::default());
        thread::sleep(Duration::from_millis(50));
        tracker.stop();
        handle.join().unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.analytics.sessions().len(), 1);
        assert_eq!(state.timer.as_ref().map(FocusTimer::phase), Some(Phase::Break));
    }
}
