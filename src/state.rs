use crate::analytics::UsageAnalytics;
use crate::error::AppError;
use crate::gamification::ProgressTracker;
use crate::monitor::BlockEvent;
use crate::timer::{FocusTimer, TimerEvent};
use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything the monitor loop and the front end both touch, behind one mutex.
pub struct GuardianState {
    pub progress: ProgressTracker,
    pub analytics: UsageAnalytics,
    pub timer: Option<FocusTimer>,
    limit_warned_on: Option<NaiveDate>,
}

pub type SharedState = Arc<Mutex<GuardianState>>;

impl GuardianState {
    pub fn new(progress: ProgressTracker) -> Self {
        Self {
            progress,
            analytics: UsageAnalytics::new(),
            timer: None,
            limit_warned_on: None,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Route a block event to analytics and progress.
    ///
    /// A failed progress write is already logged; memory stays authoritative.
    pub fn handle_block(&mut self, event: &BlockEvent) {
        self.analytics.record_block(&event.app, event.at);
        if let Err(e) = self.progress.record_block() {
            warn!("Block of {} counted but not saved: {e}", event.app);
        }
    }

    /// Record a focus session, then check today's total against the daily limit.
    pub fn record_focus_session_at(
        &mut self,
        minutes: u32,
        quality: Option<f64>,
        at: DateTime<Local>,
        daily_limit_minutes: u32,
    ) -> Result<(), AppError> {
        self.analytics.record_focus_session_at(minutes, quality, at)?;
        self.check_daily_limit_on(at.date_naive(), daily_limit_minutes);
        Ok(())
    }

    /// Warns once per day when focus time goes past the limit. Returns `true` on that call.
    pub fn check_daily_limit_on(&mut self, today: NaiveDate, daily_limit_minutes: u32) -> bool {
        if self.limit_warned_on == Some(today) {
            return false;
        }
        let minutes = self.analytics.daily_stats_on(today).total_focus_time_today;
        if minutes <= daily_limit_minutes {
            return false;
        }

        warn!("Daily limit passed: {minutes} focus minutes today, limit is {daily_limit_minutes}");
        self.limit_warned_on = Some(today);
        true
    }

    /// Advance the focus timer, recording a session for each finished work block.
    pub fn tick_timer_at(&mut self, now: DateTime<Local>, daily_limit_minutes: u32) -> Option<TimerEvent> {
        let event = self.timer.as_mut()?.tick_at(now)?;
        match event {
            TimerEvent::WorkCompleted { minutes } => {
                info!("Work block of {minutes} minutes done, take a break");
                if let Err(e) = self.record_focus_session_at(minutes, None, now, daily_limit_minutes) {
                    warn!("Focus block not recorded: {e}");
                }
            }
            TimerEvent::BreakCompleted => info!("Break over, back to work"),
        }
        Some(event)
    }
}

/// Lock a mutex, recovering from poisoning if necessary
pub fn safe_lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("{context} mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::{tempdir, TempDir};

    fn fresh() -> (GuardianState, TempDir) {
        let dir = tempdir().unwrap();
        let state = GuardianState::new(ProgressTracker::open(dir.path().join("stats.json")));
        (state, dir)
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 4, h, m, 0).single().unwrap()
    }

    #[test]
    fn test_handle_block_updates_both_sides() {
        let (mut state, _dir) = fresh();

        state.handle_block(&BlockEvent {
            app: "TikTok".into(),
            process: "tiktok".into(),
            at: Local::now(),
        });

        assert_eq!(state.analytics.daily_stats().blocks_today, 1);
        assert_eq!(state.progress.state().blocks_today, 1);
        assert_eq!(state.progress.state().points, 35);
    }

    #[test]
    fn test_daily_limit_warns_once_per_day() {
        let (mut state, _dir) = fresh();
        let today = at(9, 0).date_naive();

        state.record_focus_session_at(60, None, at(9, 0), 90).unwrap();
        assert!(!state.check_daily_limit_on(today, 90));

        state.record_focus_session_at(30, None, at(10, 0), 90).unwrap();
        // Exactly at the limit is not past it
        assert!(!state.check_daily_limit_on(today, 90));

        state.analytics.record_focus_session_at(1, None, at(11, 0)).unwrap();
        assert!(state.check_daily_limit_on(today, 90));
        assert!(!state.check_daily_limit_on(today, 90));

        let tomorrow = today.succ_opt().unwrap();
        state.analytics.record_focus_session_at(120, None, at(9, 0) + chrono::Duration::days(1)).unwrap();
        assert!(state.check_daily_limit_on(tomorrow, 90));
    }

    #[test]
    fn test_timer_records_completed_work_blocks() {
        let (mut state, _dir) = fresh();
        let today = at(9, 0).date_naive();
        assert_eq!(state.tick_timer_at(at(9, 0), 480), None);

        state.timer = Some(FocusTimer::new(25, 5, at(9, 0)));
        assert_eq!(state.tick_timer_at(at(9, 10), 480), None);
        assert_eq!(
            state.tick_timer_at(at(9, 25), 480),
            Some(TimerEvent::WorkCompleted { minutes: 25 })
        );
        assert_eq!(state.tick_timer_at(at(9, 30), 480), Some(TimerEvent::BreakCompleted));
        assert!(state.tick_timer_at(at(9, 55), 480).is_some());

        let stats = state.analytics.daily_stats_on(today);
        assert_eq!(stats.focus_sessions_today, 2);
        assert_eq!(stats.total_focus_time_today, 50);
    }

    #[test]
    fn test_timer_trips_daily_limit() {
        let (mut state, _dir) = fresh();
        let today = at(9, 0).date_naive();
        state.timer = Some(FocusTimer::new(50, 10, at(9, 0)));

        state.tick_timer_at(at(9, 50), 40);
        // Already warned by the timer tick
        assert!(!state.check_daily_limit_on(today, 40));
    }

    #[test]
    fn test_safe_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(5));
        let poisoner = Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*safe_lock(&mutex, "test"), 5);
    }
}
