use crate::constants::POINTS_PER_BLOCK;
use crate::error::AppError;
use crate::models::{ProgressState, ProgressStatus, StatsSnapshot};
use crate::store::JsonStore;
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use std::path::PathBuf;

/// A one-time badge and the bonus it grants.
pub struct Achievement {
    pub id: &'static str,
    pub reward: u32,
    earned: fn(&ProgressState) -> bool,
}

fn first_block(state: &ProgressState) -> bool {
    state.blocks_today >= 1
}

fn five_hundred_points(state: &ProgressState) -> bool {
    state.points >= 500
}

fn week_streak(state: &ProgressState) -> bool {
    state.streak >= 7
}

/// Evaluated in this order.
pub const ACHIEVEMENTS: [Achievement; 4] = [
    Achievement { id: "first_block", reward: 25, earned: first_block },
    Achievement { id: "focus_warrior", reward: 100, earned: five_hundred_points },
    Achievement { id: "level_5", reward: 50, earned: five_hundred_points },
    Achievement { id: "daily_champion", reward: 200, earned: week_streak },
];

/// Points, streak and badges. Every mutation is written through to disk.
pub struct ProgressTracker {
    state: ProgressState,
    store: JsonStore,
}

impl ProgressTracker {
    /// Load persisted progress, or start fresh if there is none or it is unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = JsonStore::new(path);
        let state = match store.load::<ProgressState>() {
            Ok(Some(state)) => state,
            Ok(None) => ProgressState::default(),
            Err(e) => {
                warn!("Could not load progress, starting fresh: {e}");
                ProgressState::default()
            }
        };
        Self { state, store }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn status(&self) -> ProgressStatus {
        ProgressStatus::from(&self.state)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::from(&self.state)
    }

    pub fn add_points(&mut self, amount: u32) -> Result<(), AppError> {
        self.state.points = self.state.points.saturating_add(amount);
        self.check_achievements();
        self.persist()
    }

    pub fn record_block(&mut self) -> Result<(), AppError> {
        self.state.blocks_today = self.state.blocks_today.saturating_add(1);
        self.add_points(POINTS_PER_BLOCK)
    }

    /// Returns whether anything changed.
    pub fn update_streak(&mut self) -> Result<bool, AppError> {
        self.update_streak_on(Local::now().date_naive())
    }

    pub fn update_streak_on(&mut self, today: NaiveDate) -> Result<bool, AppError> {
        let last = self.state.last_active_date;
        if last == Some(today) {
            return Ok(false);
        }

        let yesterday = today.pred_opt();
        if last.is_some() && last == yesterday {
            self.state.streak = self.state.streak.saturating_add(1);
        } else {
            self.state.streak = 1;
        }

        self.state.blocks_today = 0;
        self.state.last_active_date = Some(today);
        info!("Streak updated: {} day(s)", self.state.streak);

        self.check_achievements();
        self.persist()?;
        Ok(true)
    }

    /// Grant every badge whose rule holds, repeating until a pass grants nothing.
    ///
    /// Each pass judges all rules against the state as it was before the pass,
    /// so rules sharing a threshold are granted together, once each.
    fn check_achievements(&mut self) {
        loop {
            let snapshot = self.state.clone();
            let earned: Vec<&Achievement> = ACHIEVEMENTS
                .iter()
                .filter(|a| !snapshot.has_badge(a.id) && (a.earned)(&snapshot))
                .collect();

            if earned.is_empty() {
                break;
            }

            for achievement in earned {
                self.state.badges.insert(achievement.id.to_string());
                self.state.points = self.state.points.saturating_add(achievement.reward);
                info!("Badge earned: {} (+{} points)", achievement.id, achievement.reward);
            }
        }
    }

    fn persist(&self) -> Result<(), AppError> {
        self.store.save(&self.state).map_err(|e| {
            error!("Failed to save progress: {e}");
            e
        })
    }
}
