use crate::constants::POINTS_PER_LEVEL;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Persisted gamification state. The level is derived from points and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressState {
    pub points: u32,
    pub streak: u32,
    pub blocks_today: u32,
    pub badges: BTreeSet<String>,
    /// `None` until the first streak update.
    #[serde(rename = "last_active")]
    pub last_active_date: Option<NaiveDate>,
}

impl ProgressState {
    pub fn level(&self) -> u32 {
        self.points / POINTS_PER_LEVEL + 1
    }

    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.contains(badge)
    }
}

/// Full view of the progress state, level included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressStatus {
    pub points: u32,
    pub level: u32,
    pub streak: u32,
    pub blocks: u32,
    pub badges: Vec<String>,
}

impl From<&ProgressState> for ProgressStatus {
    fn from(state: &ProgressState) -> Self {
        Self {
            points: state.points,
            level: state.level(),
            streak: state.streak,
            blocks: state.blocks_today,
            badges: state.badges.iter().cloned().collect(),
        }
    }
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub blocks: u32,
    pub points: u32,
    pub level: u32,
    pub streak: u32,
}

impl From<&ProgressState> for StatsSnapshot {
    fn from(state: &ProgressState) -> Self {
        Self {
            blocks: state.blocks_today,
            points: state.points,
            level: state.level(),
            streak: state.streak,
        }
    }
}
