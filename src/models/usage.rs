use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// A completed focus session. Appended, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusSession {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    /// Self-reported quality in [0, 1].
    pub quality: f64,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub app: String,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub blocks_today: u32,
    pub focus_sessions_today: usize,
    pub total_focus_time_today: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyStats {
    pub total_blocks: u32,
    /// Always divided by seven, however much of the week has elapsed.
    pub avg_blocks_per_day: f64,
    pub best_day: Option<NaiveDate>,
}

impl WeeklyStats {
    pub fn best_day_label(&self) -> String {
        self.best_day
            .map_or_else(|| "N/A".to_string(), |d| d.format("%Y-%m-%d").to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppBreakdown {
    pub apps_blocked: BTreeMap<String, u32>,
    pub most_blocked: Option<String>,
}
