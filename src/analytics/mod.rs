use crate::constants::{DAYS_PER_WEEK, FOCUS_GOAL_MINUTES};
use crate::error::AppError;
use crate::models::{AppBreakdown, BlockRecord, DailyStats, FocusSession, WeeklyStats};
use crate::validation::validate_quality;
use chrono::{DateTime, Datelike, Days, Local, NaiveDate};
use std::collections::BTreeMap;

/// In-memory block and focus aggregation for the lifetime of the process.
///
/// Every query filters on "today" at call time; nothing is cached.
#[derive(Debug, Default)]
pub struct UsageAnalytics {
    daily_blocks: BTreeMap<NaiveDate, u32>,
    blocks: Vec<BlockRecord>,
    sessions: Vec<FocusSession>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Most recent Sunday, today included.
fn week_start(today: NaiveDate) -> NaiveDate {
    let offset = u64::from(today.weekday().num_days_from_sunday());
    today.checked_sub_days(Days::new(offset)).unwrap_or(today)
}

impl UsageAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block(&mut self, app: &str, timestamp: DateTime<Local>) {
        let count = self.daily_blocks.entry(timestamp.date_naive()).or_insert(0);
        *count = count.saturating_add(1);
        self.blocks.push(BlockRecord {
            app: app.to_string(),
            timestamp,
        });
    }

    /// `quality` defaults to 1.0.
    pub fn record_focus_session(
        &mut self,
        duration_minutes: u32,
        quality: Option<f64>,
    ) -> Result<(), AppError> {
        self.record_focus_session_at(duration_minutes, quality, Local::now())
    }

    pub fn record_focus_session_at(
        &mut self,
        duration_minutes: u32,
        quality: Option<f64>,
        timestamp: DateTime<Local>,
    ) -> Result<(), AppError> {
        let quality = validate_quality(quality.unwrap_or(1.0))?;
        self.sessions.push(FocusSession {
            date: timestamp.date_naive(),
            duration_minutes,
            quality,
            timestamp,
        });
        Ok(())
    }

    pub fn sessions(&self) -> &[FocusSession] {
        &self.sessions
    }

    pub fn daily_stats(&self) -> DailyStats {
        self.daily_stats_on(today())
    }

    pub fn daily_stats_on(&self, today: NaiveDate) -> DailyStats {
        DailyStats {
            blocks_today: self.daily_blocks.get(&today).copied().unwrap_or(0),
            focus_sessions_today: self.sessions.iter().filter(|s| s.date == today).count(),
            total_focus_time_today: self.focus_minutes_on(today),
        }
    }

    pub fn weekly_stats(&self) -> WeeklyStats {
        self.weekly_stats_on(today())
    }

    /// The average always divides by seven, so it reads low early in the week.
    pub fn weekly_stats_on(&self, today: NaiveDate) -> WeeklyStats {
        let start = week_start(today);
        let total_blocks = self
            .daily_blocks
            .range(start..)
            .map(|(_, count)| *count)
            .fold(0u32, u32::saturating_add);
        let avg = f64::from(total_blocks) / f64::from(DAYS_PER_WEEK);

        WeeklyStats {
            total_blocks,
            avg_blocks_per_day: (avg * 100.0).round() / 100.0,
            best_day: self.best_focus_day(),
        }
    }

    /// Focus time today against the daily goal, 0-100.
    pub fn productivity_score(&self) -> u8 {
        self.productivity_score_on(today())
    }

    pub fn productivity_score_on(&self, today: NaiveDate) -> u8 {
        let minutes = u64::from(self.focus_minutes_on(today));
        let goal = u64::from(FOCUS_GOAL_MINUTES);
        // Integer round-half-up of minutes / goal * 100
        let score = (minutes.saturating_mul(100) + goal / 2) / goal;
        u8::try_from(score.min(100)).unwrap_or(100)
    }

    pub fn app_breakdown(&self) -> AppBreakdown {
        self.app_breakdown_on(today())
    }

    pub fn app_breakdown_on(&self, today: NaiveDate) -> AppBreakdown {
        let mut apps_blocked: BTreeMap<String, u32> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();

        for record in self.blocks.iter().filter(|b| b.timestamp.date_naive() == today) {
            let count = apps_blocked.entry(record.app.clone()).or_insert(0);
            if *count == 0 {
                order.push(&record.app);
            }
            *count = count.saturating_add(1);
        }

        let mut most_blocked: Option<(&str, u32)> = None;
        for app in order {
            let count = apps_blocked.get(app).copied().unwrap_or(0);
            if most_blocked.map_or(true, |(_, best)| count > best) {
                most_blocked = Some((app, count));
            }
        }

        AppBreakdown {
            most_blocked: most_blocked.map(|(app, _)| app.to_string()),
            apps_blocked,
        }
    }

    fn focus_minutes_on(&self, day: NaiveDate) -> u32 {
        self.sessions
            .iter()
            .filter(|s| s.date == day)
            .map(|s| s.duration_minutes)
            .fold(0u32, u32::saturating_add)
    }

    /// Day with the most focus time across all sessions; ties go to the first seen.
    fn best_focus_day(&self) -> Option<NaiveDate> {
        let mut totals: Vec<(NaiveDate, u32)> = Vec::new();
        for session in &self.sessions {
            match totals.iter_mut().find(|(date, _)| *date == session.date) {
                Some((_, minutes)) => *minutes = minutes.saturating_add(session.duration_minutes),
                None => totals.push((session.date, session.duration_minutes)),
            }
        }

        let mut best: Option<(NaiveDate, u32)> = None;
        for (date, minutes) in totals {
            if best.map_or(true, |(_, top)| minutes > top) {
                best = Some((date, minutes));
            }
        }
        best.map(|(date, _)| date)
    }
}
