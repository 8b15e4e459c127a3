//! Pomodoro work/break cycle.
//!
//! The timer is a wall-clock state machine with no thread of its own. The
//! monitor loop calls [`FocusTimer::tick_at`] once per cycle and acts on the
//! returned event.

use crate::models::Settings;
use chrono::{DateTime, Duration, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A work block ran to the end. Carries its length in minutes.
    WorkCompleted { minutes: u32 },
    BreakCompleted,
}

/// What a front end shows for a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerStatus {
    pub phase: Phase,
    pub remaining_secs: i64,
    pub completed_work_blocks: u32,
}

#[derive(Debug, Clone)]
pub struct FocusTimer {
    work_minutes: u32,
    break_minutes: u32,
    phase: Phase,
    phase_started: DateTime<Local>,
    completed_work_blocks: u32,
}

impl FocusTimer {
    /// Start in a work block at `now`. Zero lengths are raised to one minute.
    pub fn new(work_minutes: u32, break_minutes: u32, now: DateTime<Local>) -> Self {
        Self {
            work_minutes: work_minutes.max(1),
            break_minutes: break_minutes.max(1),
            phase: Phase::Work,
            phase_started: now,
            completed_work_blocks: 0,
        }
    }

    pub fn from_settings(settings: &Settings, now: DateTime<Local>) -> Self {
        Self::new(settings.pomodoro_minutes, settings.break_minutes, now)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completed_work_blocks(&self) -> u32 {
        self.completed_work_blocks
    }

    fn phase_length(&self) -> Duration {
        let minutes = match self.phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        };
        Duration::minutes(i64::from(minutes))
    }

    pub fn remaining_at(&self, now: DateTime<Local>) -> Duration {
        let left = self.phase_length() - (now - self.phase_started);
        left.max(Duration::zero())
    }

    pub fn status_at(&self, now: DateTime<Local>) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            remaining_secs: self.remaining_at(now).num_seconds(),
            completed_work_blocks: self.completed_work_blocks,
        }
    }

    /// Advance by at most one phase.
    ///
    /// The next phase starts where the previous one was due to end, so a late
    /// tick does not stretch the cycle.
    pub fn tick_at(&mut self, now: DateTime<Local>) -> Option<TimerEvent> {
        let length = self.phase_length();
        if now - self.phase_started < length {
            return None;
        }

        self.phase_started = self
            .phase_started
            .checked_add_signed(length)
            .unwrap_or(now);

        match self.phase {
            Phase::Work => {
                self.phase = Phase::Break;
                self.completed_work_blocks = self.completed_work_blocks.saturating_add(1);
                Some(TimerEvent::WorkCompleted {
                    minutes: self.work_minutes,
                })
            }
            Phase::Break => {
                self.phase = Phase::Work;
                Some(TimerEvent::BreakCompleted)
            }
        }
    }
}
