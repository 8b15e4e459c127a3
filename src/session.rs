//! Line commands accepted while `guardian run` is monitoring.
//!
//! Usage analytics live only as long as the process, so everything that reads
//! or feeds them happens inside this session.

use crate::error::AppError;
use crate::timer::Phase;
use crate::Guardian;
use std::io::{BufRead, Write};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  focus <minutes> [quality]  record a focus session (quality 0-1)
  timer start|stop           run the pomodoro work/break cycle
  timer                      show the timer
  stats                      today's and this week's usage
  status                     points, level, streak and badges
  stop                       stop monitoring (or an empty line)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Focus { minutes: u32, quality: Option<f64> },
    TimerStart,
    TimerStop,
    TimerStatus,
    Stats,
    Status,
    Help,
    Stop,
}

impl FromStr for SessionCommand {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Self::Stop);
        };

        let parsed = match command.to_lowercase().as_str() {
            "stop" | "quit" | "exit" => Self::Stop,
            "stats" => Self::Stats,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "timer" => match words.next() {
                None => Self::TimerStatus,
                Some("start") => Self::TimerStart,
                Some("stop") => Self::TimerStop,
                Some(other) => {
                    return Err(AppError::InvalidInput {
                        field: "timer",
                        reason: format!("expected 'start' or 'stop', got '{other}'"),
                    })
                }
            },
            "focus" => {
                let minutes = words
                    .next()
                    .and_then(|m| m.parse::<u32>().ok())
                    .ok_or_else(|| AppError::InvalidInput {
                        field: "minutes",
                        reason: "usage: focus <minutes> [quality]".into(),
                    })?;
                let quality = words
                    .next()
                    .map(|q| {
                        q.parse::<f64>().map_err(|_| AppError::InvalidInput {
                            field: "quality",
                            reason: format!("'{q}' is not a number"),
                        })
                    })
                    .transpose()?;
                Self::Focus { minutes, quality }
            }
            other => {
                return Err(AppError::InvalidInput {
                    field: "command",
                    reason: format!("unknown command '{other}', try 'help'"),
                })
            }
        };

        if let Some(extra) = words.next() {
            return Err(AppError::InvalidInput {
                field: "command",
                reason: format!("unexpected '{extra}'"),
            });
        }
        Ok(parsed)
    }
}

/// Read commands until `stop`, an empty line or end of input.
///
/// Bad commands are reported on `output` and the session carries on.
pub fn run<R: BufRead, W: Write>(guardian: &Guardian, input: R, output: &mut W) -> Result<(), AppError> {
    for line in input.lines() {
        let command = match line?.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "{e}")?;
                continue;
            }
        };
        if command == SessionCommand::Stop {
            break;
        }
        if let Err(e) = execute(guardian, command, output) {
            writeln!(output, "{e}")?;
        }
    }
    Ok(())
}

pub fn execute<W: Write>(guardian: &Guardian, command: SessionCommand, output: &mut W) -> Result<(), AppError> {
    match command {
        SessionCommand::Focus { minutes, quality } => {
            guardian.record_focus_session(minutes, quality)?;
            writeln!(output, "Recorded {minutes} minute focus session")?;
        }
        SessionCommand::TimerStart => {
            if guardian.start_focus_timer() {
                let settings = guardian.settings();
                writeln!(
                    output,
                    "Timer started: {} minutes work, {} minutes break",
                    settings.pomodoro_minutes, settings.break_minutes
                )?;
            } else {
                writeln!(output, "Timer is already running")?;
            }
        }
        SessionCommand::TimerStop => {
            if guardian.stop_focus_timer() {
                writeln!(output, "Timer stopped")?;
            } else {
                writeln!(output, "No timer is running")?;
            }
        }
        SessionCommand::TimerStatus => match guardian.timer_status() {
            Some(status) => {
                let phase = match status.phase {
                    Phase::Work => "work",
                    Phase::Break => "break",
                };
                writeln!(
                    output,
                    "{phase}: {:02}:{:02} left, {} work blocks done",
                    status.remaining_secs / 60,
                    status.remaining_secs % 60,
                    status.completed_work_blocks
                )?;
            }
            None => writeln!(output, "No timer is running")?,
        },
        SessionCommand::Stats => write_stats(guardian, output)?,
        SessionCommand::Status => write_status(guardian, output)?,
        SessionCommand::Help => writeln!(output, "{HELP}")?,
        SessionCommand::Stop => {}
    }
    Ok(())
}

pub fn write_stats<W: Write>(guardian: &Guardian, output: &mut W) -> Result<(), AppError> {
    let daily = guardian.daily_stats();
    let weekly = guardian.weekly_stats();
    writeln!(
        output,
        "Today: {} blocks, {} focus sessions, {} focus minutes",
        daily.blocks_today, daily.focus_sessions_today, daily.total_focus_time_today
    )?;
    writeln!(
        output,
        "This week: {} blocks, {:.2} per day, best day {}",
        weekly.total_blocks,
        weekly.avg_blocks_per_day,
        weekly.best_day_label()
    )?;
    writeln!(output, "Productivity score: {}", guardian.productivity_score())?;
    for (app, count) in &guardian.app_breakdown().apps_blocked {
        writeln!(output, "  {app}: {count}")?;
    }
    Ok(())
}

pub fn write_status<W: Write>(guardian: &Guardian, output: &mut W) -> Result<(), AppError> {
    let status = guardian.progress_status();
    writeln!(output, "Points: {}", status.points)?;
    writeln!(output, "Level:  {}", status.level)?;
    writeln!(output, "Streak: {} day(s)", status.streak)?;
    writeln!(output, "Blocks today: {}", status.blocks)?;
    if status.badges.is_empty() {
        writeln!(output, "Badges: none yet")?;
    } else {
        writeln!(output, "Badges: {}", status.badges.join(", "))?;
    }
    Ok(())
}
