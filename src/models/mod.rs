mod progress;
mod settings;
mod usage;

pub use progress::{ProgressState, ProgressStatus, StatsSnapshot};
pub use settings::{Profile, Settings};
pub use usage::{AppBreakdown, BlockRecord, DailyStats, FocusSession, WeeklyStats};
