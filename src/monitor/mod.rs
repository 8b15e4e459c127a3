use crate::platform::ProcessSource;
use chrono::{DateTime, Local};
use log::{debug, info};

/// A running process matched a blocked app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvent {
    /// The configured app name that matched.
    pub app: String,
    /// The lower-cased process name that was running.
    pub process: String,
    pub at: DateTime<Local>,
}

/// What to do to a process once it is detected.
///
/// Nothing terminates, suspends or isolates processes yet; the default only logs.
pub trait BlockAction: Send {
    fn apply(&mut self, event: &BlockEvent);
}

pub struct LogOnly;

impl BlockAction for LogOnly {
    fn apply(&mut self, event: &BlockEvent) {
        info!("Blocked: {} (process '{}')", event.app, event.process);
    }
}

/// Matches process snapshots against the blocked-app list.
pub struct ProcessMonitor {
    source: Box<dyn ProcessSource>,
    action: Box<dyn BlockAction>,
    /// (configured name, lower-cased name)
    blocked_apps: Vec<(String, String)>,
}

impl ProcessMonitor {
    pub fn new(source: Box<dyn ProcessSource>, blocked_apps: Vec<String>) -> Self {
        let mut monitor = Self {
            source,
            action: Box::new(LogOnly),
            blocked_apps: Vec::new(),
        };
        monitor.set_blocked_apps(blocked_apps);
        monitor
    }

    pub fn with_action(mut self, action: Box<dyn BlockAction>) -> Self {
        self.action = action;
        self
    }

    pub fn set_blocked_apps(&mut self, apps: Vec<String>) {
        self.blocked_apps = apps
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| {
                let lower = a.to_lowercase();
                (a, lower)
            })
            .collect();
    }

    pub fn blocked_apps(&self) -> impl Iterator<Item = &str> {
        self.blocked_apps.iter().map(|(name, _)| name.as_str())
    }

    /// Take one snapshot and return one event per (process, blocked app) match.
    ///
    /// A failed snapshot is treated as an empty process list.
    pub fn check_apps(&mut self) -> Vec<BlockEvent> {
        let processes = match self.source.process_names() {
            Ok(names) => names,
            Err(e) => {
                debug!("Skipping tick: {e}");
                return Vec::new();
            }
        };

        let now = Local::now();
        let mut events = Vec::new();

        for process in processes.iter().map(|p| p.to_lowercase()) {
            for (app, lower) in &self.blocked_apps {
                if process.contains(lower.as_str()) {
                    events.push(BlockEvent {
                        app: app.clone(),
                        process: process.clone(),
                        at: now,
                    });
                }
            }
        }

        for event in &events {
            self.action.apply(event);
        }
        events
    }
}
