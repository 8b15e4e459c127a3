use crate::error::AppError;
use crate::models::Settings;
use crate::store::JsonStore;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Loads and saves the settings document.
pub struct SettingsStore {
    store: JsonStore,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Never fails: a missing or unreadable file yields the built-in defaults.
    pub fn load(&self) -> Settings {
        match self.store.load::<Settings>() {
            Ok(Some(mut settings)) => {
                settings.validate();
                settings
            }
            Ok(None) => {
                info!(
                    "No settings at {}, using defaults",
                    self.store.path().display()
                );
                Settings::default()
            }
            Err(e) => {
                warn!("Could not load settings, using defaults: {e}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), AppError> {
        self.store.save(settings)
    }
}
