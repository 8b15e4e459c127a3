use crate::constants::DEFAULT_PROFILE;
use crate::error::AppError;
use crate::validation::{normalize_domain, parse_hours_window, validate_app_name};
use chrono::NaiveTime;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named bundle of blocked apps and the hours it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub blocked_apps: BTreeSet<String>,
    /// Windows in HH:MM-HH:MM format. Empty means all day.
    pub hours: Vec<String>,
}

impl Profile {
    fn new(apps: &[&str], hours: &[&str]) -> Self {
        Self {
            blocked_apps: apps.iter().map(|a| (*a).to_string()).collect(),
            hours: hours.iter().map(|h| (*h).to_string()).collect(),
        }
    }

    /// Whether `time` falls inside one of the hours windows.
    ///
    /// A window whose end is before its start wraps past midnight.
    pub fn is_active_at(&self, time: NaiveTime) -> bool {
        if self.hours.is_empty() {
            return true;
        }

        self.hours
            .iter()
            .filter_map(|w| parse_hours_window(w).ok())
            .any(|(start, end)| {
                if start <= end {
                    start <= time && time < end
                } else {
                    time >= start || time < end
                }
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub current_profile: String,
    pub blocked_apps: BTreeSet<String>,
    pub whitelist_domains: BTreeSet<String>,
    pub pomodoro_minutes: u32,
    pub break_minutes: u32,
    pub daily_limit_minutes: u32,
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), Profile::default());
        profiles.insert(
            "work".to_string(),
            Profile::new(&["TikTok", "Instagram"], &["09:00-17:00"]),
        );
        profiles.insert(
            "study".to_string(),
            Profile::new(&["TikTok", "Instagram", "YouTube"], &["14:00-20:00"]),
        );

        Self {
            current_profile: DEFAULT_PROFILE.to_string(),
            blocked_apps: ["TikTok", "Instagram", "Facebook"]
                .into_iter()
                .map(String::from)
                .collect(),
            whitelist_domains: ["github.com", "stackoverflow.com"]
                .into_iter()
                .map(String::from)
                .collect(),
            pomodoro_minutes: 25,
            break_minutes: 5,
            daily_limit_minutes: 480,
            profiles,
        }
    }
}

impl Settings {
    /// Repair whatever a hand-edited file got wrong, logging each fix.
    pub fn validate(&mut self) {
        let defaults = Settings::default();

        for (field, value, default) in [
            ("pomodoro_minutes", &mut self.pomodoro_minutes, defaults.pomodoro_minutes),
            ("break_minutes", &mut self.break_minutes, defaults.break_minutes),
            ("daily_limit_minutes", &mut self.daily_limit_minutes, defaults.daily_limit_minutes),
        ] {
            if *value == 0 {
                warn!("Settings: {field} must be positive, using {default}");
                *value = default;
            }
        }

        self.profiles.entry(DEFAULT_PROFILE.to_string()).or_default();

        if !self.profiles.contains_key(&self.current_profile) {
            warn!(
                "Settings: unknown profile '{}', falling back to '{DEFAULT_PROFILE}'",
                self.current_profile
            );
            self.current_profile = DEFAULT_PROFILE.to_string();
        }

        for (name, profile) in &mut self.profiles {
            profile.hours.retain(|window| match parse_hours_window(window) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Settings: dropping hours window of profile '{name}': {e}");
                    false
                }
            });
        }

        self.blocked_apps.retain(|app| !app.trim().is_empty());
    }

    pub fn current(&self) -> Option<&Profile> {
        self.profiles.get(&self.current_profile)
    }

    /// Global blocked apps plus those of the current profile while it is in its hours.
    pub fn active_blocked_apps(&self, time: NaiveTime) -> Vec<String> {
        let mut apps = self.blocked_apps.clone();
        if let Some(profile) = self.current().filter(|p| p.is_active_at(time)) {
            apps.extend(profile.blocked_apps.iter().cloned());
        }
        apps.into_iter().collect()
    }

    /// Returns `false` if an app with the same name (ignoring case) is already listed.
    pub fn add_blocked_app(&mut self, name: &str) -> Result<bool, AppError> {
        let name = validate_app_name(name)?;
        if self.blocked_apps.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            return Ok(false);
        }
        Ok(self.blocked_apps.insert(name.to_string()))
    }

    pub fn remove_blocked_app(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.blocked_apps.len();
        self.blocked_apps.retain(|a| !a.eq_ignore_ascii_case(name));
        self.blocked_apps.len() != before
    }

    pub fn add_whitelist_domain(&mut self, domain: &str) -> Result<bool, AppError> {
        let domain = normalize_domain(domain)?;
        Ok(self.whitelist_domains.insert(domain))
    }

    pub fn remove_whitelist_domain(&mut self, domain: &str) -> Result<bool, AppError> {
        let domain = normalize_domain(domain)?;
        Ok(self.whitelist_domains.remove(&domain))
    }

    /// True for a whitelisted domain or any subdomain of one.
    pub fn is_whitelisted(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.whitelist_domains.iter().any(|w| {
            domain == *w
                || domain
                    .strip_suffix(w.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn switch_profile(&mut self, name: &str) -> Result<(), AppError> {
        if !self.profiles.contains_key(name) {
            return Err(AppError::NotFound {
                entity: "Profile",
                name: name.to_string(),
            });
        }
        self.current_profile = name.to_string();
        Ok(())
    }
}
