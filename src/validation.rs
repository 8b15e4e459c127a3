use crate::constants::{MAX_APP_NAME_LEN, MAX_DOMAIN_LEN};
use crate::error::AppError;
use chrono::NaiveTime;
use url::Url;

/// Parse a time in HH:MM format (24-hour).
pub fn parse_time(time: &str) -> Result<NaiveTime, AppError> {
    let err = |reason: &str| AppError::InvalidInput {
        field: "time",
        reason: reason.into(),
    };

    let (hours, minutes) = time.split_once(':').ok_or_else(|| err("must be in HH:MM format"))?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(err("must be in HH:MM format"));
    }

    let hours: u32 = hours.parse().map_err(|_| err("invalid hours"))?;
    let minutes: u32 = minutes.parse().map_err(|_| err("invalid minutes"))?;

    if hours >= 24 {
        return Err(err("hours must be 00-23"));
    }
    if minutes >= 60 {
        return Err(err("minutes must be 00-59"));
    }

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(|| err("out of range"))
}

/// Parse an hours window in HH:MM-HH:MM format.
pub fn parse_hours_window(window: &str) -> Result<(NaiveTime, NaiveTime), AppError> {
    let (start, end) = window.split_once('-').ok_or_else(|| AppError::InvalidInput {
        field: "hours",
        reason: format!("'{window}' must be in HH:MM-HH:MM format"),
    })?;
    Ok((parse_time(start.trim())?, parse_time(end.trim())?))
}

/// Validate a blocked app name.
pub fn validate_app_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput {
            field: "app",
            reason: "cannot be empty".into(),
        });
    }
    if name.len() > MAX_APP_NAME_LEN {
        return Err(AppError::InvalidInput {
            field: "app",
            reason: format!("cannot exceed {MAX_APP_NAME_LEN} characters"),
        });
    }
    Ok(name)
}

/// Reduce user input (bare domain or full URL) to a lower-cased host name.
pub fn normalize_domain(input: &str) -> Result<String, AppError> {
    let err = |reason: String| AppError::InvalidInput {
        field: "domain",
        reason,
    };

    let input = input.trim();
    if input.is_empty() {
        return Err(err("cannot be empty".into()));
    }
    if input.chars().any(char::is_whitespace) {
        return Err(err(format!("'{input}' contains whitespace")));
    }

    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    let url = Url::parse(&candidate).map_err(|e| err(format!("'{input}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| err(format!("'{input}' has no host")))?
        .trim_end_matches('.')
        .to_lowercase();

    if host.is_empty() {
        return Err(err(format!("'{input}' has no host")));
    }
    if host.len() > MAX_DOMAIN_LEN {
        return Err(err(format!("cannot exceed {MAX_DOMAIN_LEN} characters")));
    }
    Ok(host)
}

/// Validate a focus session quality rating.
pub fn validate_quality(quality: f64) -> Result<f64, AppError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(AppError::InvalidInput {
            field: "quality",
            reason: format!("must be between 0 and 1, got {quality}"),
        });
    }
    Ok(quality)
}
