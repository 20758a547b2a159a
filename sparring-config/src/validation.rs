//! Custom validation functions for configuration.

use validator::ValidationError;

use crate::Settings;

/// Validate that a log level is one `tracing` understands.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error", "off"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Validate a timing in seconds. `range` lets NaN through, so finiteness is
/// checked here.
pub fn validate_seconds(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_seconds");
        err.message = Some("must be a finite, non-negative number of seconds".into());
        Err(err)
    }
}

/// Validate the target address parts.
pub fn validate_target(settings: &Settings) -> Result<(), ValidationError> {
    if settings.host.trim().is_empty() {
        let mut err = ValidationError::new("empty_host");
        err.message = Some("host must not be empty".into());
        return Err(err);
    }
    if settings.port == 0 {
        let mut err = ValidationError::new("invalid_port");
        err.message = Some("port must be between 1 and 65535".into());
        return Err(err);
    }
    Ok(())
}
