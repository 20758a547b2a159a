//! Per-connection tuning shared by every client of a run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use sparring_core::time::seconds;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Seconds a connect attempt may take before it counts as failed.
    #[serde(default = "default_connect_timeout")]
    #[validate(range(min = 0.001, max = 3600.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub connect_timeout: f64,

    /// Seconds a single write may block before the connection is dropped.
    #[serde(default = "default_write_timeout")]
    #[validate(range(min = 0.001, max = 3600.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub write_timeout: f64,

    /// Keepalive timer period in seconds.
    #[serde(default = "default_keepalive")]
    #[validate(range(min = 0.01, max = 3600.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub keepalive: f64,

    /// Re-send the current message on every keepalive tick.
    #[serde(default)]
    pub resend_on_keepalive: bool,

    /// Size of the buffer each read fills at most.
    #[serde(default = "default_read_buffer_size")]
    #[validate(range(min = 1, max = 1_048_576))]
    pub read_buffer_size: usize,
}

fn default_connect_timeout() -> f64 {
    10.0
}

fn default_write_timeout() -> f64 {
    5.0
}

fn default_keepalive() -> f64 {
    5.0
}

fn default_read_buffer_size() -> usize {
    128
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            write_timeout: default_write_timeout(),
            keepalive: default_keepalive(),
            resend_on_keepalive: false,
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl ClientOptions {
    pub fn connect_timeout(&self) -> Duration {
        seconds(self.connect_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        seconds(self.write_timeout)
    }

    pub fn keepalive(&self) -> Duration {
        seconds(self.keepalive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ClientOptions::default().validate().is_ok());
    }

    #[test]
    fn nan_timeouts_are_rejected() {
        let options = ClientOptions {
            write_timeout: f64::NAN,
            ..ClientOptions::default()
        };
        assert!(options.validate().is_err());

        let options = ClientOptions {
            keepalive: f64::INFINITY,
            ..ClientOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
