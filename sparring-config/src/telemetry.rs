//! Logging configuration.
//!
//! Console output always goes through `tracing`; a log file is optional and
//! is cleared at startup unless `clearOnStart` is turned off.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// File receiving timestamped event lines. `None` disables the file sink.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// Truncate `file` before the first test case runs.
    #[serde(default = "default_true")]
    pub clear_on_start: bool,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    #[validate(custom(function = validation::validate_log_level))]
    pub level: String,
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("log.txt"))
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            clear_on_start: default_true(),
            level: default_level(),
        }
    }
}
