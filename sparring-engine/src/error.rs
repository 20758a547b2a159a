use thiserror::Error;

use sparring_config::ConfigError;

/// Suite-level failures. Per-case and per-client problems are reported in the
/// `SuiteReport` instead and never surface here.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}
