//! # Sparring Configuration System
//!
//! Layered configuration for the harness: the target address, logging,
//! per-connection tuning and the ordered list of test cases.
//!
//! ## Features
//! - **Layering**: defaults, then the scenario file (YAML or JSON by
//!   extension), then `SPARRING_HOST` / `SPARRING_PORT`
//! - **Validation**: `validator` derive on every section
//! - **Per-case isolation**: a malformed test case is reported on its own and
//!   never prevents the remaining cases from loading

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Yaml},
    value::Value,
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod client;
pub mod defaults;
mod error;
mod scenario;
mod source;
mod telemetry;
mod validation;

pub use client::ClientOptions;
pub use defaults::{default_test_cases, write_default, ScenarioDocument};
pub use error::ConfigError;
pub use scenario::{ClientSpec, TestCase, MAX_SECONDS};
pub use source::{ScenarioEntry, ScenarioSource};
pub use telemetry::LogConfig;

/// Everything in a scenario file except the test cases.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validation::validate_target))]
pub struct Settings {
    /// Host every client connects to.
    pub host: String,

    /// Port every client connects to.
    pub port: u16,

    #[serde(default)]
    #[validate(nested)]
    pub log: LogConfig,

    #[serde(default)]
    #[validate(nested)]
    pub client: ClientOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 12345,
            log: LogConfig::default(),
            client: ClientOptions::default(),
        }
    }
}

impl Settings {
    /// `host:port` as handed to the socket layer.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Applies command-line overrides of the target and re-validates.
    pub fn override_target(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self.validate()?;
        Ok(())
    }
}

/// A scenario file opened for reading.
///
/// Hierarchy:
/// 1. Default values
/// 2. The file itself (`.json` parsed as JSON, anything else as YAML)
/// 3. `SPARRING_HOST` / `SPARRING_PORT` environment variables
pub struct ConfigFile {
    path: PathBuf,
    figment: Figment,
}

impl ConfigFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = if defaults::is_json(path) {
            figment.merge(Json::file(path))
        } else {
            figment.merge(Yaml::file(path))
        };
        let figment = figment.merge(Env::prefixed("SPARRING_").only(&["host", "port"]));

        Ok(Self {
            path: path.to_path_buf(),
            figment,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extracts and validates the settings section.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn raw_cases(&self) -> Result<Vec<Value>, ConfigError> {
        match self.figment.find_value("testCases") {
            Ok(value) => Ok(value.deserialize()?),
            Err(e) if e.missing() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ScenarioSource for ConfigFile {
    fn load_scenarios(&self) -> Result<Vec<ScenarioEntry>, ConfigError> {
        let raw = self.raw_cases()?;
        Ok(raw
            .iter()
            .enumerate()
            .map(|(index, value)| source::parse_case(index, value))
            .collect())
    }
}
