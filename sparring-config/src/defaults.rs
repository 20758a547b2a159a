//! Default scenario document.
//!
//! Written when no configuration file exists yet (or on explicit request),
//! so a first run has something meaningful to execute against a local
//! server on port 12345.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::{ClientSpec, ConfigError, Settings, TestCase};

/// Full on-disk document: settings plus the ordered test cases.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDocument {
    #[serde(flatten)]
    pub settings: Settings,
    pub test_cases: Vec<TestCase>,
}

impl ScenarioDocument {
    /// Default settings with the stock test cases.
    pub fn sample() -> Self {
        Self {
            settings: Settings::default(),
            test_cases: default_test_cases(),
        }
    }

    /// Renders the document as JSON when `path` ends in `.json`, YAML otherwise.
    pub fn render_for(&self, path: &Path) -> Result<String, ConfigError> {
        if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
        } else {
            serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
        }
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render_for(path)?)?;
        info!("Default configuration written to {}", path.display());
        Ok(())
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Writes the sample document to `path`.
pub fn write_default<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
    ScenarioDocument::sample().write_to(path)
}

fn with_password(spec: ClientSpec, password: &str) -> ClientSpec {
    ClientSpec {
        password: password.to_string(),
        ..spec
    }
}

/// The stock test cases: a lone client, a one-way exchange, an echo request,
/// and the two correspondent-secret variants.
pub fn default_test_cases() -> Vec<TestCase> {
    let silent_b = |password: &str| {
        with_password(
            ClientSpec::new("clientB")
                .connect_after(5.0)
                .disconnect_after(30.0),
            password,
        )
    };
    let echo_a = with_password(
        ClientSpec::new("clientA")
            .connect_after(2.0)
            .write_after(5.0, "[CMD]ECHOREPLY snowpack")
            .disconnect_after(30.0),
        "password123",
    );

    let mut basic = TestCase::new("Manage basic communication", 30.0)
        .with_client(with_password(
            ClientSpec::new("clientA")
                .connect_after(2.0)
                .write_after(5.0, "Hello from clientA")
                .disconnect_after(30.0),
            "password123",
        ))
        .with_client(silent_b("password456"));
    basic.wait_time = 1.0;

    vec![
        TestCase::new("Manage absence of correspondent", 30.0).with_client(with_password(
            ClientSpec::new("clientA")
                .connect_after(2.0)
                .disconnect_after(30.0),
            "password123",
        )),
        basic,
        TestCase::new("Manage bidirectional communication", 30.0)
            .with_client(echo_a.clone())
            .with_client(silent_b("password456")),
        TestCase::new(
            "Manage bidirectional communication but connect to correspondent based on dedicated secret - Same secrets",
            30.0,
        )
        .with_client(echo_a.clone())
        .with_client(silent_b("password123")),
        TestCase::new(
            "Manage bidirectional communication but connect to correspondent based on dedicated secret - Different secrets",
            30.0,
        )
        .with_client(echo_a)
        .with_client(with_password(
            ClientSpec::new("clientB")
                .connect_after(5.0)
                .write_after(0.0, "Hi I have a different pass")
                .disconnect_after(30.0),
            "password456",
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenarioSource;
    use validator::Validate;

    #[test]
    fn stock_cases_validate() {
        let cases = default_test_cases();
        assert_eq!(cases.len(), 5);
        for case in &cases {
            case.validate().expect("stock case should validate");
        }
        assert_eq!(cases[1].wait_time, 1.0);
        assert!(!cases[0].clients[0].writes());
    }

    #[test]
    fn yaml_and_json_renderings_load_back() {
        figment::Jail::expect_with(|jail| {
            write_default("sparring.yaml").map_err(|e| e.to_string())?;
            write_default("sparring.json").map_err(|e| e.to_string())?;

            for path in ["sparring.yaml", "sparring.json"] {
                let file = crate::ConfigFile::open(jail.directory().join(path))
                    .map_err(|e| e.to_string())?;
                let entries = file.load_scenarios().map_err(|e| e.to_string())?;
                assert_eq!(entries.len(), 5);
                assert!(entries.iter().all(|e| e.is_ok()));
                let settings = file.settings().map_err(|e| e.to_string())?;
                assert_eq!(settings.port, 12345);
            }
            Ok(())
        });
    }
}
