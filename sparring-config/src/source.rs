//! Scenario sources.
//!
//! A source yields test cases in order. Each entry is parsed and validated on
//! its own so that one malformed case is reported and skipped instead of
//! failing the whole suite.

use figment::value::Value;
use serde::Deserialize;
use validator::Validate;

use crate::error::format_validation_errors;
use crate::{ConfigError, TestCase};

/// One test case as produced by a source: either ready to run, or the reason
/// it cannot be.
pub type ScenarioEntry = Result<TestCase, ConfigError>;

/// Anything that can produce an ordered list of test cases.
pub trait ScenarioSource {
    /// Loads every test case. A document-level problem (missing file, broken
    /// syntax) is an `Err`; a per-case problem is an `Err` entry.
    fn load_scenarios(&self) -> Result<Vec<ScenarioEntry>, ConfigError>;
}

/// Test cases built in code. Each is still validated.
impl ScenarioSource for Vec<TestCase> {
    fn load_scenarios(&self) -> Result<Vec<ScenarioEntry>, ConfigError> {
        Ok(self
            .iter()
            .enumerate()
            .map(|(index, case)| {
                case.validate().map(|_| case.clone()).map_err(|e| ConfigError::InvalidCase {
                    index,
                    name: case.name.clone(),
                    reason: format_validation_errors(&e).trim_end().to_string(),
                })
            })
            .collect())
    }
}

/// Turns a raw case value into a validated `TestCase`.
pub(crate) fn parse_case(index: usize, raw: &Value) -> ScenarioEntry {
    #[derive(Deserialize)]
    struct NameOnly {
        name: Option<String>,
    }

    let name = raw
        .deserialize::<NameOnly>()
        .ok()
        .and_then(|n| n.name)
        .unwrap_or_else(|| "<unnamed>".to_string());

    let case: TestCase = raw.deserialize().map_err(|e| ConfigError::InvalidCase {
        index,
        name: name.clone(),
        reason: e.to_string(),
    })?;

    case.validate().map_err(|e| ConfigError::InvalidCase {
        index,
        name,
        reason: format_validation_errors(&e).trim_end().to_string(),
    })?;

    Ok(case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientSpec;

    #[test]
    fn static_cases_are_validated_individually() {
        let cases = vec![
            TestCase::new("good", 1.0).with_client(ClientSpec::new("a").disconnect_after(0.5)),
            TestCase::new("bad", -1.0),
        ];
        let entries = cases.load_scenarios().unwrap();
        assert!(entries[0].is_ok());
        match &entries[1] {
            Err(ConfigError::InvalidCase { index, name, .. }) => {
                assert_eq!(*index, 1);
                assert_eq!(name, "bad");
            }
            other => panic!("expected invalid case, got {other:?}"),
        }
    }
}
