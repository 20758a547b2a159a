//! Test-case descriptions.
//!
//! Field names are camelCase on the wire (`clientName`, `connectTime`,
//! `connectionTimeout`, ...) and form the compatibility contract with
//! existing scenario files. Timings are seconds and may be fractional.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use sparring_core::time::seconds;

use crate::validation;

/// Longest timing accepted anywhere in a test case (one day).
pub const MAX_SECONDS: f64 = 86_400.0;

/// One simulated client's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientSpec {
    #[validate(length(min = 1, message = "clientName must not be empty"))]
    pub client_name: String,

    /// Delay from case start before the connect attempt.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 86_400.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub connect_time: f64,

    /// Delay after the connect attempt completes before writing `message`.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 86_400.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub write_time: f64,

    /// Delay after the connect attempt completes before disconnecting.
    #[validate(range(min = 0.0, max = 86_400.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub disconnect_time: f64,

    /// Payload to send; empty means this client never writes.
    #[serde(default)]
    pub message: String,

    /// Reserved for correspondent matching. Never transmitted.
    #[serde(default)]
    pub password: String,
}

impl ClientSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            client_name: name.into(),
            connect_time: 0.0,
            write_time: 0.0,
            disconnect_time: 0.0,
            message: String::new(),
            password: String::new(),
        }
    }

    pub fn connect_after(mut self, secs: f64) -> Self {
        self.connect_time = secs;
        self
    }

    pub fn write_after(mut self, secs: f64, message: impl Into<String>) -> Self {
        self.write_time = secs;
        self.message = message.into();
        self
    }

    pub fn disconnect_after(mut self, secs: f64) -> Self {
        self.disconnect_time = secs;
        self
    }

    #[inline]
    pub fn connect_delay(&self) -> Duration {
        seconds(self.connect_time)
    }

    #[inline]
    pub fn write_delay(&self) -> Duration {
        seconds(self.write_time)
    }

    #[inline]
    pub fn disconnect_delay(&self) -> Duration {
        seconds(self.disconnect_time)
    }

    pub fn writes(&self) -> bool {
        !self.message.is_empty()
    }
}

/// One scenario: N client timelines under a shared ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_unique_client_names))]
pub struct TestCase {
    #[validate(length(min = 1, message = "test case name must not be empty"))]
    pub name: String,

    /// Reserved; not used by the runner.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 86_400.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub wait_time: f64,

    /// Hard ceiling after which every client is force-disconnected.
    #[validate(range(min = 0.0, max = 86_400.0))]
    #[validate(custom(function = validation::validate_seconds))]
    pub connection_timeout: f64,

    #[serde(default)]
    #[validate(nested)]
    pub clients: Vec<ClientSpec>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, connection_timeout: f64) -> Self {
        Self {
            name: name.into(),
            wait_time: 0.0,
            connection_timeout,
            clients: Vec::new(),
        }
    }

    pub fn with_client(mut self, client: ClientSpec) -> Self {
        self.clients.push(client);
        self
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        seconds(self.connection_timeout)
    }
}

fn validate_unique_client_names(case: &TestCase) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(case.clients.len());
    for client in &case.clients {
        if !seen.insert(client.client_name.as_str()) {
            let mut err = ValidationError::new("duplicate_client_name");
            err.message = Some(format!("clientName '{}' is used twice", client.client_name).into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn basic() -> TestCase {
        TestCase::new("Manage basic communication", 30.0)
            .with_client(
                ClientSpec::new("clientA")
                    .connect_after(2.0)
                    .write_after(5.0, "Hello from clientA")
                    .disconnect_after(30.0),
            )
            .with_client(ClientSpec::new("clientB").disconnect_after(30.0))
    }

    #[test]
    fn valid_case_passes() {
        basic().validate().expect("basic case should validate");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let case = basic().with_client(ClientSpec::new("clientA").disconnect_after(1.0));
        let err = case.validate().unwrap_err().to_string();
        assert!(err.contains("used twice"), "unexpected error: {err}");
    }

    #[test]
    fn empty_client_name_is_rejected() {
        let case = TestCase::new("x", 1.0).with_client(ClientSpec::new(""));
        assert!(case.validate().is_err());
    }

    #[test]
    fn negative_and_nan_timings_are_rejected() {
        let mut case = basic();
        case.clients[0].write_time = -1.0;
        assert!(case.validate().is_err());

        let mut case = basic();
        case.connection_timeout = f64::NAN;
        assert!(case.validate().is_err());

        let mut case = basic();
        case.clients[1].disconnect_time = f64::NAN;
        assert!(case.validate().is_err());
    }

    #[test]
    fn yaml_nan_timing_is_rejected() {
        let yaml = r#"
name: not a number
connectionTimeout: .nan
"#;
        let case: TestCase = serde_yaml::from_str(yaml).unwrap();
        assert!(case.connection_timeout.is_nan());
        assert!(case.validate().is_err());
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let yaml = r#"
name: Manage absence of correspondent
connectionTimeout: 30
clients:
  - clientName: clientA
    connectTime: 2
    disconnectTime: 30
"#;
        let case: TestCase = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(case.wait_time, 0.0);
        assert_eq!(case.clients[0].message, "");
        assert_eq!(case.clients[0].password, "");
        assert!(!case.clients[0].writes());
        assert_eq!(case.clients[0].connect_delay(), Duration::from_secs(2));
        assert_eq!(case.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn non_numeric_timing_fails_to_parse() {
        let yaml = r#"
name: broken
connectionTimeout: soon
"#;
        assert!(serde_yaml::from_str::<TestCase>(yaml).is_err());
    }

    proptest! {
        #[test]
        fn in_range_timings_always_validate(
            connect in 0.0f64..MAX_SECONDS,
            write in 0.0f64..MAX_SECONDS,
            disconnect in 0.0f64..MAX_SECONDS,
            timeout in 0.0f64..MAX_SECONDS,
        ) {
            let case = TestCase::new("p", timeout).with_client(
                ClientSpec::new("c")
                    .connect_after(connect)
                    .write_after(write, "m")
                    .disconnect_after(disconnect),
            );
            prop_assert!(case.validate().is_ok());
        }
    }
}
