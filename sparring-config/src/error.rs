//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration validation error.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),

    /// A single test case is malformed; the rest of the suite is unaffected.
    #[error("Test case #{index} ({name}) is invalid: {reason}")]
    InvalidCase {
        index: usize,
        name: String,
        reason: String,
    },

    /// Default configuration could not be rendered.
    #[error("Configuration serialization error: {0}")]
    Serialize(String),

    /// I/O error.
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.field_errors() {
        let _ = writeln!(output, "Field '{}':", field);
        for error in errors {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => error.code.to_string(),
            };
            let _ = writeln!(output, "  - {}", message);
        }
    }
    for (field, nested) in nested_errors(errors) {
        let _ = writeln!(output, "In '{}':", field);
        for line in format_validation_errors(nested).lines() {
            let _ = writeln!(output, "  {}", line);
        }
    }
    output
}

fn nested_errors(errors: &ValidationErrors) -> Vec<(String, &ValidationErrors)> {
    use validator::ValidationErrorsKind;

    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Struct(inner) => out.push((field.to_string(), inner.as_ref())),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    out.push((format!("{field}[{index}]"), inner.as_ref()));
                }
            }
            ValidationErrorsKind::Field(_) => {}
        }
    }
    out
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientSpec, TestCase};
    use validator::Validate;

    #[test]
    fn nested_client_errors_are_rendered() {
        let case = TestCase::new("x", 1.0).with_client(ClientSpec::new(""));
        let err = ConfigError::from(case.validate().unwrap_err());
        let text = err.to_string();
        assert!(text.contains("clients[0]"), "{text}");
        assert!(text.contains("clientName must not be empty"), "{text}");
    }
}
