//! Structured errors for LLM consumption
//!
//! Errors never crash the system. A failed conversion is a value carrying a
//! machine-readable code, a message and, when one exists, a hint at what the
//! caller probably meant.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNKNOWN_UNIT: &str = "UNKNOWN_UNIT";
    pub const NO_CONVERSION_PATH: &str = "NO_CONVERSION_PATH";
    pub const STRUCTURE_MISMATCH: &str = "STRUCTURE_MISMATCH";
    pub const NON_SCALAR_HOP: &str = "NON_SCALAR_HOP";
    pub const UNKNOWN_TIMEZONE: &str = "UNKNOWN_TIMEZONE";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Request failed
    Error,
    /// Engine cannot serve requests
    Fatal,
}

/// Structured error for LLM consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Near-miss names the caller may have meant
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub candidates: Vec<String>,

    /// Severity level
    pub severity: Severity,
}

impl GaugeError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            candidates: Vec::new(),
            severity: Severity::Error,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: attach near-miss candidates
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Builder: set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Serialize for transport. Falls back to a bare code/message pair.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "code": self.code, "message": self.message })
        })
    }

    // ========== Common Error Constructors ==========

    pub fn unknown_unit(unit: &str, candidates: Vec<String>) -> Self {
        let err = Self::new(codes::UNKNOWN_UNIT, format!("Could not convert the unit '{}'", unit));
        if candidates.is_empty() {
            err.with_suggestion("Use list_units to see available conversions")
        } else {
            let hint = format!("Did you mean one of: {}?", candidates.join(", "));
            err.with_suggestion(hint).with_candidates(candidates)
        }
    }

    pub fn unknown_timezone(zone: &str, candidates: Vec<String>) -> Self {
        let err = Self::new(codes::UNKNOWN_TIMEZONE, format!("Could not convert the timezone '{}'", zone));
        if candidates.is_empty() {
            err.with_suggestion("Use list_timezones to see available timezones")
        } else {
            let hint = format!("Did you mean one of: {}?", candidates.join(", "));
            err.with_suggestion(hint).with_candidates(candidates)
        }
    }

    pub fn no_conversion_path(from: &str, to: &str) -> Self {
        Self::new(codes::NO_CONVERSION_PATH, format!("No conversion path found from '{}' to '{}'", from, to))
            .with_suggestion("Both units must belong to the same category")
    }

    pub fn structure_mismatch(from: &str, to: &str) -> Self {
        Self::new(codes::STRUCTURE_MISMATCH,
            format!("Cannot convert '{}' to '{}'. Expressions must have matching structure", from, to))
            .with_suggestion("Use the same operators in the same positions, e.g. 'mi/h' to 'm/s'")
    }

    pub fn non_scalar_hop(from: &str, to: &str) -> Self {
        Self::new(codes::NON_SCALAR_HOP,
            format!("Cannot use '{}' to '{}' inside a combined unit: the conversion has an offset", from, to))
            .with_suggestion("Convert offset units such as temperatures on their own")
    }

    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_ARGUMENT, format!("Invalid argument: {}", details.into()))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_suggestion("This is a bug, please report it")
            .with_severity(Severity::Fatal)
    }
}

impl std::fmt::Display for GaugeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for GaugeError {}
