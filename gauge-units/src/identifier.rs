//! Category-qualified unit identifiers
//!
//! Internally every unit is a `(category, unit)` pair. Externally it is written
//! `category.unit`, e.g. `distance.km`. Temperature's bare tokens `c`, `f` and
//! `k` are the one exception: they carry an implicit category.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::GraphError;

/// Separator between category and unit in the external form
pub const SEPARATOR: char = '.';

/// Category of the bare temperature tokens
pub const TEMPERATURE: &str = "temperature";

const TEMPERATURE_TOKENS: [&str; 3] = ["c", "f", "k"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    category: String,
    unit: String,
}

impl UnitId {
    /// Create an identifier; both parts must be non-empty
    pub fn new(category: &str, unit: &str) -> Result<Self, GraphError> {
        let category = category.trim();
        let unit = unit.trim();
        if category.is_empty() || unit.is_empty() {
            return Err(GraphError::MalformedId(format!("{}{}{}", category, SEPARATOR, unit)));
        }
        Ok(UnitId {
            category: category.to_string(),
            unit: unit.to_string(),
        })
    }

    /// Parse the external form. Accepts `category.unit` and the bare
    /// temperature tokens (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, GraphError> {
        let s = s.trim();
        if let Some(id) = Self::temperature(s) {
            return Ok(id);
        }
        match s.split_once(SEPARATOR) {
            Some((category, unit)) => Self::new(category, unit),
            None => Err(GraphError::MalformedId(s.to_string())),
        }
    }

    /// Qualified identifier for a bare temperature token
    pub fn temperature(token: &str) -> Option<Self> {
        let lower = token.to_lowercase();
        TEMPERATURE_TOKENS
            .iter()
            .find(|t| **t == lower)
            .map(|t| UnitId {
                category: TEMPERATURE.to_string(),
                unit: t.to_string(),
            })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category, SEPARATOR, self.unit)
    }
}
