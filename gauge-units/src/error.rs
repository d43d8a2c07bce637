//! Error types for graph construction, conversion and currency loading

use std::path::PathBuf;
use thiserror::Error;
use gauge_core::GaugeError;

/// Why a conversion request could not be served
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Token does not normalize to any identifier referenced by an edge
    #[error("unknown unit: {unit}")]
    UnknownUnit {
        unit: String,
        suggestions: Vec<String>,
    },

    /// Both units are valid but live in disconnected parts of the graph
    #[error("no conversion path found from '{from}' to '{to}'")]
    NoConversionPath { from: String, to: String },

    /// Combined-unit expressions differ in shape or operator
    #[error("cannot convert '{from}' to '{to}': expressions must have matching structure")]
    StructureMismatch { from: String, to: String },

    /// One side is a combined unit and the other a simple unit
    #[error("cannot convert between simple and combined units: '{from}' to '{to}'")]
    SimpleCombinedMix { from: String, to: String },

    /// A combined-unit factor needed an offset (function-weighted) hop
    #[error("conversion from '{from}' to '{to}' has an offset and cannot be part of a combined unit")]
    NonScalarCombinedHop { from: String, to: String },

    /// One side is a timezone and the other is not a known timezone
    #[error("unknown timezone: {zone}")]
    UnknownTimezone {
        zone: String,
        suggestions: Vec<String>,
    },
}

impl ConversionError {
    pub fn unknown_unit(unit: impl Into<String>) -> Self {
        ConversionError::UnknownUnit { unit: unit.into(), suggestions: Vec::new() }
    }

    /// Suggestions attached to the failure, if any
    pub fn suggestions(&self) -> &[String] {
        match self {
            ConversionError::UnknownUnit { suggestions, .. }
            | ConversionError::UnknownTimezone { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

impl From<ConversionError> for GaugeError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::UnknownUnit { unit, suggestions } => GaugeError::unknown_unit(&unit, suggestions),
            ConversionError::NoConversionPath { from, to } => GaugeError::no_conversion_path(&from, &to),
            ConversionError::StructureMismatch { from, to } => GaugeError::structure_mismatch(&from, &to),
            ConversionError::SimpleCombinedMix { from, to } => {
                GaugeError::structure_mismatch(&from, &to)
                    .with_suggestion("Both sides must be combined units, e.g. 'ft*lb' to 'm*kg'")
            }
            ConversionError::NonScalarCombinedHop { from, to } => GaugeError::non_scalar_hop(&from, &to),
            ConversionError::UnknownTimezone { zone, suggestions } => GaugeError::unknown_timezone(&zone, suggestions),
        }
    }
}

/// Invalid data offered to the conversion graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("malformed unit identifier: '{0}'")]
    MalformedId(String),

    #[error("edge {from} -> {to} is already stored (in either direction)")]
    RedundantEdge { from: String, to: String },

    #[error("edge {from} -> {to} has invalid factor {factor}")]
    InvalidFactor { from: String, to: String, factor: f64 },
}

/// Failure to obtain currency records
#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("failed to read currency data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid currency data: {0}")]
    Json(#[from] serde_json::Error),
}
