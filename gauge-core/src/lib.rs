//! Gauge Core - Fundamental types
//!
//! This crate provides the types shared by every Gauge surface:
//! - `GaugeError`: Structured errors for tool and LLM consumption
//! - `Severity`: How badly a request failed
//! - `codes`: Machine-readable error codes

mod error;

pub use error::{GaugeError, Severity, codes};
