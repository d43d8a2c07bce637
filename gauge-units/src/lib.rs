//! Gauge Units - Graph-Based Unit Conversion
//!
//! Converts values between units by searching a sparse, non-redundant graph
//! of conversion edges. Supports combined units (ratios and products),
//! currencies and fixed-offset timezones.
//!
//! Categories:
//! - Time (s, min, h, d, wk, yr)
//! - Temperature (c, f, k)
//! - Distance (in, ft, mm, cm, m, km, mi)
//! - Weight (oz, lb, g, kg, st, t)
//! - Volume (tsp, tbsp, ml, l, floz, cup, pt, qt, gal)
//! - Speed (mps, kph, mph, kn)
//! - Area (in2, ft2, cm2, m2, ac)
//! - Power (w, hp)
//! - Currency ($usd, $eur, ...)
//! - Timezone (PST, China CST, ...)

mod builtin;
mod catalog;
mod config;
mod currency;
mod engine;
mod error;
mod expr;
mod graph;
mod identifier;
mod matcher;
mod names;
mod resolve;
mod suggest;
mod timezone;

pub use catalog::Catalog;
pub use config::EngineConfig;
pub use currency::{BundledCurrencies, CurrencyFile, CurrencyRecord, CurrencySnapshot, CurrencySource};
pub use engine::{CategoryListing, UnitEngine, UnitEntry, TIMEZONE};
pub use error::{ConversionError, CurrencyError, GraphError};
pub use expr::{extract_units, is_combined, parse_unit_expr, ExprError, UnitExpr, UnitOp, MAX_EXPR_LEN, MAX_NESTING};
pub use graph::{ConversionGraph, Edge, TransformFn, Weight};
pub use identifier::UnitId;
pub use names::NameMapping;
pub use suggest::{matches_search, similarity, SIMILARITY_THRESHOLD};
pub use timezone::{format_utc_offset, Timezone};
