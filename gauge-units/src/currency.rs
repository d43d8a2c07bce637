//! Currency extension - exchange rates as scalar edges
//!
//! Every currency lives in the `currency` category under a `$`-marked code
//! (`currency.$eur`). Rates are "units of foreign currency per one unit of the
//! base currency", so each code contributes a single edge from the base.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use crate::error::CurrencyError;
use crate::graph::ConversionGraph;
use crate::identifier::UnitId;

/// Category holding every currency
pub const CURRENCY: &str = "currency";

/// Marker prefixed to currency codes
pub const MARKER: char = '$';

/// Listed when no search term is given
pub const TOP_CURRENCIES: [&str; 8] = ["$usd", "$eur", "$gbp", "$jpy", "$cad", "$aud", "$chf", "$cny"];

/// Snapshot compiled into the crate
const BUNDLED: &str = include_str!("../data/currencies.json");

/// One row of exchange-rate data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Decimal string or number; anything else is ignored
    #[serde(default)]
    pub exchange_rate: Option<JsonValue>,
}

impl CurrencyRecord {
    /// Exchange rate if it parses as a positive finite number
    pub fn rate(&self) -> Option<f64> {
        let rate = match self.exchange_rate.as_ref()? {
            JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
            JsonValue::Number(n) => n.as_f64()?,
            _ => return None,
        };
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }

    /// `"Country (Currency)"`
    pub fn display_name(&self) -> String {
        format!(
            "{} ({})",
            self.country.as_deref().unwrap_or_default(),
            self.currency.as_deref().unwrap_or_default()
        )
    }
}

/// Exchange-rate data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrencySnapshot {
    #[serde(default)]
    pub record_date: Option<String>,
    #[serde(default)]
    pub total_records: Option<usize>,
    #[serde(default)]
    pub data: Vec<CurrencyRecord>,
}

impl CurrencySnapshot {
    pub fn from_json(text: &str) -> Result<Self, CurrencyError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Where exchange-rate records come from
pub trait CurrencySource: Send + Sync {
    fn load(&self) -> Result<CurrencySnapshot, CurrencyError>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// The snapshot bundled with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCurrencies;

impl CurrencySource for BundledCurrencies {
    fn load(&self) -> Result<CurrencySnapshot, CurrencyError> {
        CurrencySnapshot::from_json(BUNDLED)
    }

    fn describe(&self) -> String {
        "bundled snapshot".to_string()
    }
}

/// A JSON file on disk with the same layout as the bundled snapshot
#[derive(Debug, Clone)]
pub struct CurrencyFile {
    pub path: PathBuf,
}

impl CurrencyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CurrencyFile { path: path.into() }
    }
}

impl CurrencySource for CurrencyFile {
    fn load(&self) -> Result<CurrencySnapshot, CurrencyError> {
        let text = fs::read_to_string(&self.path).map_err(|source| CurrencyError::Io {
            path: self.path.clone(),
            source,
        })?;
        CurrencySnapshot::from_json(&text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// `$eur` for `EUR`
pub fn currency_key(code: &str) -> String {
    format!("{}{}", MARKER, code.trim().to_lowercase())
}

/// `$eur_euro_zone` for `EUR` / `Euro Zone`
pub fn country_key(code: &str, country: &str) -> String {
    let country = country.to_lowercase().replace([' ', '-'], "_");
    format!("{}_{}", currency_key(code), country)
}

/// Labels with a country qualifier (`$eur_germany`), as opposed to bare codes
pub fn is_country_key(key: &str) -> bool {
    key.starts_with(MARKER) && key.contains('_')
}

/// Bare currency key of a country-qualified one: `$eur_germany` -> `$eur`
pub fn code_key(key: &str) -> &str {
    key.split('_').next().unwrap_or(key)
}

/// Upper-case code of a currency key: `$eur_germany` -> `EUR`
pub fn display_code(key: &str) -> String {
    let code = key.trim_start_matches(MARKER);
    code.split('_').next().unwrap_or(code).to_uppercase()
}

/// Summary of an installation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Installed {
    pub records: usize,
    pub codes: usize,
    pub edges: usize,
}

/// Add currency edges and display names.
///
/// The first record of each code wins; later records of the same code only
/// add their country-qualified label.
pub fn install(
    graph: &mut ConversionGraph,
    labels: &mut BTreeMap<String, String>,
    records: &[CurrencyRecord],
    base: &str,
) -> Installed {
    let base_key = currency_key(base);
    let mut seen: HashSet<String> = HashSet::new();
    let mut installed = Installed::default();

    for record in records {
        let Some(code) = record.currency_code.as_deref().filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        installed.records += 1;

        let key = currency_key(code);
        let name = record.display_name();
        labels.insert(country_key(code, record.country.as_deref().unwrap_or_default()), name.clone());

        if !seen.insert(key.clone()) {
            continue;
        }
        installed.codes += 1;
        labels.insert(key.clone(), name);

        if key == base_key {
            continue;
        }
        let Some(rate) = record.rate() else {
            debug!(code, "skipping currency without a usable rate");
            continue;
        };

        let edge = UnitId::new(CURRENCY, &base_key)
            .and_then(|from| UnitId::new(CURRENCY, &key).map(|to| (from, to)))
            .and_then(|(from, to)| graph.insert_scalar(from, to, rate));
        match edge {
            Ok(()) => installed.edges += 1,
            Err(err) => warn!(code, %err, "rejected currency edge"),
        }
    }

    if base_key == currency_key("USD") {
        labels.insert(base_key.clone(), "United States (Dollar)".to_string());
        labels.insert(country_key("USD", "United States"), "United States (Dollar)".to_string());
    } else {
        labels.entry(base_key.clone()).or_insert_with(|| base.trim().to_uppercase());
    }

    info!(
        records = installed.records,
        codes = installed.codes,
        edges = installed.edges,
        base = %base_key,
        "installed currency extension"
    );
    installed
}
