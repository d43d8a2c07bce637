//! The conversion engine facade
//!
//! `UnitEngine` owns the built-in catalog and, once the currency extension
//! has been installed, an extended copy of it. Installation runs at most once
//! per engine, on the first call that needs the catalog.

use std::sync::OnceLock;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::currency::{self, BundledCurrencies, CurrencyFile, CurrencySource, TOP_CURRENCIES};
use crate::error::{ConversionError, GraphError};
use crate::expr::{self, parse_unit_expr, UnitExpr};
use crate::identifier::UnitId;
use crate::matcher;
use crate::resolve::resolve;
use crate::suggest::matches_search;
use crate::timezone::{self, TIMEZONES, TOP_TIMEZONES};

/// Pseudo-category listing timezones alongside graph categories
pub const TIMEZONE: &str = "timezone";

/// One row of a listing: what to type (or display) and its full name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitEntry {
    pub name: String,
    pub full_name: String,
}

impl UnitEntry {
    fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        UnitEntry {
            name: name.into(),
            full_name: full_name.into(),
        }
    }
}

/// Units of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub category: String,
    pub units: Vec<UnitEntry>,
}

pub struct UnitEngine {
    builtin: Catalog,
    source: Option<Box<dyn CurrencySource>>,
    base_currency: String,
    /// `None` inside means the source failed and the built-in catalog stays
    extended: OnceLock<Option<Catalog>>,
}

impl std::fmt::Debug for UnitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitEngine")
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .field("base_currency", &self.base_currency)
            .field("currency_loaded", &self.extended.get().is_some())
            .finish()
    }
}

impl UnitEngine {
    /// Engine with the bundled currency snapshot
    pub fn new() -> Result<Self, GraphError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, GraphError> {
        let source: Option<Box<dyn CurrencySource>> = match (config.currency_enabled, config.currency_path) {
            (false, _) => None,
            (true, Some(path)) => Some(Box::new(CurrencyFile::new(path))),
            (true, None) => Some(Box::new(BundledCurrencies)),
        };

        let builtin = Catalog::builtin()?;
        debug!(edges = builtin.graph().len(), "built-in conversion graph ready");

        Ok(UnitEngine {
            builtin,
            source,
            base_currency: config.base_currency,
            extended: OnceLock::new(),
        })
    }

    /// Replace the currency source. Has no effect once currencies are loaded.
    pub fn with_currency_source(mut self, source: impl CurrencySource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Install the currency extension if that has not happened yet and return
    /// the catalog in effect. Idempotent.
    pub fn ensure_currency_loaded(&self) -> &Catalog {
        let Some(source) = self.source.as_ref() else {
            return &self.builtin;
        };

        self.extended
            .get_or_init(|| match source.load() {
                Ok(snapshot) => {
                    info!(
                        source = %source.describe(),
                        record_date = snapshot.record_date.as_deref().unwrap_or("unknown"),
                        "loading currency data"
                    );
                    let (catalog, _) = self.builtin.with_currencies(&snapshot.data, &self.base_currency);
                    Some(catalog)
                }
                Err(err) => {
                    warn!(source = %source.describe(), %err, "currency data unavailable, continuing without it");
                    None
                }
            })
            .as_ref()
            .unwrap_or(&self.builtin)
    }

    fn catalog(&self) -> &Catalog {
        self.ensure_currency_loaded()
    }

    /// Convert `value` between two units, combined units or timezones
    pub fn convert(&self, from: &str, to: &str, value: f64) -> Result<f64, ConversionError> {
        let catalog = self.catalog();
        let (from, to) = (from.trim(), to.trim());

        if from.is_empty() {
            return Err(ConversionError::unknown_unit(from));
        }
        if to.is_empty() {
            return Err(ConversionError::unknown_unit(to));
        }

        if from.to_lowercase() == to.to_lowercase() {
            return Ok(value);
        }

        if timezone::is_timezone(from) || timezone::is_timezone(to) {
            return timezone::convert_timezone(from, to, value);
        }

        let from_combined = expr::is_combined(from);
        let to_combined = expr::is_combined(to);
        if from_combined || to_combined {
            if from_combined != to_combined {
                return Err(ConversionError::SimpleCombinedMix {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            return Ok(value * self.combined_factor(catalog, from, to)?);
        }

        let from_id = catalog.require(from)?;
        let to_id = catalog.require(to)?;
        resolve(catalog.graph(), &from_id, &to_id, value)
    }

    /// Multiplicative factor between two structurally matching expressions
    pub fn factor(&self, from: &str, to: &str) -> Result<f64, ConversionError> {
        self.combined_factor(self.catalog(), from, to)
    }

    fn combined_factor(&self, catalog: &Catalog, from: &str, to: &str) -> Result<f64, ConversionError> {
        let from_expr = parse_expr(catalog, from)?;
        let to_expr = parse_expr(catalog, to)?;

        for leaf in from_expr.units().into_iter().chain(to_expr.units()) {
            catalog.require(leaf)?;
        }

        matcher::factor(catalog.graph(), catalog.names(), &from_expr, &to_expr)
    }

    pub fn normalize(&self, token: &str) -> Option<UnitId> {
        self.catalog().normalize(token)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.catalog().is_valid(token)
    }

    /// Ranked near-misses for a token. The `timezone` category adds
    /// timezone names.
    pub fn suggest(&self, token: &str, categories: Option<&[&str]>) -> Vec<String> {
        let mut out = self.catalog().suggest(token, categories);
        if categories.map_or(false, |cats| cats.contains(&TIMEZONE)) {
            out.extend(timezone::suggestions(token));
        }
        out
    }

    pub fn is_timezone(&self, token: &str) -> bool {
        timezone::is_timezone(token)
    }

    pub fn is_combined(&self, token: &str) -> bool {
        expr::is_combined(token)
    }

    pub fn extract_units(&self, token: &str) -> Vec<String> {
        expr::extract_units(token)
    }

    /// Sorted categories of the active graph
    pub fn categories(&self) -> Vec<String> {
        self.catalog().graph().categories().into_iter().map(String::from).collect()
    }

    /// Units per category. Without a search term currencies and timezones
    /// are limited to their top entries. `categories` defaults to every
    /// graph category plus `timezone`.
    pub fn units(&self, search: &str, categories: Option<&[&str]>) -> Vec<CategoryListing> {
        let catalog = self.catalog();
        let search = search.trim();

        let mut wanted: Vec<String> = match categories {
            Some(cats) => cats.iter().map(|c| c.to_lowercase()).collect(),
            None => {
                let mut all = self.categories();
                if !all.iter().any(|c| c == TIMEZONE) {
                    all.push(TIMEZONE.to_string());
                }
                all
            }
        };
        wanted.sort();
        wanted.dedup();

        wanted
            .into_iter()
            .filter_map(|category| {
                let units = self.category_units(catalog, &category, search);
                (!units.is_empty()).then_some(CategoryListing { category, units })
            })
            .collect()
    }

    fn category_units(&self, catalog: &Catalog, category: &str, search: &str) -> Vec<UnitEntry> {
        // (sort key, entry)
        let mut rows: Vec<(String, UnitEntry)> = match category {
            currency::CURRENCY if search.is_empty() => TOP_CURRENCIES
                .iter()
                .filter_map(|key| {
                    let name = catalog.label(key)?;
                    Some((key.to_string(), UnitEntry::new(currency::display_code(key), name)))
                })
                .collect(),
            currency::CURRENCY => catalog
                .labels()
                .iter()
                .filter(|(key, name)| currency::is_country_key(key) && matches_search(key, name, search))
                .map(|(key, name)| (key.clone(), UnitEntry::new(currency::display_code(key), name.clone())))
                .collect(),
            TIMEZONE if search.is_empty() => TOP_TIMEZONES
                .iter()
                .filter_map(|key| timezone::lookup(key))
                .map(|tz| (tz.key.to_string(), UnitEntry::new(tz.display_abbrev(), tz.label())))
                .collect(),
            TIMEZONE => TIMEZONES
                .iter()
                .filter(|tz| matches_search(&tz.input_format(), &tz.label(), search))
                .map(|tz| (tz.key.to_string(), UnitEntry::new(tz.display_abbrev(), tz.label())))
                .collect(),
            _ => catalog
                .graph()
                .units_in(category)
                .into_iter()
                .map(|id| (id.unit(), catalog.label(id.unit()).unwrap_or(id.unit())))
                .filter(|(abbrev, name)| matches_search(abbrev, name, search))
                .map(|(abbrev, name)| (abbrev.to_string(), UnitEntry::new(abbrev, name)))
                .collect(),
        };

        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Every country-qualified currency, as `(CODE, "Country (Currency)")`,
    /// sorted by full name
    pub fn currencies(&self, search: &str) -> Vec<UnitEntry> {
        let search = search.trim();
        let mut entries: Vec<UnitEntry> = self
            .catalog()
            .labels()
            .iter()
            .filter(|(key, name)| currency::is_country_key(key) && matches_search(key, name, search))
            .map(|(key, name)| UnitEntry::new(currency::display_code(key), name.clone()))
            .collect();
        entries.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        entries
    }

    /// Every timezone, as `(ABBR, "Name (UTC±..)")`, sorted by full name
    pub fn timezones(&self, search: &str) -> Vec<UnitEntry> {
        let search = search.trim();
        let mut entries: Vec<UnitEntry> = TIMEZONES
            .iter()
            .filter(|tz| matches_search(&tz.input_format(), &tz.label(), search))
            .map(|tz| UnitEntry::new(tz.display_abbrev(), tz.label()))
            .collect();
        entries.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        entries
    }
}

/// Unparseable expressions count as unknown units
fn parse_expr(catalog: &Catalog, token: &str) -> Result<UnitExpr, ConversionError> {
    parse_unit_expr(token).map_err(|_| ConversionError::UnknownUnit {
        unit: token.to_string(),
        suggestions: catalog.suggest(token, None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencySnapshot;
    use crate::error::CurrencyError;

    fn engine() -> UnitEngine {
        UnitEngine::new().unwrap()
    }

    fn builtin_only() -> UnitEngine {
        UnitEngine::with_config(EngineConfig::default().without_currency()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-5 * b.abs().max(1e-12)
    }

    struct FailingSource;

    impl CurrencySource for FailingSource {
        fn load(&self) -> Result<CurrencySnapshot, CurrencyError> {
            Err(CurrencySnapshot::from_json("[").unwrap_err())
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn test_concrete_scenarios() {
        let e = engine();
        assert!(close(e.convert("h", "min", 2.0).unwrap(), 120.0));
        assert!(close(e.convert("mi", "in", 1.0).unwrap(), 63360.0));
        assert!(close(e.convert("c", "f", 0.0).unwrap(), 32.0));
        assert!(close(e.convert("mi/h", "m/s", 10.0).unwrap(), 4.4704));
        assert!(close(e.convert("ft*lb", "m*kg", 1.0).unwrap(), 0.1382549544));
    }

    #[test]
    fn test_bogus_unit() {
        let e = engine();
        let err = e.convert("bogus", "mi", 5.0).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownUnit { ref unit, .. } if unit == "bogus"));
    }

    #[test]
    fn test_misspelled_unit_has_suggestions() {
        let e = engine();
        match e.convert("kilometres", "mi", 5.0).unwrap_err() {
            ConversionError::UnknownUnit { unit, suggestions } => {
                assert_eq!(unit, "kilometres");
                assert!(suggestions.contains(&"km".to_string()), "got {:?}", suggestions);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_first_invalid_side_reported() {
        let e = engine();
        let err = e.convert("km", "bogus", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownUnit { ref unit, .. } if unit == "bogus"));

        let err = e.convert("foo", "bar", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownUnit { ref unit, .. } if unit == "foo"));
    }

    #[test]
    fn test_oversized_combined_token() {
        let e = engine();
        let from = vec!["m"; 20_000].join("*");
        let to = vec!["km"; 20_000].join("*");
        match e.convert(&from, &to, 1.0).unwrap_err() {
            ConversionError::UnknownUnit { unit, suggestions } => {
                assert_eq!(unit, from);
                assert!(suggestions.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!e.is_combined(&from));
    }

    #[test]
    fn test_round_trip_every_pair() {
        let e = builtin_only();
        let graph = e.catalog().graph();
        for category in graph.categories() {
            let ids = graph.units_in(category);
            for u in &ids {
                for v in &ids {
                    let (u, v) = (u.to_string(), v.to_string());
                    for x in [7.3, -2.5, 1000.0] {
                        let there = e.convert(&u, &v, x).unwrap();
                        let back = e.convert(&v, &u, there).unwrap();
                        assert!(close(back, x), "{} -> {} -> {}: {} became {}", u, v, u, x, back);
                    }
                }
            }
        }
    }

    #[test]
    fn test_identity_any_case() {
        let e = engine();
        let graph = e.catalog().graph();
        for category in graph.categories() {
            for id in graph.units_in(category) {
                let unit = id.unit();
                assert_eq!(e.convert(unit, unit, 42.5).unwrap(), 42.5);
                assert_eq!(e.convert(unit, &unit.to_uppercase(), -1.25).unwrap(), -1.25);
            }
        }
    }

    #[test]
    fn test_empty_token() {
        let e = engine();
        assert!(matches!(e.convert("", "km", 1.0), Err(ConversionError::UnknownUnit { .. })));
        assert!(matches!(e.convert("km", "  ", 1.0), Err(ConversionError::UnknownUnit { .. })));
    }

    #[test]
    fn test_simple_combined_mix() {
        let e = engine();
        let err = e.convert("mi", "m/s", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::SimpleCombinedMix { .. }));
    }

    #[test]
    fn test_combined_errors() {
        let e = engine();
        let err = e.convert("ft*lb", "m/kg", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::StructureMismatch { .. }));

        let err = e.convert("mi/hr", "m/s", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownUnit { ref unit, .. } if unit == "hr"));

        let err = e.convert("c/h", "f/h", 1.0).unwrap_err();
        assert!(matches!(err, ConversionError::NonScalarCombinedHop { .. }));
    }

    #[test]
    fn test_factor() {
        let e = engine();
        assert!(close(e.factor("km/h", "m/s").unwrap(), 1.0 / 3.6));
        assert!(close(e.factor("ft", "m").unwrap(), 0.3048));
        assert!(matches!(e.factor("mi/", "m/s"), Err(ConversionError::UnknownUnit { .. })));
    }

    #[test]
    fn test_currency_conversion() {
        let e = engine();
        assert!(e.is_valid("$EUR"));
        assert!(close(e.convert("$usd", "$eur", 100.0).unwrap(), 85.1));
        let back = e.convert("$eur", "$usd", e.convert("$usd", "$eur", 12.0).unwrap()).unwrap();
        assert!(close(back, 12.0));
        // Two hops through the base
        assert!(close(e.convert("$eur", "$jpy", 0.851).unwrap(), 156.61));
        assert!(close(e.convert("$usd/h", "$eur/min", 60.0).unwrap(), 0.851));
    }

    #[test]
    fn test_currency_disabled() {
        let e = builtin_only();
        assert!(!e.is_valid("$eur"));
        assert!(!e.categories().contains(&"currency".to_string()));
        assert!(e.currencies("").is_empty());
    }

    #[test]
    fn test_failing_source_keeps_builtin() {
        let e = engine().with_currency_source(FailingSource);
        assert!(!e.is_valid("$eur"));
        assert!(close(e.convert("h", "min", 1.0).unwrap(), 60.0));
        // Idempotent
        assert!(e.ensure_currency_loaded().graph().len() == e.ensure_currency_loaded().graph().len());
    }

    #[test]
    fn test_missing_currency_file_keeps_builtin() {
        let config = EngineConfig::default().with_currency_path("/nonexistent/gauge/rates.json");
        let e = UnitEngine::with_config(config).unwrap();
        assert!(!e.is_valid("$eur"));
        assert!(e.is_valid("km"));
    }

    #[test]
    fn test_timezones() {
        let e = engine();
        assert_eq!(e.convert("PST", "China CST", 9.0).unwrap(), 25.0);
        assert_eq!(e.convert("utc", "npt", 0.0).unwrap(), 5.75);

        match e.convert("pst", "km", 1.0).unwrap_err() {
            ConversionError::UnknownTimezone { zone, .. } => assert_eq!(zone, "km"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_suggest() {
        let e = engine();
        assert_eq!(e.suggest("mils", None).first().map(String::as_str), Some("mi"));
        assert!(e.suggest("pacific", Some(&[TIMEZONE][..])).contains(&"PST".to_string()));
        assert!(e.suggest("zzzzzz", None).is_empty());
        assert!(e.suggest("germany", None).contains(&"$eur".to_string()));

        match e.convert("germany", "$usd", 1.0).unwrap_err() {
            ConversionError::UnknownUnit { suggestions, .. } => {
                assert!(suggestions.contains(&"$eur".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_normalize_and_helpers() {
        let e = engine();
        assert_eq!(e.normalize("km").unwrap().to_string(), "distance.km");
        assert_eq!(e.normalize("$GBP").unwrap().to_string(), "currency.$gbp");
        assert!(e.is_combined("(ft*in)/h"));
        assert!(!e.is_combined("ft"));
        assert_eq!(e.extract_units("ft*lb"), vec!["ft", "lb"]);
    }

    #[test]
    fn test_categories() {
        let e = engine();
        let cats = e.categories();
        assert!(cats.contains(&"currency".to_string()));
        assert!(cats.contains(&"distance".to_string()));
        let mut sorted = cats.clone();
        sorted.sort();
        assert_eq!(cats, sorted);
    }

    #[test]
    fn test_units_without_search() {
        let e = engine();
        let listing = e.units("", None);
        let names: Vec<&str> = listing.iter().map(|l| l.category.as_str()).collect();
        assert!(names.contains(&"timezone"));
        assert!(names.contains(&"time"));

        let currency = listing.iter().find(|l| l.category == "currency").unwrap();
        assert!(currency.units.len() <= TOP_CURRENCIES.len());
        assert!(currency.units.iter().any(|u| u.name == "EUR"));

        let tz = listing.iter().find(|l| l.category == TIMEZONE).unwrap();
        assert_eq!(tz.units.len(), TOP_TIMEZONES.len());

        let distance = listing.iter().find(|l| l.category == "distance").unwrap();
        assert!(distance.units.contains(&UnitEntry::new("mi", "miles")));
    }

    #[test]
    fn test_units_with_search() {
        let e = engine();
        let listing = e.units("gallon", None);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].category, "volume");
        assert_eq!(listing[0].units[0].name, "gal");

        let listing = e.units("mile", Some(&["distance"][..]));
        assert_eq!(listing.len(), 1);
        assert!(listing[0].units.iter().any(|u| u.name == "mi"));
    }

    #[test]
    fn test_currency_listing() {
        let e = engine();
        let all = e.currencies("");
        assert!(all.len() > 100);
        let mut sorted = all.clone();
        sorted.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        assert_eq!(all, sorted);

        let japan = e.currencies("japan");
        assert!(japan.contains(&UnitEntry::new("JPY", "Japan (Yen)")));
        assert!(japan.len() < all.len());
    }

    #[test]
    fn test_timezone_listing() {
        let e = engine();
        assert_eq!(e.timezones("").len(), TIMEZONES.len());
        let india = e.timezones("indian");
        assert!(india.contains(&UnitEntry::new("IST", "Indian Standard Time (UTC+05:30)")));
    }
}
