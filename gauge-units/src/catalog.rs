//! A conversion graph together with its display names and name mapping

use std::collections::BTreeMap;
use std::sync::OnceLock;
use crate::builtin::{builtin_graph, builtin_labels};
use crate::currency::{self, CurrencyRecord, Installed};
use crate::error::{ConversionError, GraphError};
use crate::expr::MAX_EXPR_LEN;
use crate::graph::ConversionGraph;
use crate::identifier::UnitId;
use crate::names::{self, NameMapping};
use crate::suggest;

#[derive(Debug, Clone)]
pub struct Catalog {
    graph: ConversionGraph,
    labels: BTreeMap<String, String>,
    /// Built on first use; a catalog derived from this one starts empty again
    names: OnceLock<NameMapping>,
}

impl Catalog {
    pub fn new(graph: ConversionGraph, labels: BTreeMap<String, String>) -> Self {
        Catalog {
            graph,
            labels,
            names: OnceLock::new(),
        }
    }

    /// The fixed tables
    pub fn builtin() -> Result<Self, GraphError> {
        Ok(Self::new(builtin_graph()?, builtin_labels()))
    }

    /// A copy of this catalog with currency edges and names added
    pub fn with_currencies(&self, records: &[CurrencyRecord], base: &str) -> (Self, Installed) {
        let mut graph = self.graph.clone();
        let mut labels = self.labels.clone();
        let installed = currency::install(&mut graph, &mut labels, records, base);
        (Self::new(graph, labels), installed)
    }

    pub fn graph(&self) -> &ConversionGraph {
        &self.graph
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Display name of a unit abbreviation, e.g. `mi` -> `miles`
    pub fn label(&self, abbrev: &str) -> Option<&str> {
        self.labels.get(abbrev).map(String::as_str)
    }

    pub fn names(&self) -> &NameMapping {
        self.names.get_or_init(|| NameMapping::build(&self.graph))
    }

    pub fn normalize(&self, token: &str) -> Option<UnitId> {
        names::normalize(token, self.names())
    }

    /// True iff the token normalizes to an identifier referenced by an edge
    pub fn is_valid(&self, token: &str) -> bool {
        self.normalize(token).map_or(false, |id| self.graph.contains(&id))
    }

    /// Normalized identifier, or `UnknownUnit` with suggestions
    pub fn require(&self, token: &str) -> Result<UnitId, ConversionError> {
        self.normalize(token)
            .filter(|id| self.graph.contains(id))
            .ok_or_else(|| ConversionError::UnknownUnit {
                unit: token.to_string(),
                suggestions: self.suggest(token, None),
            })
    }

    /// Ranked graph units resembling `token`, optionally limited to some
    /// categories. Country names find their currency: "germany" -> `$eur`.
    pub fn suggest(&self, token: &str, categories: Option<&[&str]>) -> Vec<String> {
        let token = token.trim();
        if token.is_empty() || token.chars().count() > MAX_EXPR_LEN {
            return Vec::new();
        }
        let wants = |cat: &str| categories.map_or(true, |wanted| wanted.contains(&cat));

        let units = self
            .graph
            .categories()
            .into_iter()
            .filter(|cat| wants(*cat))
            .flat_map(|cat| self.graph.units_in(cat))
            .map(|id| (id.unit(), self.label(id.unit()).unwrap_or(id.unit())));
        let countries = self
            .labels
            .iter()
            .filter(|(key, _)| wants(currency::CURRENCY) && currency::is_country_key(key))
            .map(|(key, name)| (key.as_str(), name.as_str()));
        let candidates: Vec<(&str, &str)> = units.chain(countries).collect();

        let mut out: Vec<String> = Vec::new();
        for hit in suggest::rank(token, candidates) {
            let name = currency::code_key(&hit.name);
            if !out.iter().any(|seen| seen == name) {
                out.push(name.to_string());
            }
        }
        out
    }
}
