//! Identifier normalization - user tokens to qualified identifiers

use std::collections::HashMap;
use tracing::debug;
use crate::graph::ConversionGraph;
use crate::identifier::{UnitId, SEPARATOR};

/// Plain unit name (e.g. `km`) to qualified identifier (`distance.km`),
/// built by scanning every identifier referenced by the graph.
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    exact: HashMap<String, UnitId>,
    folded: HashMap<String, UnitId>,
}

impl NameMapping {
    pub fn build(graph: &ConversionGraph) -> Self {
        let mut mapping = NameMapping::default();

        for edge in graph.edges() {
            for id in [&edge.from, &edge.to] {
                mapping.exact.insert(id.unit().to_string(), id.clone());
                mapping
                    .folded
                    .entry(id.unit().to_lowercase())
                    .or_insert_with(|| id.clone());
            }
        }

        debug!(names = mapping.exact.len(), "built unit name mapping");
        mapping
    }

    /// Exact-case match first, then case-insensitive
    pub fn lookup(&self, name: &str) -> Option<&UnitId> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Map a user token to its qualified identifier.
///
/// Tokens already in `category.unit` form pass through, bare temperature
/// tokens get their implicit category, everything else goes through the
/// mapping. `None` means the token is unresolved; that is an ordinary
/// outcome, not an error.
pub fn normalize(token: &str, mapping: &NameMapping) -> Option<UnitId> {
    let token = token.trim();

    if token.contains(SEPARATOR) {
        return UnitId::parse(token).ok();
    }
    if let Some(id) = UnitId::temperature(token) {
        return Some(id);
    }

    mapping.lookup(token).cloned()
}
