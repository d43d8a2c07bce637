//! Non-redundant conversion graph
//!
//! Each scalar relationship between two units is stored once, in one
//! direction: `(from, to) -> factor` means `from_value * factor == to_value`.
//! The reverse factor is always derived as `1 / factor`.
//!
//! Offset conversions (Celsius to Fahrenheit and friends) cannot be expressed
//! as a factor. They are stored as transform functions, and because a
//! function's inverse cannot be derived, both directions are stored
//! explicitly.

use std::collections::{BTreeSet, HashMap};
use crate::error::GraphError;
use crate::identifier::UnitId;

/// One-way value transform for affine conversions
pub type TransformFn = fn(f64) -> f64;

/// Weight of a stored edge
#[derive(Debug, Clone, Copy)]
pub enum Weight {
    /// Multiplicative factor, always positive and finite
    Scalar(f64),
    /// Direction-specific transform
    Transform(TransformFn),
}

impl Weight {
    /// Carry a value across this edge
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Weight::Scalar(factor) => value * factor,
            Weight::Transform(f) => f(value),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Weight::Scalar(factor) => Some(*factor),
            Weight::Transform(_) => None,
        }
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, Weight::Transform(_))
    }
}

/// A stored conversion relationship
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: UnitId,
    pub to: UnitId,
    pub weight: Weight,
}

/// Sparse graph of conversion edges between qualified identifiers
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    edges: Vec<Edge>,
    index: HashMap<(UnitId, UnitId), usize>,
    /// Edge indices touching each node, in insertion order
    adjacency: HashMap<UnitId, Vec<usize>>,
}

impl ConversionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar edge. Fails if the pair is already present in either
    /// direction, or if the factor is not positive and finite.
    pub fn insert_scalar(&mut self, from: UnitId, to: UnitId, factor: f64) -> Result<(), GraphError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(GraphError::InvalidFactor {
                from: from.to_string(),
                to: to.to_string(),
                factor,
            });
        }
        if self.has_pair(&from, &to) || self.has_pair(&to, &from) {
            return Err(GraphError::RedundantEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.push(Edge { from, to, weight: Weight::Scalar(factor) });
        Ok(())
    }

    /// Store one direction of a transform edge. The reverse direction, if
    /// any, must also be a transform.
    pub fn insert_transform(&mut self, from: UnitId, to: UnitId, transform: TransformFn) -> Result<(), GraphError> {
        let reverse_is_scalar = self
            .edge(&to, &from)
            .map_or(false, |e| !e.weight.is_transform());
        if self.has_pair(&from, &to) || reverse_is_scalar {
            return Err(GraphError::RedundantEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.push(Edge { from, to, weight: Weight::Transform(transform) });
        Ok(())
    }

    fn push(&mut self, edge: Edge) {
        let idx = self.edges.len();
        self.index.insert((edge.from.clone(), edge.to.clone()), idx);
        self.adjacency.entry(edge.from.clone()).or_default().push(idx);
        if edge.to != edge.from {
            self.adjacency.entry(edge.to.clone()).or_default().push(idx);
        }
        self.edges.push(edge);
    }

    fn has_pair(&self, from: &UnitId, to: &UnitId) -> bool {
        self.index.contains_key(&(from.clone(), to.clone()))
    }

    fn edge(&self, from: &UnitId, to: &UnitId) -> Option<&Edge> {
        self.index
            .get(&(from.clone(), to.clone()))
            .map(|&idx| &self.edges[idx])
    }

    /// Direct weight from `from` to `to`, deriving the reciprocal of a stored
    /// reverse scalar. A stored reverse transform yields `None`.
    pub fn lookup_direct(&self, from: &UnitId, to: &UnitId) -> Option<Weight> {
        if let Some(edge) = self.edge(from, to) {
            return Some(edge.weight);
        }
        match self.edge(to, from)?.weight {
            Weight::Scalar(factor) => Some(Weight::Scalar(1.0 / factor)),
            Weight::Transform(_) => None,
        }
    }

    /// Every edge leaving `id`, in insertion order. Scalars stored the other
    /// way round are inverted; transforms stored the other way round are
    /// skipped.
    pub fn neighbors(&self, id: &UnitId) -> Vec<(&UnitId, Weight)> {
        let Some(indices) = self.adjacency.get(id) else {
            return Vec::new();
        };

        indices
            .iter()
            .filter_map(|&idx| {
                let edge = &self.edges[idx];
                if &edge.from == id {
                    Some((&edge.to, edge.weight))
                } else {
                    match edge.weight {
                        Weight::Scalar(factor) => Some((&edge.from, Weight::Scalar(1.0 / factor))),
                        Weight::Transform(_) => None,
                    }
                }
            })
            .collect()
    }

    /// True if `id` is either end of some edge
    pub fn contains(&self, id: &UnitId) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sorted category names present in the graph
    pub fn categories(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.adjacency.keys().map(|id| id.category()).collect();
        set.into_iter().collect()
    }

    /// Sorted identifiers of one category
    pub fn units_in(&self, category: &str) -> Vec<&UnitId> {
        let set: BTreeSet<&UnitId> = self
            .adjacency
            .keys()
            .filter(|id| id.category() == category)
            .collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UnitId {
        UnitId::parse(s).unwrap()
    }

    fn double(v: f64) -> f64 {
        v * 2.0
    }

    fn halve(v: f64) -> f64 {
        v / 2.0
    }

    fn sample() -> ConversionGraph {
        let mut g = ConversionGraph::new();
        g.insert_scalar(id("time.s"), id("time.min"), 1.0 / 60.0).unwrap();
        g.insert_scalar(id("time.min"), id("time.h"), 1.0 / 60.0).unwrap();
        g.insert_transform(id("x.a"), id("x.b"), double).unwrap();
        g
    }

    #[test]
    fn test_lookup_forward_and_reverse() {
        let g = sample();
        let fwd = g.lookup_direct(&id("time.min"), &id("time.h")).unwrap();
        assert_eq!(fwd.as_scalar(), Some(1.0 / 60.0));

        let rev = g.lookup_direct(&id("time.h"), &id("time.min")).unwrap();
        assert!((rev.as_scalar().unwrap() - 60.0).abs() < 1e-12);

        assert!(g.lookup_direct(&id("time.s"), &id("time.h")).is_none());
    }

    #[test]
    fn test_reverse_transform_is_not_derived() {
        let g = sample();
        assert!(g.lookup_direct(&id("x.a"), &id("x.b")).is_some());
        assert!(g.lookup_direct(&id("x.b"), &id("x.a")).is_none());
        assert!(g.neighbors(&id("x.b")).is_empty());
    }

    #[test]
    fn test_neighbors_invert_scalars() {
        let g = sample();
        let n = g.neighbors(&id("time.min"));
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].0, &id("time.s"));
        assert!((n[0].1.as_scalar().unwrap() - 60.0).abs() < 1e-12);
        assert_eq!(n[1].0, &id("time.h"));
    }

    #[test]
    fn test_redundant_scalar_rejected() {
        let mut g = sample();
        let err = g.insert_scalar(id("time.h"), id("time.min"), 60.0).unwrap_err();
        assert!(matches!(err, GraphError::RedundantEdge { .. }));
        assert!(g.insert_scalar(id("time.s"), id("time.min"), 0.5).is_err());
    }

    #[test]
    fn test_transform_pairs_allowed() {
        let mut g = sample();
        g.insert_transform(id("x.b"), id("x.a"), halve).unwrap();
        let back = g.lookup_direct(&id("x.b"), &id("x.a")).unwrap();
        assert_eq!(back.apply(8.0), 4.0);
        assert!(g.insert_transform(id("x.b"), id("x.a"), halve).is_err());
    }

    #[test]
    fn test_transform_against_scalar_rejected() {
        let mut g = sample();
        assert!(g.insert_transform(id("time.min"), id("time.s"), halve).is_err());
    }

    #[test]
    fn test_invalid_factor() {
        let mut g = ConversionGraph::new();
        assert!(g.insert_scalar(id("a.x"), id("a.y"), 0.0).is_err());
        assert!(g.insert_scalar(id("a.x"), id("a.y"), -1.0).is_err());
        assert!(g.insert_scalar(id("a.x"), id("a.y"), f64::NAN).is_err());
    }

    #[test]
    fn test_categories_and_units() {
        let g = sample();
        assert_eq!(g.categories(), vec!["time", "x"]);
        let units: Vec<String> = g.units_in("time").iter().map(|u| u.unit().to_string()).collect();
        assert_eq!(units, vec!["h", "min", "s"]);
        assert!(g.contains(&id("time.h")));
        assert!(!g.contains(&id("time.d")));
    }
}
