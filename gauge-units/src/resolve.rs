//! Path resolution - breadth-first search over the conversion graph
//!
//! The search carries a state along every explored edge and stops the first
//! time the target is dequeued. For plain conversions the state is the value
//! itself; for combined-unit factors it is a factor that becomes undefined as
//! soon as a transform edge is crossed.

use std::collections::{HashSet, VecDeque};
use tracing::debug;
use crate::error::ConversionError;
use crate::graph::{ConversionGraph, Weight};
use crate::identifier::UnitId;

/// Generic BFS. Returns the state carried along the first path that reaches
/// `to`, or `None` when the frontier empties.
fn search<S, F>(graph: &ConversionGraph, from: &UnitId, to: &UnitId, seed: S, step: F) -> Option<S>
where
    S: Copy,
    F: Fn(S, Weight) -> S,
{
    if let Some(weight) = graph.lookup_direct(from, to) {
        return Some(step(seed, weight));
    }

    let mut visited: HashSet<&UnitId> = HashSet::new();
    let mut queue: VecDeque<(&UnitId, S)> = VecDeque::from([(from, seed)]);

    while let Some((current, state)) = queue.pop_front() {
        if current == to {
            return Some(state);
        }
        if !visited.insert(current) {
            continue;
        }
        for (next, weight) in graph.neighbors(current) {
            if !visited.contains(next) {
                queue.push_back((next, step(state, weight)));
            }
        }
    }

    None
}

/// Convert `value` from one identifier to another.
///
/// Scalars are applied by multiplication and transforms by a direct call,
/// once per hop.
pub fn resolve(graph: &ConversionGraph, from: &UnitId, to: &UnitId, value: f64) -> Result<f64, ConversionError> {
    let result = search(graph, from, to, value, |v, w| w.apply(v));
    debug!(%from, %to, value, ?result, "resolved conversion");

    result.ok_or_else(|| ConversionError::NoConversionPath {
        from: from.to_string(),
        to: to.to_string(),
    })
}

/// Pure multiplicative factor between two identifiers, for use inside
/// combined units. A path through a transform edge has no factor.
pub fn resolve_factor(graph: &ConversionGraph, from: &UnitId, to: &UnitId) -> Result<f64, ConversionError> {
    let step = |factor: Option<f64>, weight: Weight| Some(factor? * weight.as_scalar()?);

    match search(graph, from, to, Some(1.0), step) {
        Some(Some(factor)) => Ok(factor),
        Some(None) => Err(ConversionError::NonScalarCombinedHop {
            from: from.to_string(),
            to: to.to_string(),
        }),
        None => Err(ConversionError::NoConversionPath {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}
