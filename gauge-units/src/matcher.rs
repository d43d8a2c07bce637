//! Combined-unit factors by structural matching
//!
//! Two expressions are comparable only if their trees have the same shape
//! and the same operator at every internal node. The factor is computed by
//! recursing corresponding subtrees:
//! - `(A * B) -> (C * D)`: `(C/A) * (D/B)`
//! - `(A / B) -> (C / D)`: `(C/A) / (D/B)`

use crate::error::ConversionError;
use crate::expr::{UnitExpr, UnitOp};
use crate::graph::ConversionGraph;
use crate::names::{normalize, NameMapping};
use crate::resolve::resolve_factor;

/// Multiplicative factor from `from` to `to`
pub fn factor(
    graph: &ConversionGraph,
    names: &NameMapping,
    from: &UnitExpr,
    to: &UnitExpr,
) -> Result<f64, ConversionError> {
    match (from, to) {
        (UnitExpr::Unit(a), UnitExpr::Unit(b)) => leaf_factor(graph, names, a, b),

        (UnitExpr::Binary(fl, fop, fr), UnitExpr::Binary(tl, top, tr)) if fop == top => {
            let left = factor(graph, names, fl, tl)?;
            let right = factor(graph, names, fr, tr)?;
            Ok(match fop {
                UnitOp::Mul => left * right,
                UnitOp::Div => left / right,
            })
        }

        _ => Err(ConversionError::StructureMismatch {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

fn leaf_factor(graph: &ConversionGraph, names: &NameMapping, from: &str, to: &str) -> Result<f64, ConversionError> {
    if from.to_lowercase() == to.to_lowercase() {
        return Ok(1.0);
    }

    let from_id = normalize(from, names)
        .filter(|id| graph.contains(id))
        .ok_or_else(|| ConversionError::unknown_unit(from))?;
    let to_id = normalize(to, names)
        .filter(|id| graph.contains(id))
        .ok_or_else(|| ConversionError::unknown_unit(to))?;

    resolve_factor(graph, &from_id, &to_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_graph;
    use crate::expr::parse_unit_expr;

    fn run(from: &str, to: &str) -> Result<f64, ConversionError> {
        let graph = builtin_graph().unwrap();
        let names = NameMapping::build(&graph);
        let from = parse_unit_expr(from).unwrap();
        let to = parse_unit_expr(to).unwrap();
        factor(&graph, &names, &from, &to)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_ratio() {
        let f = run("mi/h", "m/s").unwrap();
        assert!(close(f * 10.0, 4.4704), "got {}", f * 10.0);
    }

    #[test]
    fn test_product() {
        let f = run("ft*lb", "m*kg").unwrap();
        assert!((f - 0.1382549544).abs() / 0.1382549544 < 1e-5, "got {}", f);
    }

    #[test]
    fn test_structural_laws() {
        let ac = run("ft", "m").unwrap();
        let bd = run("h", "s").unwrap();
        assert!(close(run("ft*h", "m*s").unwrap(), ac * bd));
        assert!(close(run("ft/h", "m/s").unwrap(), ac / bd));
    }

    #[test]
    fn test_nested() {
        let f = run("(ft*in)/h", "(m*cm)/s").unwrap();
        let expected = 0.3048 * 2.54 / 3600.0;
        assert!(close(f, expected), "got {} want {}", f, expected);
    }

    #[test]
    fn test_same_leaf_any_case() {
        assert_eq!(run("KM/h", "km/H").unwrap(), 1.0);
    }

    #[test]
    fn test_operator_mismatch() {
        let err = run("ft*lb", "m/kg").unwrap_err();
        assert!(matches!(err, ConversionError::StructureMismatch { .. }));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = run("(ft*lb)/h", "m/s").unwrap_err();
        assert!(matches!(err, ConversionError::StructureMismatch { .. }));
    }

    #[test]
    fn test_temperature_inside_combined() {
        let err = run("c/h", "f/h").unwrap_err();
        assert!(matches!(err, ConversionError::NonScalarCombinedHop { .. }));
    }

    #[test]
    fn test_unknown_leaf() {
        let err = run("bogus/h", "m/s").unwrap_err();
        assert!(matches!(err, ConversionError::UnknownUnit { ref unit, .. } if unit == "bogus"));
    }

    #[test]
    fn test_cross_category_leaf() {
        let err = run("mi/h", "s/m").unwrap_err();
        assert!(matches!(err, ConversionError::NoConversionPath { .. }));
    }
}
