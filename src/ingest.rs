//! Ingestion of curve batches.
//!
//! File loaders run off the mutator thread and produce an immutable,
//! already-normalized batch; the mutator thread then applies it with one
//! `set_curve` per entry. Legacy status encodings are collapsed into the
//! status enum here, exactly once, so no other call site ever sees them.

use std::collections::BTreeMap;

use crate::models::curves::{Curve, CurvePoint, RawCurvePoint};
use crate::store::CurveStore;

/// Normalize raw loader points into core points.
pub fn normalize_points(raw: Vec<RawCurvePoint>) -> Vec<CurvePoint> {
    raw.into_iter().map(|p| p.normalize()).collect()
}

/// Parse a `{ "curveName": [point, ...] }` JSON document into a
/// normalized, sorted batch. Fails closed: a duplicate frame in any
/// curve rejects the whole batch.
pub fn parse_curve_batch(json: &str) -> Result<Vec<(String, Vec<CurvePoint>)>, String> {
    let raw: BTreeMap<String, Vec<RawCurvePoint>> =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse curve batch: {}", e))?;

    let mut batch = Vec::with_capacity(raw.len());
    for (name, points) in raw {
        let curve = Curve::from_points(normalize_points(points))
            .map_err(|e| format!("Curve '{}': {}", name, e))?;
        batch.push((name, curve.into_points()));
    }
    Ok(batch)
}

/// Apply a loaded batch on the mutator thread, one whole-curve replace
/// per entry.
pub fn apply_curve_batch(
    store: &mut CurveStore,
    batch: Vec<(String, Vec<CurvePoint>)>,
) -> Result<(), String> {
    for (name, points) in batch {
        store.set_curve(&name, points)?;
    }
    Ok(())
}
