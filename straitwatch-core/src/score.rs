//! Score aggregation - reduce active state to one bounded number

use crate::{ActiveState, Catalog};

/// Sum of all currently active weights
pub fn current_total(state: &ActiveState) -> f64 {
    state.values().map(|entry| entry.current_weight).sum()
}

/// Normalized risk score in 0..=100.
///
/// `round(100 * Σ current_weight / Σ catalog weight)`, or 0 for an empty
/// catalog. Bounded above because the engine clamps every current weight
/// to its catalog weight.
pub fn aggregate_score(catalog: &Catalog, state: &ActiveState) -> u32 {
    let total_possible = catalog.total_weight();
    if total_possible <= 0.0 {
        return 0;
    }
    (100.0 * current_total(state) / total_possible).round() as u32
}
