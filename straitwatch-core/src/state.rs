//! Active-indicator state and the decay/refresh engine
//!
//! The engine turns daily, noisy classifier output into a smooth
//! cumulative state:
//! - a re-triggered indicator snaps back to full catalog weight
//! - an untouched indicator decays geometrically each day
//! - an indicator decayed below the floor is evicted, not kept at ~0
//! - an indicator whose catalog entry disappeared is dropped
//!
//! `advance` is a pure fold: no I/O, no clock reads, no randomness.
//! Diagnostics are returned to the caller rather than logged from here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Catalog, DEFAULT_DECAY_FACTOR, DEFAULT_WEIGHT_FLOOR};

/// Errors from decay configuration
#[derive(Debug, Error)]
pub enum StateError {
    #[error("decay factor must be in (0, 1), got {0}")]
    InvalidDecayFactor(f64),

    #[error("weight floor must be positive and finite, got {0}")]
    InvalidWeightFloor(f64),
}

/// Decay parameters, passed explicitly into the engine
#[derive(Debug, Clone, Copy)]
pub struct DecayConfig {
    /// Daily multiplier applied to non-retriggered weights
    pub decay_factor: f64,
    /// Minimum current weight; anything decaying below it is evicted
    pub weight_floor: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            decay_factor: DEFAULT_DECAY_FACTOR,
            weight_floor: DEFAULT_WEIGHT_FLOOR,
        }
    }
}

impl DecayConfig {
    /// Construct a validated config
    pub fn new(decay_factor: f64, weight_floor: f64) -> Result<Self, StateError> {
        if !decay_factor.is_finite() || decay_factor <= 0.0 || decay_factor >= 1.0 {
            return Err(StateError::InvalidDecayFactor(decay_factor));
        }
        if !weight_floor.is_finite() || weight_floor <= 0.0 {
            return Err(StateError::InvalidWeightFloor(weight_floor));
        }
        Ok(Self {
            decay_factor,
            weight_floor,
        })
    }
}

/// Persisted per-indicator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveIndicatorState {
    /// Catalog weight at creation/refresh time
    pub base_weight: f64,

    /// Decaying weight, always in (0, base_weight]
    pub current_weight: f64,

    /// Date (UTC) of the most recent full refresh, not of creation
    pub triggered_on: NaiveDate,
}

impl ActiveIndicatorState {
    /// Fresh state at full strength
    pub fn triggered(weight: f64, date: NaiveDate) -> Self {
        Self {
            base_weight: weight,
            current_weight: weight,
            triggered_on: date,
        }
    }
}

/// Mapping from indicator id to its active state
pub type ActiveState = BTreeMap<String, ActiveIndicatorState>;

/// Result of one engine step: the next state plus diagnostics
#[derive(Debug, Clone, Default)]
pub struct AdvanceOutcome {
    /// Today's active-indicator mapping
    pub next: ActiveState,

    /// Ids evicted because decay took them below the floor
    pub evicted: Vec<String>,

    /// Ids dropped because their catalog entry no longer exists
    pub stale_dropped: Vec<String>,

    /// Triggered ids discarded because the catalog does not know them
    pub unknown_discarded: Vec<String>,
}

/// Compute today's state from yesterday's state and today's triggers.
///
/// For every previously-active id: drop it if stale, refresh it if
/// re-triggered, otherwise decay it (evicting below the floor with
/// `triggered_on` preserved). Newly triggered catalog ids are created at
/// full weight. Triggered ids absent from the catalog are discarded and
/// reported in the outcome.
pub fn advance(
    catalog: &Catalog,
    previous: &ActiveState,
    triggered_today: &BTreeSet<String>,
    today: NaiveDate,
    config: &DecayConfig,
) -> AdvanceOutcome {
    let mut outcome = AdvanceOutcome::default();

    for (id, prior) in previous {
        let Some(indicator) = catalog.get(id) else {
            outcome.stale_dropped.push(id.clone());
            continue;
        };

        if triggered_today.contains(id) {
            outcome.next.insert(
                id.clone(),
                ActiveIndicatorState::triggered(indicator.weight, today),
            );
        } else {
            let decayed = prior.current_weight * config.decay_factor;
            if decayed < config.weight_floor {
                outcome.evicted.push(id.clone());
            } else {
                // base_weight was copied from the catalog at refresh time
                // and may be stale; only a refresh re-reads the catalog
                outcome.next.insert(
                    id.clone(),
                    ActiveIndicatorState {
                        base_weight: prior.base_weight,
                        current_weight: decayed,
                        triggered_on: prior.triggered_on,
                    },
                );
            }
        }
    }

    for id in triggered_today {
        if outcome.next.contains_key(id) {
            continue;
        }
        match catalog.get(id) {
            Some(indicator) => {
                outcome.next.insert(
                    id.clone(),
                    ActiveIndicatorState::triggered(indicator.weight, today),
                );
            }
            None => outcome.unknown_discarded.push(id.clone()),
        }
    }

    outcome
}
