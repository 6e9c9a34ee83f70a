//! Trait scoring: aggregate event statistics into four `[0, 1]` scores.
//!
//! ```text
//! Aggression  = 0.7·(combat ÷ actions)            + 0.3·(1 − hit_rate)
//! Caution     = 0.6·min(avg_duration ÷ 300 s, 1)  + 0.4·hit_rate
//! Exploration = 0.5·(dir_changes ÷ moves)         + 0.5·min(positions ÷ 100, 1)
//! Planning    = 0.6·(1 − min(avg_collect ÷ 10 s, 1)) + 0.4·(1 − min(σ_reaction ÷ 500 ms, 1))
//! ```
//!
//! Each statistic is gathered from the [`EventStore`] into a plain inputs
//! struct first, so the formulas themselves are pure and total: a missing
//! aggregate selects the neutral value for its term, and every result is
//! clamped to `[0, 1]`. An aggregate of exactly zero counts as missing.

use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::store::{EventStore, MoveStats};
use crate::types::{NEUTRAL, TraitScores};

/// Weight of combat frequency in aggression.
pub const AGGRESSION_COMBAT_WEIGHT: f64 = 0.7;
/// Weight of inaccuracy in aggression.
pub const AGGRESSION_MISS_WEIGHT: f64 = 0.3;
/// Weight of survival time in caution.
pub const CAUTION_DURATION_WEIGHT: f64 = 0.6;
/// Weight of accuracy in caution.
pub const CAUTION_ACCURACY_WEIGHT: f64 = 0.4;
/// Session length (seconds) that saturates the duration term.
pub const FULL_DURATION_SECS: f64 = 300.0;
/// Weight of direction changes in exploration.
pub const EXPLORATION_TURN_WEIGHT: f64 = 0.5;
/// Weight of map coverage in exploration.
pub const EXPLORATION_COVERAGE_WEIGHT: f64 = 0.5;
/// Distinct positions that saturate the coverage term.
pub const FULL_COVERAGE_POSITIONS: f64 = 100.0;
/// Below this many MOVE actions exploration is reported as neutral.
pub const MIN_MOVES_FOR_EXPLORATION: u64 = 10;
/// Weight of collection efficiency in planning.
pub const PLANNING_EFFICIENCY_WEIGHT: f64 = 0.6;
/// Weight of reaction consistency in planning.
pub const PLANNING_CONSISTENCY_WEIGHT: f64 = 0.4;
/// Collection time (ms) at which efficiency reaches zero.
pub const SLOWEST_COLLECTION_MS: f64 = 10_000.0;
/// Reaction-time standard deviation (ms) at which consistency reaches zero.
pub const WIDEST_REACTION_STD_MS: f64 = 500.0;

/// `None` for an aggregate that is absent or exactly zero.
fn recorded(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.abs() > 0.0)
}

/// Clamp to `[0, 1]`; a NaN collapses to neutral.
fn unit(x: f64) -> f64 {
    if x.is_nan() { NEUTRAL } else { x.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Aggression
// ---------------------------------------------------------------------------

/// Statistics behind the aggression score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggressionInputs {
    /// All recorded actions.
    pub total_actions: u64,
    /// All recorded combat events.
    pub combat_events: u64,
    /// Fraction of combat events that hit.
    pub hit_rate: Option<f64>,
}

impl AggressionInputs {
    /// Aggression in `[0, 1]`; neutral with no recorded actions.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.total_actions == 0 {
            return NEUTRAL;
        }
        #[allow(clippy::cast_precision_loss)]
        let combat_ratio = self.combat_events as f64 / self.total_actions as f64;
        let hit_rate = unit(recorded(self.hit_rate).unwrap_or(NEUTRAL));

        unit(AGGRESSION_COMBAT_WEIGHT * combat_ratio + AGGRESSION_MISS_WEIGHT * (1.0 - hit_rate))
    }
}

// ---------------------------------------------------------------------------
// Caution
// ---------------------------------------------------------------------------

/// Statistics behind the caution score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CautionInputs {
    /// Mean positive session duration in seconds.
    pub avg_session_duration: Option<f64>,
    /// Fraction of combat events that hit.
    pub hit_rate: Option<f64>,
}

impl CautionInputs {
    /// Caution in `[0, 1]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        let duration = recorded(self.avg_session_duration)
            .map_or(NEUTRAL, |secs| unit(secs / FULL_DURATION_SECS));
        let hit_rate = unit(recorded(self.hit_rate).unwrap_or(NEUTRAL));

        unit(CAUTION_DURATION_WEIGHT * duration + CAUTION_ACCURACY_WEIGHT * hit_rate)
    }
}

// ---------------------------------------------------------------------------
// Exploration
// ---------------------------------------------------------------------------

/// Statistics behind the exploration score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExplorationInputs {
    /// Ordered MOVE statistics.
    pub moves: MoveStats,
    /// Distinct head positions seen in snapshots.
    pub distinct_positions: u64,
}

impl ExplorationInputs {
    /// Exploration in `[0, 1]`; exactly neutral below
    /// [`MIN_MOVES_FOR_EXPLORATION`] moves.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        if self.moves.moves < MIN_MOVES_FOR_EXPLORATION {
            return NEUTRAL;
        }
        let turn_ratio = self.moves.direction_changes as f64 / self.moves.moves as f64;
        let coverage = if self.distinct_positions == 0 {
            NEUTRAL
        } else {
            unit(self.distinct_positions as f64 / FULL_COVERAGE_POSITIONS)
        };

        unit(EXPLORATION_TURN_WEIGHT * turn_ratio + EXPLORATION_COVERAGE_WEIGHT * coverage)
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Statistics behind the planning score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanningInputs {
    /// Mean milliseconds to collect a resource.
    pub avg_collection_time_ms: Option<f64>,
    /// Mean distance traveled to a resource.
    pub avg_collection_distance: Option<f64>,
    /// Population variance of reaction time, ms².
    pub reaction_variance: Option<f64>,
}

impl PlanningInputs {
    /// Collection efficiency; neutral unless both time and distance are non-zero.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        match (
            recorded(self.avg_collection_time_ms),
            recorded(self.avg_collection_distance),
        ) {
            (Some(ms), Some(_)) => 1.0 - unit(ms / SLOWEST_COLLECTION_MS),
            _ => NEUTRAL,
        }
    }

    /// Reaction consistency; neutral without reaction data.
    #[must_use]
    pub fn consistency(&self) -> f64 {
        recorded(self.reaction_variance).map_or(NEUTRAL, |variance| {
            let std_dev = variance.max(0.0).sqrt();
            1.0 - unit(std_dev / WIDEST_REACTION_STD_MS)
        })
    }

    /// Planning in `[0, 1]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        unit(
            PLANNING_EFFICIENCY_WEIGHT * self.efficiency()
                + PLANNING_CONSISTENCY_WEIGHT * self.consistency(),
        )
    }
}

// ---------------------------------------------------------------------------
// All traits
// ---------------------------------------------------------------------------

/// Every statistic the four scores need, gathered in one pass over the store.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TraitInputs {
    /// Aggression statistics.
    pub aggression: AggressionInputs,
    /// Caution statistics.
    pub caution: CautionInputs,
    /// Exploration statistics.
    pub exploration: ExplorationInputs,
    /// Planning statistics.
    pub planning: PlanningInputs,
}

impl TraitInputs {
    /// Query every aggregate from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::Database`] if any query fails.
    pub fn gather(store: &EventStore) -> Result<Self> {
        let start = Instant::now();

        let hit_rate = store.hit_rate()?;
        let collection = store.collection_averages()?;

        let inputs = Self {
            aggression: AggressionInputs {
                total_actions: store.action_count()?,
                combat_events: store.combat_count()?,
                hit_rate,
            },
            caution: CautionInputs {
                avg_session_duration: store.avg_session_duration()?,
                hit_rate,
            },
            exploration: ExplorationInputs {
                moves: store.move_stats()?,
                distinct_positions: store.distinct_head_positions()?,
            },
            planning: PlanningInputs {
                avg_collection_time_ms: collection.avg_time_ms,
                avg_collection_distance: collection.avg_distance,
                reaction_variance: store.reaction_time_variance()?,
            },
        };

        debug!(
            actions = inputs.aggression.total_actions,
            combat = inputs.aggression.combat_events,
            moves = inputs.exploration.moves.moves,
            positions = inputs.exploration.distinct_positions,
            elapsed_us = start.elapsed().as_micros(),
            "Gathered trait inputs"
        );

        Ok(inputs)
    }

    /// Number of recorded actions, the analysis sample size.
    #[must_use]
    pub fn sample_size(&self) -> u64 {
        self.aggression.total_actions
    }

    /// Evaluate all four formulas.
    #[must_use]
    pub fn scores(&self) -> TraitScores {
        TraitScores {
            aggression: self.aggression.score(),
            caution: self.caution.score(),
            exploration: self.exploration.score(),
            planning: self.planning.score(),
        }
    }
}

/// Gather inputs from `store` and score them.
///
/// # Errors
///
/// Returns [`crate::PlaystyleError::Database`] if any query fails.
pub fn compute_traits(store: &EventStore) -> Result<TraitScores> {
    Ok(TraitInputs::gather(store)?.scores())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn aggression_neutral_without_actions() {
        let inputs = AggressionInputs {
            total_actions: 0,
            combat_events: 5,
            hit_rate: Some(0.0),
        };
        assert!(approx(inputs.score(), NEUTRAL));
    }

    #[test]
    fn aggression_formula() {
        let inputs = AggressionInputs {
            total_actions: 100,
            combat_events: 20,
            hit_rate: Some(0.25),
        };
        // 0.7·0.2 + 0.3·0.75
        assert!(approx(inputs.score(), 0.14 + 0.225));
    }

    #[test]
    fn aggression_null_hit_rate_is_neutral_term() {
        let inputs = AggressionInputs {
            total_actions: 10,
            combat_events: 0,
            hit_rate: None,
        };
        assert!(approx(inputs.score(), 0.15));
    }

    #[test]
    fn aggression_clamps_excess_combat() {
        let inputs = AggressionInputs {
            total_actions: 1,
            combat_events: 50,
            hit_rate: Some(0.0),
        };
        assert!(approx(inputs.score(), 1.0));
    }

    #[test]
    fn caution_duration_saturates() {
        let long = CautionInputs {
            avg_session_duration: Some(900.0),
            hit_rate: Some(1.0),
        };
        assert!(approx(long.score(), 1.0));

        let short = CautionInputs {
            avg_session_duration: Some(150.0),
            hit_rate: Some(0.5),
        };
        assert!(approx(short.score(), 0.6 * 0.5 + 0.4 * 0.5));
    }

    #[test]
    fn caution_missing_everything_is_neutral() {
        assert!(approx(CautionInputs::default().score(), NEUTRAL));
    }

    #[test]
    fn exploration_short_circuits_below_ten_moves() {
        let inputs = ExplorationInputs {
            moves: MoveStats {
                moves: 9,
                direction_changes: 8,
            },
            distinct_positions: 1000,
        };
        assert!(approx(inputs.score(), NEUTRAL));
    }

    #[test]
    fn exploration_formula() {
        let inputs = ExplorationInputs {
            moves: MoveStats {
                moves: 10,
                direction_changes: 4,
            },
            distinct_positions: 50,
        };
        assert!(approx(inputs.score(), 0.5 * 0.4 + 0.5 * 0.5));
    }

    #[test]
    fn exploration_without_snapshots_uses_neutral_coverage() {
        let inputs = ExplorationInputs {
            moves: MoveStats {
                moves: 20,
                direction_changes: 0,
            },
            distinct_positions: 0,
        };
        assert!(approx(inputs.score(), 0.25));
    }

    #[test]
    fn planning_terms() {
        let inputs = PlanningInputs {
            avg_collection_time_ms: Some(2_500.0),
            avg_collection_distance: Some(5.0),
            reaction_variance: Some(100.0 * 100.0),
        };
        assert!(approx(inputs.efficiency(), 0.75));
        assert!(approx(inputs.consistency(), 0.8));
        assert!(approx(inputs.score(), 0.6 * 0.75 + 0.4 * 0.8));
    }

    #[test]
    fn planning_needs_distance_for_efficiency() {
        let inputs = PlanningInputs {
            avg_collection_time_ms: Some(0.0),
            avg_collection_distance: None,
            reaction_variance: None,
        };
        assert!(approx(inputs.efficiency(), NEUTRAL));
        assert!(approx(inputs.score(), NEUTRAL));
    }

    #[test]
    fn zero_variance_counts_as_missing() {
        let inputs = PlanningInputs {
            reaction_variance: Some(0.0),
            ..PlanningInputs::default()
        };
        assert!(approx(inputs.consistency(), NEUTRAL));
    }

    #[test]
    fn zero_hit_rate_counts_as_missing() {
        let inputs = AggressionInputs {
            total_actions: 100,
            combat_events: 10,
            hit_rate: Some(0.0),
        };
        // 0.7·0.1 + 0.3·0.5
        assert!(approx(inputs.score(), 0.22));

        let caution = CautionInputs {
            avg_session_duration: Some(150.0),
            hit_rate: Some(0.0),
        };
        assert!(approx(caution.score(), 0.5));
    }

    #[test]
    fn zero_duration_counts_as_missing() {
        let inputs = CautionInputs {
            avg_session_duration: Some(0.0),
            hit_rate: Some(1.0),
        };
        assert!(approx(inputs.score(), 0.6 * 0.5 + 0.4));
    }

    #[test]
    fn zero_collection_distance_makes_efficiency_neutral() {
        let inputs = PlanningInputs {
            avg_collection_time_ms: Some(2_000.0),
            avg_collection_distance: Some(0.0),
            reaction_variance: Some(0.0),
        };
        assert!(approx(inputs.efficiency(), NEUTRAL));
        assert!(approx(inputs.score(), NEUTRAL));
    }

    #[test]
    fn nan_input_collapses_to_neutral() {
        assert!(approx(unit(f64::NAN), NEUTRAL));
        let inputs = CautionInputs {
            avg_session_duration: Some(f64::NAN),
            hit_rate: Some(f64::NAN),
        };
        assert!(approx(inputs.score(), NEUTRAL));
    }

    #[test]
    fn default_inputs_score_all_neutral() {
        assert_eq!(TraitInputs::default().scores(), TraitScores::neutral());
    }
}
