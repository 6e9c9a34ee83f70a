//! Property-Based Tests for trait scoring and classification.
//!
//! Uses `proptest` to check that the formulas stay inside their ranges no
//! matter what shape the aggregated data takes, including empty tables
//! (all-`None` aggregates) and inconsistent counts.

use proptest::prelude::*;

use playstyle_core::classifier;
use playstyle_core::scoring::{
    AggressionInputs, CautionInputs, ExplorationInputs, PlanningInputs, TraitInputs,
};
use playstyle_core::store::MoveStats;
use playstyle_core::types::TraitScores;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_rate() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0..=1.0f64)
}

fn arb_inputs() -> impl Strategy<Value = TraitInputs> {
    (
        (0..10_000u64, 0..10_000u64, arb_rate()),
        (prop::option::of(0.0..100_000.0f64), arb_rate()),
        (0..5_000u64, 0..5_000u64, 0..1_000u64),
        (
            prop::option::of(-1_000.0..100_000.0f64),
            prop::option::of(0.0..1_000.0f64),
            prop::option::of(0.0..10_000_000.0f64),
        ),
    )
        .prop_map(
            |((actions, combat, hit), (duration, hit2), (moves, changes, positions), (t, d, v))| {
                TraitInputs {
                    aggression: AggressionInputs {
                        total_actions: actions,
                        combat_events: combat,
                        hit_rate: hit,
                    },
                    caution: CautionInputs {
                        avg_session_duration: duration,
                        hit_rate: hit2,
                    },
                    exploration: ExplorationInputs {
                        moves: MoveStats {
                            moves,
                            direction_changes: changes.min(moves.saturating_sub(1)),
                        },
                        distinct_positions: positions,
                    },
                    planning: PlanningInputs {
                        avg_collection_time_ms: t,
                        avg_collection_distance: d,
                        reaction_variance: v,
                    },
                }
            },
        )
}

fn arb_traits() -> impl Strategy<Value = TraitScores> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(|(a, c, e, p)| {
        TraitScores {
            aggression: a,
            caution: c,
            exploration: e,
            planning: p,
        }
    })
}

fn in_unit(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn every_trait_score_is_bounded(inputs in arb_inputs()) {
        let s = inputs.scores();
        prop_assert!(in_unit(s.aggression), "aggression {}", s.aggression);
        prop_assert!(in_unit(s.caution), "caution {}", s.caution);
        prop_assert!(in_unit(s.exploration), "exploration {}", s.exploration);
        prop_assert!(in_unit(s.planning), "planning {}", s.planning);
    }

    #[test]
    fn exploration_neutral_below_ten_moves(
        moves in 0..10u64,
        changes in 0..10u64,
        positions in 0..10_000u64,
    ) {
        let inputs = ExplorationInputs {
            moves: MoveStats { moves, direction_changes: changes },
            distinct_positions: positions,
        };
        prop_assert_eq!(inputs.score(), 0.5);
    }

    #[test]
    fn classification_code_has_one_letter_per_axis(
        traits in arb_traits(),
        sample in 0..100_000u64,
    ) {
        let result = classifier::classify(&traits, sample);
        let letters: Vec<char> = result.code.chars().collect();
        prop_assert_eq!(letters.len(), 4);
        prop_assert!(matches!(letters[0], 'E' | 'I'));
        prop_assert!(matches!(letters[1], 'S' | 'N'));
        prop_assert!(matches!(letters[2], 'T' | 'F'));
        prop_assert!(matches!(letters[3], 'J' | 'P'));
    }

    #[test]
    fn confidence_is_bounded(traits in arb_traits(), sample in 0..100_000u64) {
        let result = classifier::classify(&traits, sample);
        prop_assert!(in_unit(result.confidence), "confidence {}", result.confidence);
    }

    #[test]
    fn classification_is_deterministic(traits in arb_traits(), sample in 0..1_000u64) {
        let a = classifier::classify(&traits, sample);
        let b = classifier::classify(&traits, sample);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn zero_sample_confidence_comes_only_from_decisiveness(traits in arb_traits()) {
        let result = classifier::classify(&traits, 0);
        prop_assert!(result.confidence <= 0.4 + 1e-12);
    }
}
