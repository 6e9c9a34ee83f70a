//! Four-letter classification from trait scores.
//!
//! | Axis | Score                        | Letter if above threshold | Threshold |
//! |------|------------------------------|---------------------------|-----------|
//! | E/I  | mean(exploration, aggression) | E                        | 0.5       |
//! | S/N  | mean(caution, planning)       | S                        | 0.5       |
//! | T/F  | mean(aggression, planning)    | T                        | 0.5       |
//! | J/P  | planning                      | J                        | 0.6       |
//!
//! Confidence blends how much data backs the analysis with how far the axis
//! scores sit from the undecided midpoint.

use crate::types::{AxisScores, Classification, TraitScores};

/// Decision threshold shared by the E/I, S/N and T/F axes.
pub const AXIS_THRESHOLD: f64 = 0.5;
/// Decision threshold of the J/P axis. Stricter than the others on purpose.
pub const JUDGING_THRESHOLD: f64 = 0.6;
/// Action count at which the data-sufficiency term saturates.
pub const FULL_CONFIDENCE_ACTIONS: f64 = 200.0;
/// Weight of data sufficiency in confidence.
pub const DATA_CONFIDENCE_WEIGHT: f64 = 0.6;
/// Weight of score decisiveness in confidence.
pub const SCORE_CONFIDENCE_WEIGHT: f64 = 0.4;

/// Blend trait scores into the four axis scores.
#[must_use]
pub fn axis_scores(traits: &TraitScores) -> AxisScores {
    AxisScores {
        extraversion: (traits.exploration + traits.aggression) / 2.0,
        sensing: (traits.caution + traits.planning) / 2.0,
        thinking: (traits.aggression + traits.planning) / 2.0,
        judging: traits.planning,
    }
}

/// The four-letter code for a set of axis scores.
#[must_use]
pub fn code_for(axes: &AxisScores) -> String {
    let pick = |score: f64, threshold: f64, above: char, below: char| {
        if score > threshold { above } else { below }
    };

    [
        pick(axes.extraversion, AXIS_THRESHOLD, 'E', 'I'),
        pick(axes.sensing, AXIS_THRESHOLD, 'S', 'N'),
        pick(axes.thinking, AXIS_THRESHOLD, 'T', 'F'),
        pick(axes.judging, JUDGING_THRESHOLD, 'J', 'P'),
    ]
    .into_iter()
    .collect()
}

/// Confidence in `[0, 1]` for a classification over `sample_size` actions.
#[must_use]
pub fn confidence(axes: &AxisScores, sample_size: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let data = (sample_size as f64 / FULL_CONFIDENCE_ACTIONS).min(1.0);
    let decisiveness = axes
        .as_array()
        .iter()
        .map(|score| (score - 0.5).abs() * 2.0)
        .sum::<f64>()
        / 4.0;

    (DATA_CONFIDENCE_WEIGHT * data + SCORE_CONFIDENCE_WEIGHT * decisiveness).clamp(0.0, 1.0)
}

/// Classify a trait score set computed over `sample_size` actions.
#[must_use]
pub fn classify(traits: &TraitScores, sample_size: u64) -> Classification {
    let axes = axis_scores(traits);
    Classification {
        code: code_for(&axes),
        confidence: confidence(&axes, sample_size),
        traits: *traits,
        axes,
        sample_size,
    }
}
