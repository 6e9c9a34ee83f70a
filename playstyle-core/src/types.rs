//! Core type definitions shared by the store, scoring and classification.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Code returned when no classification could be computed.
pub const SENTINEL_CODE: &str = "XXXX";

/// Neutral value every score falls back to when its data is missing.
pub const NEUTRAL: f64 = 0.5;

// ---------------------------------------------------------------------------
// Event discriminants
// ---------------------------------------------------------------------------

/// Discriminated kind of a recorded player action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// A steering input.
    Move,
    /// A projectile fired.
    Shoot,
    /// Any other action label written by the game client.
    Other(String),
}

impl ActionKind {
    /// The label stored in the `action_type` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Move => "MOVE",
            Self::Shoot => "SHOOT",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for ActionKind {
    fn from(label: &str) -> Self {
        match label {
            "MOVE" => Self::Move,
            "SHOOT" => Self::Shoot,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trait scores
// ---------------------------------------------------------------------------

/// The four behavioral trait scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitScores {
    /// Combat frequency and disregard for accuracy.
    pub aggression: f64,
    /// Survival time and accuracy.
    pub caution: f64,
    /// Steering variety and map coverage.
    pub exploration: f64,
    /// Collection efficiency and reaction consistency.
    pub planning: f64,
}

impl TraitScores {
    /// All four traits at the neutral value.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            aggression: NEUTRAL,
            caution: NEUTRAL,
            exploration: NEUTRAL,
            planning: NEUTRAL,
        }
    }

    /// Trait name → score, in stable key order, for wire payloads.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("aggression".to_string(), self.aggression),
            ("caution".to_string(), self.caution),
            ("exploration".to_string(), self.exploration),
            ("planning".to_string(), self.planning),
        ])
    }
}

impl Default for TraitScores {
    fn default() -> Self {
        Self::neutral()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Per-axis blended scores the four letters are decided from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScores {
    /// E/I axis: mean of exploration and aggression.
    pub extraversion: f64,
    /// S/N axis: mean of caution and planning.
    pub sensing: f64,
    /// T/F axis: mean of aggression and planning.
    pub thinking: f64,
    /// J/P axis: planning alone.
    pub judging: f64,
}

impl AxisScores {
    /// The four axis scores in code order.
    #[must_use]
    pub fn as_array(&self) -> [f64; 4] {
        [self.extraversion, self.sensing, self.thinking, self.judging]
    }
}

/// A four-letter playstyle code with its supporting data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Four letters, one per axis: E/I, S/N, T/F, J/P.
    pub code: String,
    /// Blend of data sufficiency and score decisiveness, in `[0, 1]`.
    pub confidence: f64,
    /// The trait scores the code was derived from.
    pub traits: TraitScores,
    /// The intermediate axis scores.
    pub axes: AxisScores,
    /// Number of recorded actions backing the analysis.
    pub sample_size: u64,
}
