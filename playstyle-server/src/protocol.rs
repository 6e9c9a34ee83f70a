//! Wire messages exchanged with the game client.
//!
//! Every message is one JSON object whose `type` field selects its meaning.
//! Inbound objects are inspected loosely (extra fields are ignored); outbound
//! ones are serialized from the typed [`Response`] enum.

use std::collections::BTreeMap;

use playstyle_core::{AnalysisReport, SENTINEL_CODE};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, ServerError};

/// Acknowledgement text carried by every `GAME_STATE_ACK`.
pub const STATE_ACK_TEXT: &str = "State received";

/// Seconds since the Unix epoch, with sub-second precision.
#[must_use]
pub fn now_timestamp() -> f64 {
    let now = chrono::Utc::now();
    // Millisecond timestamps stay well inside f64's exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let millis = now.timestamp_millis() as f64;
    millis / 1000.0
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A recognized inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Liveness check.
    Ping,
    /// Informational state push from the game loop.
    GameState {
        /// Optional state payload, logged only.
        data: Option<Value>,
    },
    /// Trigger a full recomputation over the stored history.
    RequestAnalysis {
        /// Client-side hint of how many points it has recorded.
        data_points: Option<u64>,
    },
}

impl Request {
    /// The wire name of this request kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::GameState { .. } => "GAME_STATE",
            Self::RequestAnalysis { .. } => "REQUEST_ANALYSIS",
        }
    }
}

/// Parse one framed message.
///
/// # Errors
///
/// [`ServerError::Malformed`] if the text is not a JSON object,
/// [`ServerError::UnknownKind`] if its `type` is missing or unrecognized.
pub fn parse_request(text: &str) -> Result<Request> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ServerError::Malformed(e.to_string()))?;
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ServerError::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    let kind = match fields.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => return Err(ServerError::UnknownKind(other.to_string())),
        None => return Err(ServerError::UnknownKind("<missing>".to_string())),
    };

    match kind.as_str() {
        "PING" => Ok(Request::Ping),
        "GAME_STATE" => Ok(Request::GameState {
            data: fields.remove("data"),
        }),
        "REQUEST_ANALYSIS" => Ok(Request::RequestAnalysis {
            data_points: fields.get("data_points").and_then(Value::as_u64),
        }),
        _ => Err(ServerError::UnknownKind(kind)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Reply to `PING`.
    Pong {
        /// Seconds since epoch.
        timestamp: f64,
    },
    /// Reply to `GAME_STATE`.
    GameStateAck {
        /// Seconds since epoch.
        timestamp: f64,
        /// Always [`STATE_ACK_TEXT`].
        message: String,
    },
    /// Reply to `REQUEST_ANALYSIS`, degraded when analysis failed.
    AnalysisResult(AnalysisPayload),
}

impl Response {
    /// A `PONG` stamped now.
    #[must_use]
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: now_timestamp(),
        }
    }

    /// A `GAME_STATE_ACK` stamped now.
    #[must_use]
    pub fn state_ack() -> Self {
        Self::GameStateAck {
            timestamp: now_timestamp(),
            message: STATE_ACK_TEXT.to_string(),
        }
    }

    /// The wire name of this response kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pong { .. } => "PONG",
            Self::GameStateAck { .. } => "GAME_STATE_ACK",
            Self::AnalysisResult(_) => "ANALYSIS_RESULT",
        }
    }

    /// Serialize as a single newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Body of an `ANALYSIS_RESULT`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPayload {
    /// Seconds since epoch.
    pub timestamp: f64,
    /// Present only on a degraded result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Four-letter code, or `XXXX`.
    pub mbti: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Actions the classification was computed over.
    pub sample_size: u64,
    /// Per-trait scores, empty on a degraded result.
    pub traits: BTreeMap<String, f64>,
    /// Recorded play sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sessions: Option<u64>,
    /// Mean positive reaction time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_reaction_time_ms: Option<f64>,
}

impl AnalysisPayload {
    /// Payload for a successful analysis.
    #[must_use]
    pub fn from_report(report: &AnalysisReport) -> Self {
        let c = &report.classification;
        Self {
            timestamp: now_timestamp(),
            error: None,
            mbti: c.code.clone(),
            confidence: c.confidence,
            sample_size: c.sample_size,
            traits: c.traits.to_map(),
            total_sessions: Some(report.total_sessions),
            avg_reaction_time_ms: Some(report.avg_reaction_time_ms),
        }
    }

    /// Degraded payload carrying `error`.
    #[must_use]
    pub fn sentinel(error: impl Into<String>) -> Self {
        Self {
            timestamp: now_timestamp(),
            error: Some(error.into()),
            mbti: SENTINEL_CODE.to_string(),
            confidence: 0.0,
            sample_size: 0,
            traits: BTreeMap::new(),
            total_sessions: None,
            avg_reaction_time_ms: None,
        }
    }

    /// Whether this payload is the placeholder for a failed analysis.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.mbti == SENTINEL_CODE
    }
}
