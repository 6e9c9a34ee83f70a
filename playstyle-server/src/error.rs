//! Server error types, grouped by how far a failure is allowed to reach.

use std::path::PathBuf;

use playstyle_core::PlaystyleError;
use thiserror::Error;

/// How far a failure propagates before it is absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The service cannot start; the process exits non-zero.
    Startup,
    /// The active connection ends; the accept loop continues.
    Session,
    /// The offending message is dropped; the connection continues.
    Message,
    /// The client receives a degraded analysis result.
    Analysis,
}

/// Errors produced by the socket service.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Every port in the scan window refused an exclusive bind.
    #[error("No available port in {host}:{first}-{last}")]
    PortsExhausted {
        /// Host the bind was attempted on.
        host: String,
        /// First port tried.
        first: u16,
        /// Last port tried.
        last: u16,
    },

    /// The bound listener could not be registered with the runtime.
    #[error("Listener setup failed: {0}")]
    Listener(#[source] std::io::Error),

    /// The port discovery file could not be written.
    #[error("Failed to publish port file {}: {source}", .path.display())]
    PortFile {
        /// Where the file was to be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the active connection failed.
    #[error("Connection I/O error: {0}")]
    Connection(#[from] std::io::Error),

    /// A frame was not a JSON object in UTF-8.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// A frame grew past the configured limit without a delimiter.
    #[error("Frame exceeds the {limit}-byte limit")]
    Oversized {
        /// Configured maximum.
        limit: usize,
    },

    /// A well-formed message carried an unrecognized `type`.
    #[error("Unknown message type: {0}")]
    UnknownKind(String),

    /// The analysis pipeline failed.
    #[error("Analysis failed: {0}")]
    Analysis(#[from] PlaystyleError),

    /// The blocking analysis task panicked or was cancelled.
    #[error("Analysis task aborted: {0}")]
    AnalysisAborted(String),

    /// A response could not be serialized.
    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ServerError {
    /// The propagation class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PortsExhausted { .. } | Self::Listener(_) | Self::PortFile { .. } => {
                ErrorClass::Startup
            }
            Self::Connection(_) => ErrorClass::Session,
            Self::Malformed(_)
            | Self::Oversized { .. }
            | Self::UnknownKind(_)
            | Self::Encode(_) => ErrorClass::Message,
            Self::Analysis(_) | Self::AnalysisAborted(_) => ErrorClass::Analysis,
        }
    }

    /// Whether the active connection must end. Message and analysis errors
    /// are absorbed where they occur.
    #[must_use]
    pub fn ends_session(&self) -> bool {
        matches!(self.class(), ErrorClass::Startup | ErrorClass::Session)
    }

    /// Text placed in the `error` field of a degraded analysis result.
    #[must_use]
    pub fn client_text(&self) -> String {
        match self {
            Self::Analysis(e) if e.is_store_missing() => "Database not found".to_string(),
            Self::Analysis(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ServerError>;
