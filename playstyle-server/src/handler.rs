//! Dispatch of parsed messages to responses.
//!
//! Handling a `REQUEST_ANALYSIS` has three phases: read the request,
//! compute on the blocking pool, build the response. The connection task
//! awaits the whole sequence, so responses stay in request order.

use std::sync::Arc;

use playstyle_core::{AnalysisReport, Analyzer};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};
use crate::metrics::ServiceCounters;
use crate::protocol::{self, AnalysisPayload, Request, Response};

/// Turns message text into responses.
#[derive(Clone)]
pub struct MessageHandler {
    analyzer: Arc<dyn Analyzer>,
    counters: Arc<ServiceCounters>,
}

impl std::fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandler").finish_non_exhaustive()
    }
}

impl MessageHandler {
    /// Create a handler backed by `analyzer`.
    #[must_use]
    pub fn new(analyzer: Arc<dyn Analyzer>, counters: Arc<ServiceCounters>) -> Self {
        Self { analyzer, counters }
    }

    /// Counters shared with the service.
    #[must_use]
    pub fn counters(&self) -> &Arc<ServiceCounters> {
        &self.counters
    }

    /// Parse and answer one framed message.
    ///
    /// # Errors
    ///
    /// Returns a message-class error for malformed or unknown messages. The
    /// caller logs it and moves on to the next message.
    pub async fn handle_line(&self, line: &str) -> Result<Response> {
        let request = protocol::parse_request(line).inspect_err(|e| self.record_rejection(e))?;
        debug!(kind = request.kind(), "Dispatching message");
        let response = self.respond(request).await;
        ServiceCounters::bump(&self.counters.messages_dispatched);
        Ok(response)
    }

    /// Count a message-class failure raised before dispatch.
    pub fn record_rejection(&self, error: &ServerError) {
        let counter = match error {
            ServerError::UnknownKind(_) => &self.counters.unknown_messages,
            _ => &self.counters.malformed_messages,
        };
        ServiceCounters::bump(counter);
    }

    /// Answer a parsed request. Never fails.
    pub async fn respond(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::pong(),
            Request::GameState { data } => {
                if let Some(data) = data {
                    debug!(%data, "Game state received");
                }
                Response::state_ack()
            }
            Request::RequestAnalysis { data_points } => {
                info!(?data_points, "Analysis requested");
                let payload = match self.run_analysis().await {
                    Ok(report) => {
                        ServiceCounters::bump(&self.counters.analyses_completed);
                        AnalysisPayload::from_report(&report)
                    }
                    Err(e) => {
                        ServiceCounters::bump(&self.counters.analyses_failed);
                        warn!(error = %e, "Analysis failed; returning sentinel result");
                        AnalysisPayload::sentinel(e.client_text())
                    }
                };
                Response::AnalysisResult(payload)
            }
        }
    }

    async fn run_analysis(&self) -> Result<AnalysisReport> {
        let analyzer = Arc::clone(&self.analyzer);
        tokio::task::spawn_blocking(move || analyzer.analyze())
            .await
            .map_err(|e| ServerError::AnalysisAborted(e.to_string()))?
            .map_err(ServerError::from)
    }
}
