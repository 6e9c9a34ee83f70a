//! End-to-end analysis: open store → gather → score → classify.
//!
//! The [`Analyzer`] trait is the seam the socket service calls through. The
//! production implementation, [`SqliteAnalyzer`], opens the event database
//! read-only for the duration of a single call and releases it on return.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::classifier;
use crate::error::Result;
use crate::scoring::TraitInputs;
use crate::store::EventStore;
use crate::types::Classification;

/// Everything one analysis produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// The four-letter code, confidence, traits and sample size.
    pub classification: Classification,
    /// Recorded play sessions.
    pub total_sessions: u64,
    /// Mean positive reaction time in milliseconds, `0.0` without data.
    pub avg_reaction_time_ms: f64,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.classification;
        writeln!(f, "=== Player Behavior Analysis ===")?;
        writeln!(f, "Type:              {}", c.code)?;
        writeln!(f, "Confidence:        {:.2}%", c.confidence * 100.0)?;
        writeln!(f, "Total sessions:    {}", self.total_sessions)?;
        writeln!(f, "Total actions:     {}", c.sample_size)?;
        writeln!(f, "Avg reaction time: {:.1}ms", self.avg_reaction_time_ms)?;
        writeln!(f)?;
        writeln!(f, "Traits:")?;
        writeln!(f, "  aggression:  {:.2}", c.traits.aggression)?;
        writeln!(f, "  caution:     {:.2}", c.traits.caution)?;
        writeln!(f, "  exploration: {:.2}", c.traits.exploration)?;
        write!(f, "  planning:    {:.2}", c.traits.planning)
    }
}

/// Run the full pipeline over an open store.
///
/// # Errors
///
/// Returns [`crate::PlaystyleError::Database`] if any query fails.
pub fn analyze(store: &EventStore) -> Result<AnalysisReport> {
    let start = Instant::now();

    let inputs = TraitInputs::gather(store)?;
    let classification = classifier::classify(&inputs.scores(), inputs.sample_size());
    let report = AnalysisReport {
        classification,
        total_sessions: store.session_count()?,
        avg_reaction_time_ms: store.avg_reaction_time()?.unwrap_or(0.0),
    };

    info!(
        code = %report.classification.code,
        confidence = report.classification.confidence,
        sample_size = report.classification.sample_size,
        sessions = report.total_sessions,
        elapsed_ms = start.elapsed().as_millis(),
        "Analysis completed"
    );

    Ok(report)
}

/// Something that can produce an [`AnalysisReport`] on demand.
pub trait Analyzer: Send + Sync {
    /// Recompute the analysis from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PlaystyleError::StoreNotFound`] when there is no
    /// backing store, or another error when reading it fails.
    fn analyze(&self) -> Result<AnalysisReport>;
}

/// Analyzer over an SQLite event database on disk.
#[derive(Debug, Clone)]
pub struct SqliteAnalyzer {
    db_path: PathBuf,
}

impl SqliteAnalyzer {
    /// Analyze the database at `db_path` on every call.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// The database this analyzer reads.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl Analyzer for SqliteAnalyzer {
    fn analyze(&self) -> Result<AnalysisReport> {
        let store = EventStore::open(&self.db_path)?;
        analyze(&store)
    }
}
