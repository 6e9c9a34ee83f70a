//! # Playstyle Core Library
//!
//! Infers a four-letter playstyle code from the gameplay history a game
//! client records into SQLite.
//!
//! ```text
//! EventStore ──▶ TraitInputs ──▶ TraitScores ──▶ Classification
//!  (store)        (scoring)       (scoring)       (classifier)
//! ```
//!
//! - **Store**: read-only aggregates over sessions, actions, combat,
//!   collection and snapshot tables
//! - **Scoring**: aggression, caution, exploration and planning in `[0, 1]`
//! - **Classifier**: E/I, S/N, T/F, J/P letters plus a confidence value
//! - **Analysis**: the full pipeline behind the [`Analyzer`] seam
//!
//! Every analysis is a full recomputation; nothing is cached or written back.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod error;
pub mod schema;
pub mod scoring;
pub mod store;
pub mod types;

pub use analysis::{AnalysisReport, Analyzer, SqliteAnalyzer};
pub use config::PlaystyleConfig;
pub use error::PlaystyleError;
pub use store::EventStore;
pub use types::*;
