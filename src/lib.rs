// src/lib.rs
// Public library surface for the CLI binary and integration tests.

pub mod aggregate;
pub mod candidate;
pub mod config;
pub mod fetch;
pub mod parse;
pub mod paths;
pub mod pipeline;
pub mod prefs;
pub mod queue;
pub mod run_id;
pub mod scoring;
pub mod selection;
pub mod snapshot;
pub mod table;

// ---- Re-exports for stable public API ----
pub use candidate::{Candidate, Metrics};
pub use config::AppConfig;
pub use queue::QueueRecord;
pub use run_id::RunId;
pub use scoring::{ScoreThresholds, ScoredIdea};
