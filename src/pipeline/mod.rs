//! Intake pipeline: orchestration, dedup, normalization, validation.

pub mod dedup;
pub mod normalize;
pub mod orchestrator;
pub mod validate;

pub use dedup::{DedupLayer, Deduplicator, DuplicateMatch, content_hash, similarity};
pub use normalize::{AttachmentNormalizer, NormalizedContent};
pub use orchestrator::{BatchStats, IntakeOrchestrator, Outcome, RunStats};
pub use validate::RecordValidator;
