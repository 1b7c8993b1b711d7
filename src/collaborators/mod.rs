//! Narrow contracts for external systems.
//!
//! The pipeline core never talks to a network or a provider SDK
//! directly; everything outside the process is reached through these
//! traits. Implementations live in deployment crates.

pub mod ai;
pub mod geocode;
pub mod mailbox;
pub mod records;
pub mod storage;

pub use ai::{FieldExtractor, MatchConfidence, RelatedMatches, RelationshipDetector,
    VisionAnalyzer};
pub use geocode::{Geocoder, MAX_GEOCODE_LOCATIONS};
pub use mailbox::Mailbox;
pub use records::{FilterOp, PropertyKind, RecordFilter, RecordSort, RecordStore};
pub use storage::ObjectStore;
