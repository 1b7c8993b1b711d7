//! Core data model for the intake pipeline.

pub mod message;
pub mod record;

pub use message::{Attachment, InboundMessage};
pub use record::{
    ActionRequired, ExtractionResult, PersistedProject, PersistedRecord, Priority,
    ProcessingStatus, ProjectType, RecordStatus, StructuredRecord,
};
