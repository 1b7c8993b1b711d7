//! AI collaborator contracts: field extraction, vision, relationships.

use async_trait::async_trait;

use crate::error::AiError;
use crate::model::{Attachment, ExtractionResult, PersistedProject, PersistedRecord,
    StructuredRecord};

/// Confidence the relationship collaborator reports for a project match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
}

/// Relationship-detection output.
#[derive(Debug, Clone, Default)]
pub struct RelatedMatches {
    /// Ids of persisted records related to the new one.
    pub related_ids: Vec<String>,
    /// Suggested parent project, if any.
    pub suggested_project: Option<String>,
    /// The collaborator honors `suggested_project` only when this is
    /// reported; the orchestrator requires `High`.
    pub project_confidence: Option<MatchConfidence>,
}

/// Structured field extraction from message text.
///
/// Infallible by contract: on internal failure the collaborator returns
/// [`ExtractionResult::degraded`] rather than an error.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_fields(
        &self,
        subject: &str,
        body: &str,
        attachment_text: &str,
    ) -> ExtractionResult;
}

/// Best-effort narrative analysis of image attachments.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze_images(&self, images: &[Attachment]) -> Result<String, AiError>;
}

/// Detects related records and a candidate parent project for a new
/// record.
#[async_trait]
pub trait RelationshipDetector: Send + Sync {
    async fn find_related(
        &self,
        record: &StructuredRecord,
        candidate_records: &[PersistedRecord],
        candidate_projects: &[PersistedProject],
    ) -> Result<RelatedMatches, AiError>;
}
