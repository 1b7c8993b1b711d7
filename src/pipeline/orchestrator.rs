//! Intake orchestrator — drives one message from mailbox to record.
//!
//! Flow per message:
//! 1. Fetch full detail
//! 2. Three-layer duplicate check (short-circuits to mark-processed)
//! 3. Download attachments
//! 4. Normalize attachments to text (blocking pool)
//! 5. AI field extraction
//! 6. Validate into a structured record
//! 7. Enrichment: vision, geocoding, uploads, relationships (each
//!    degrades on failure, never fails the message)
//! 8. Create the record
//! 9. Mark the message processed — strictly last, so a crash before
//!    create leaves the message to be retried next cycle
//!
//! Messages are isolated at the batch boundary: one failure increments
//! the error count and the batch continues.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::collaborators::records::properties;
use crate::collaborators::{
    FieldExtractor, Geocoder, MAX_GEOCODE_LOCATIONS, Mailbox, MatchConfidence, ObjectStore,
    RecordFilter, RecordSort, RecordStore, RelationshipDetector, VisionAnalyzer,
};
use crate::error::PipelineError;
use crate::model::{InboundMessage, StructuredRecord};
use crate::pipeline::dedup::{DedupLayer, Deduplicator};
use crate::pipeline::normalize::{AttachmentNormalizer, NormalizedContent};
use crate::pipeline::validate::RecordValidator;

/// Recent-record candidates offered to relationship detection.
const RELATED_RECORD_CANDIDATES: usize = 20;

/// Project candidates offered to relationship detection.
const RELATED_PROJECT_CANDIDATES: usize = 100;

/// Store-native status label marking a project as active.
const PROJECT_ACTIVE_STATUS: &str = "Active";

/// How one message left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new record was created.
    Persisted { record_id: String },
    /// An existing record already covers this message.
    Duplicate {
        record_id: String,
        layer: DedupLayer,
    },
}

/// Counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: u64,
    pub duplicates: u64,
    pub errors: u64,
}

/// Cumulative counts since start (or the last reset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub duplicates: u64,
    pub errors: u64,
}

/// The intake pipeline. One instance, shared collaborators, sequential
/// message processing inside each cycle.
pub struct IntakeOrchestrator {
    mailbox: Arc<dyn Mailbox>,
    extractor: Arc<dyn FieldExtractor>,
    vision: Arc<dyn VisionAnalyzer>,
    relationships: Arc<dyn RelationshipDetector>,
    geocoder: Arc<dyn Geocoder>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,

    dedup: Deduplicator,
    validator: RecordValidator,

    processed: AtomicU64,
    duplicates: AtomicU64,
    errors: AtomicU64,
}

impl IntakeOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        extractor: Arc<dyn FieldExtractor>,
        vision: Arc<dyn VisionAnalyzer>,
        relationships: Arc<dyn RelationshipDetector>,
        geocoder: Arc<dyn Geocoder>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let dedup = Deduplicator::new(Arc::clone(&records));
        Self {
            mailbox,
            extractor,
            vision,
            relationships,
            geocoder,
            objects,
            records,
            dedup,
            validator: RecordValidator::new(),
            processed: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// One full poll cycle: list new messages and process them.
    pub async fn run_cycle(&self) -> Result<BatchStats, PipelineError> {
        let ids = self.mailbox.list_new_message_ids().await?;
        if ids.is_empty() {
            debug!("No new messages");
            return Ok(BatchStats::default());
        }
        Ok(self.process_batch(&ids).await)
    }

    /// Process a batch of message ids. Each id is an isolation boundary:
    /// a failure is logged and counted, and the batch continues.
    pub async fn process_batch(&self, ids: &[String]) -> BatchStats {
        info!(count = ids.len(), "Processing message batch");

        let mut batch = BatchStats::default();
        for id in ids {
            match self.process_one(id).await {
                Ok(Outcome::Persisted { record_id }) => {
                    info!(id = %id, record_id = %record_id, "Message persisted");
                    batch.processed += 1;
                    self.processed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Outcome::Duplicate { record_id, layer }) => {
                    info!(
                        id = %id,
                        record_id = %record_id,
                        layer = layer.label(),
                        "Duplicate message skipped"
                    );
                    batch.duplicates += 1;
                    self.duplicates.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to process message");
                    batch.errors += 1;
                    self.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        info!(
            processed = batch.processed,
            duplicates = batch.duplicates,
            errors = batch.errors,
            "Batch complete"
        );
        batch
    }

    /// Drive one message through the full pipeline.
    pub async fn process_one(&self, id: &str) -> Result<Outcome, PipelineError> {
        let mut message = self.mailbox.get_message_detail(id).await?;
        info!(
            id = %message.message_id,
            sender = %message.sender_email,
            subject = %message.subject,
            "Processing inbound message"
        );

        if let Some(duplicate) = self.dedup.check_duplicate(&message).await {
            // Duplicates are marked processed too, or they would be
            // re-checked on every cycle forever.
            self.mailbox.mark_processed(&message.message_id).await?;
            return Ok(Outcome::Duplicate {
                record_id: duplicate.record.id,
                layer: duplicate.layer,
            });
        }

        let content = if message.has_attachments() {
            self.mailbox.download_attachments(&mut message).await?;
            self.normalize_attachments(&message).await?
        } else {
            NormalizedContent::default()
        };

        if !content.unsupported.is_empty() {
            warn!(
                id = %message.message_id,
                files = ?content.unsupported,
                "Some attachments could not be extracted"
            );
        }

        let raw = self
            .extractor
            .extract_fields(&message.subject, message.body_text(), &content.combined_text)
            .await;

        let mut record = self.validator.validate(raw, &message);
        self.enrich(&mut record, &message, &content).await;

        let persisted = self.records.create(&record).await?;

        // Strictly after create: an unmarked message is retried whole
        // next cycle, and the identity layer prevents a double record.
        self.mailbox.mark_processed(&message.message_id).await?;

        Ok(Outcome::Persisted {
            record_id: persisted.id,
        })
    }

    /// Snapshot of the cumulative counters.
    pub fn stats(&self) -> RunStats {
        RunStats {
            processed: self.processed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.processed.store(0, Ordering::Relaxed);
        self.duplicates.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    /// Run file-bound extraction on the blocking pool.
    async fn normalize_attachments(
        &self,
        message: &InboundMessage,
    ) -> Result<NormalizedContent, PipelineError> {
        let attachments = message.attachments.clone();
        tokio::task::spawn_blocking(move || AttachmentNormalizer::new().normalize(&attachments))
            .await
            .map_err(|e| PipelineError::Normalize(e.to_string()))
    }

    /// Fill the record's enrichment fields. Every step degrades on
    /// failure; none of them can fail the message.
    async fn enrich(
        &self,
        record: &mut StructuredRecord,
        message: &InboundMessage,
        content: &NormalizedContent,
    ) {
        if !content.images.is_empty() {
            match self.vision.analyze_images(&content.images).await {
                Ok(analysis) => record.attachment_analysis = analysis,
                Err(e) => {
                    warn!(id = %message.message_id, error = %e, "Vision analysis failed")
                }
            }
        }

        if !record.locations.is_empty() && self.geocoder.is_enabled() {
            let capped = &record.locations[..record.locations.len().min(MAX_GEOCODE_LOCATIONS)];
            match self.geocoder.geocode_all(capped).await {
                Ok(coordinates) => record.geocoded_coordinates = coordinates,
                Err(e) => warn!(id = %message.message_id, error = %e, "Geocoding failed"),
            }
        }

        if message.has_attachments() {
            match self.objects.upload_all(&message.attachments).await {
                Ok(urls) => {
                    let entries: Vec<serde_json::Value> = message
                        .attachments
                        .iter()
                        .filter_map(|a| {
                            urls.get(&a.filename)
                                .map(|url| json!({ "filename": a.filename, "url": url }))
                        })
                        .collect();
                    if !entries.is_empty() {
                        record.attachment_urls = serde_json::Value::Array(entries).to_string();
                    }
                }
                Err(e) => {
                    warn!(id = %message.message_id, error = %e, "Attachment upload failed")
                }
            }
        }

        self.detect_relationships(record, message).await;
    }

    /// Offer recent records and active projects to the relationship
    /// collaborator. A suggested project is honored only at high
    /// confidence.
    async fn detect_relationships(&self, record: &mut StructuredRecord, message: &InboundMessage) {
        let recent = match self
            .records
            .query(
                &[],
                &[RecordSort::descending(properties::DATE_RECEIVED)],
                RELATED_RECORD_CANDIDATES,
            )
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(id = %message.message_id, error = %e, "Candidate record query failed");
                return;
            }
        };

        let projects = match self
            .records
            .query_projects(
                &[RecordFilter::select_equals(
                    properties::STATUS,
                    PROJECT_ACTIVE_STATUS,
                )],
                &[],
                RELATED_PROJECT_CANDIDATES,
            )
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(id = %message.message_id, error = %e, "Project query failed");
                Vec::new()
            }
        };

        match self.relationships.find_related(record, &recent, &projects).await {
            Ok(matches) => {
                record.related_records = matches.related_ids;
                if matches.project_confidence == Some(MatchConfidence::High) {
                    record.related_project = matches.suggested_project;
                } else if matches.suggested_project.is_some() {
                    debug!(
                        id = %message.message_id,
                        confidence = ?matches.project_confidence,
                        "Project suggestion below confidence threshold, ignored"
                    );
                }
            }
            Err(e) => {
                warn!(id = %message.message_id, error = %e, "Relationship detection failed")
            }
        }
    }
}
