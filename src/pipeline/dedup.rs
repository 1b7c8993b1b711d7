//! Three-layer deduplication engine.
//!
//! Layers run in strictly increasing cost order and short-circuit on the
//! first hit:
//!
//! 1. Identity — point lookup of the provider message id.
//! 2. Subject/date — fuzzy subject match against records from the prior
//!    24 hours.
//! 3. Content hash — exact lookup of a SHA-256 content hash, with a
//!    same-sender body/summary similarity fallback for records persisted
//!    before hashes were stored.
//!
//! Every layer fails closed: a query error is logged and treated as "no
//! match at this layer", so a store outage re-processes rather than
//! drops messages.

use std::sync::Arc;

use chrono::Duration;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::collaborators::records::properties;
use crate::collaborators::{RecordFilter, RecordStore};
use crate::model::{InboundMessage, PersistedRecord};

/// Subject similarity threshold for layer 2.
const SUBJECT_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Body/summary similarity threshold for the layer-3 fallback.
const CONTENT_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Candidate cap for the 24-hour subject window.
const SUBJECT_WINDOW_LIMIT: usize = 50;

/// Candidate cap for the 7-day content window.
const CONTENT_WINDOW_LIMIT: usize = 100;

/// Which layer produced a duplicate match. Observability only — the
/// pipeline skips the message either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupLayer {
    Identity,
    SubjectDate,
    ContentHash,
}

impl DedupLayer {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::SubjectDate => "subject_date",
            Self::ContentHash => "content_hash",
        }
    }
}

/// A duplicate hit: the existing record plus the layer that found it.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub record: PersistedRecord,
    pub layer: DedupLayer,
}

/// Deduplication engine over the record store.
pub struct Deduplicator {
    records: Arc<dyn RecordStore>,
}

impl Deduplicator {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Check whether a message has already been recorded.
    pub async fn check_duplicate(&self, message: &InboundMessage) -> Option<DuplicateMatch> {
        if let Some(record) = self.check_message_id(message).await {
            debug!(
                id = %message.message_id,
                record_id = %record.id,
                "Duplicate detected (layer 1, message id)"
            );
            return Some(DuplicateMatch {
                record,
                layer: DedupLayer::Identity,
            });
        }

        if let Some(record) = self.check_subject_date(message).await {
            debug!(
                id = %message.message_id,
                record_id = %record.id,
                "Duplicate detected (layer 2, subject+date)"
            );
            return Some(DuplicateMatch {
                record,
                layer: DedupLayer::SubjectDate,
            });
        }

        if let Some(record) = self.check_content(message).await {
            debug!(
                id = %message.message_id,
                record_id = %record.id,
                "Duplicate detected (layer 3, content)"
            );
            return Some(DuplicateMatch {
                record,
                layer: DedupLayer::ContentHash,
            });
        }

        debug!(id = %message.message_id, "No duplicate found");
        None
    }

    /// Layer 1: exact provider-id lookup.
    async fn check_message_id(&self, message: &InboundMessage) -> Option<PersistedRecord> {
        let filters = [RecordFilter::text_equals(
            properties::MESSAGE_ID,
            &message.message_id,
        )];

        match self.records.query(&filters, &[], 1).await {
            Ok(mut items) => items.pop(),
            Err(e) => {
                error!(id = %message.message_id, error = %e, "Message-id dedup query failed");
                None
            }
        }
    }

    /// Layer 2: fuzzy subject match within the prior 24 hours.
    async fn check_subject_date(&self, message: &InboundMessage) -> Option<PersistedRecord> {
        let window_start = message.received_at - Duration::days(1);
        let filters = [RecordFilter::date_after(
            properties::DATE_RECEIVED,
            window_start.to_rfc3339(),
        )];

        let candidates = match self.records.query(&filters, &[], SUBJECT_WINDOW_LIMIT).await {
            Ok(items) => items,
            Err(e) => {
                error!(id = %message.message_id, error = %e, "Subject+date dedup query failed");
                return None;
            }
        };

        candidates.into_iter().find(|item| {
            let score = similarity(&message.subject, &item.title);
            if score > SUBJECT_SIMILARITY_THRESHOLD {
                debug!(
                    subject = %message.subject,
                    title = %item.title,
                    score,
                    "Similar subject found"
                );
                true
            } else {
                false
            }
        })
    }

    /// Layer 3: exact content-hash lookup, then the same-sender summary
    /// similarity fallback for records persisted without a hash.
    async fn check_content(&self, message: &InboundMessage) -> Option<PersistedRecord> {
        let hash = content_hash(message);

        let hash_filters = [RecordFilter::text_equals(properties::CONTENT_HASH, &hash)];
        match self.records.query(&hash_filters, &[], 1).await {
            Ok(mut items) => {
                if let Some(record) = items.pop() {
                    debug!(id = %message.message_id, hash = %hash, "Exact content-hash match");
                    return Some(record);
                }
            }
            Err(e) => {
                error!(id = %message.message_id, error = %e, "Content-hash dedup query failed");
                // Fall through to the heuristic window.
            }
        }

        let window_start = message.received_at - Duration::days(7);
        let filters = [RecordFilter::date_after(
            properties::DATE_RECEIVED,
            window_start.to_rfc3339(),
        )];

        let candidates = match self.records.query(&filters, &[], CONTENT_WINDOW_LIMIT).await {
            Ok(items) => items,
            Err(e) => {
                error!(id = %message.message_id, error = %e, "Content window dedup query failed");
                return None;
            }
        };

        let body_head: String = message.body_text().chars().take(500).collect();

        candidates.into_iter().find(|item| {
            if item.sender_email.as_deref() != Some(message.sender_email.as_str()) {
                return false;
            }
            let Some(summary) = item.summary.as_deref() else {
                return false;
            };
            let summary_head: String = summary.chars().take(500).collect();
            let score = similarity(&body_head, &summary_head);
            if score > CONTENT_SIMILARITY_THRESHOLD {
                debug!(sender = %message.sender_email, score, "Similar content from same sender");
                true
            } else {
                false
            }
        })
    }
}

/// SHA-256 content hash: subject, first 1000 body characters, and sorted
/// attachment filenames, pipe-joined. Persisted on every created record
/// and queried exactly by layer 3.
pub fn content_hash(message: &InboundMessage) -> String {
    let body_head: String = message.body_text().chars().take(1000).collect();

    let mut filenames: Vec<&str> = message
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    filenames.sort_unstable();

    let content = format!("{}|{}|{}", message.subject, body_head, filenames.join(","));

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalized string similarity in `[0.0, 1.0]`.
///
/// Case-folded and trimmed before comparison; an empty side scores 0.0.
/// Symmetric, and `similarity(a, a) == 1.0` for non-empty `a`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_norm = a.trim().to_lowercase();
    let b_norm = b.trim().to_lowercase();

    if a_norm.is_empty() || b_norm.is_empty() {
        return 0.0;
    }

    strsim::normalized_levenshtein(&a_norm, &b_norm)
}
