//! Structured record types.
//!
//! `ExtractionResult` is the raw, possibly-invalid field set returned by
//! the AI text-extraction collaborator. Only the validator turns it into
//! a `StructuredRecord` — the single representation ever handed to the
//! record store. `PersistedRecord` is what the store returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Categorical fields ──────────────────────────────────────────────

/// Project classification for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    TrafficOrder,
    Consultation,
    InfrastructureProject,
    Event,
    #[default]
    Other,
}

impl ProjectType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "traffic_order" => Some(Self::TrafficOrder),
            "consultation" => Some(Self::Consultation),
            "infrastructure_project" => Some(Self::InfrastructureProject),
            "event" => Some(Self::Event),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrafficOrder => "traffic_order",
            Self::Consultation => "consultation",
            Self::InfrastructureProject => "infrastructure_project",
            Self::Event => "event",
            Self::Other => "other",
        }
    }
}

/// What the record demands of its readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRequired {
    ResponseNeeded,
    #[default]
    InformationOnly,
    Monitoring,
    UrgentAction,
}

impl ActionRequired {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "response_needed" => Some(Self::ResponseNeeded),
            "information_only" => Some(Self::InformationOnly),
            "monitoring" => Some(Self::Monitoring),
            "urgent_action" => Some(Self::UrgentAction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResponseNeeded => "response_needed",
            Self::InformationOnly => "information_only",
            Self::Monitoring => "monitoring",
            Self::UrgentAction => "urgent_action",
        }
    }
}

/// Record priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Review lifecycle of a persisted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    New,
    Reviewed,
    ResponseDrafted,
    Submitted,
    Monitoring,
    Closed,
}

/// Where the record sits in the intake pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    PendingAiAnalysis,
    #[default]
    AiComplete,
    NeedsReview,
    Approved,
    Migrated,
}

// ── Extraction result ───────────────────────────────────────────────

/// Raw field set from the AI text-extraction collaborator.
///
/// Every field may be absent or invalid; `tags` and `locations` tolerate
/// non-list values (deserialized as empty). Categorical fields stay raw
/// strings here — the validator owns enum checking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub consultation_deadline: Option<String>,
    #[serde(default)]
    pub action_due_date: Option<String>,
    #[serde(default)]
    pub estimated_completion: Option<String>,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub action_required: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub locations: Vec<String>,
    #[serde(default)]
    pub key_points: Option<String>,
}

impl ExtractionResult {
    /// Minimal fallback an extraction collaborator returns when its own
    /// analysis fails — flagged for manual review, never an error.
    pub fn degraded(subject: &str, reason: &str) -> Self {
        Self {
            title: Some(subject.chars().take(100).collect()),
            summary: Some("Error analyzing message content. Manual review required.".into()),
            key_points: Some(format!(
                "- Error during AI analysis: {reason}\n- Manual review required"
            )),
            ..Self::default()
        }
    }
}

/// Accept a JSON list of strings; any other shape becomes an empty list.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

// ── Structured record ───────────────────────────────────────────────

/// Validated, defaulted, enum-checked record ready for persistence.
///
/// Enrichment fields (`geocoded_coordinates`, `attachment_urls`,
/// `attachment_analysis`, `related_records`, `related_project`) start
/// empty from the validator and are filled by the orchestrator before
/// the create call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub title: String,
    pub summary: String,

    // Message metadata
    pub message_id: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub received_at: DateTime<Utc>,
    pub has_attachments: bool,
    pub attachment_count: usize,

    // Deadline-like dates
    pub consultation_deadline: Option<DateTime<Utc>>,
    pub action_due_date: Option<DateTime<Utc>>,
    pub estimated_completion: Option<DateTime<Utc>>,

    // Categorical fields
    pub project_type: ProjectType,
    pub action_required: ActionRequired,
    pub priority: Priority,

    pub tags: Vec<String>,
    pub locations: Vec<String>,
    pub key_points: String,

    /// SHA-256 over subject, leading body text, and sorted attachment
    /// filenames; persisted so dedup layer 3 can query it exactly.
    pub content_hash: String,

    // Enrichment (orchestrator-filled)
    pub geocoded_coordinates: String,
    pub attachment_urls: String,
    pub attachment_analysis: String,
    pub related_records: Vec<String>,
    pub related_project: Option<String>,

    pub status: RecordStatus,
    pub processing_status: ProcessingStatus,
}

// ── Persisted shapes ────────────────────────────────────────────────

/// A record as returned by the store; only the fields the pipeline
/// reads back (dedup, relationship candidates) are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub received_at: DateTime<Utc>,
    pub message_id: Option<String>,
    pub sender_email: Option<String>,
    pub content_hash: Option<String>,
    pub project_type: Option<ProjectType>,
    pub status: RecordStatus,
    pub url: Option<String>,
}

/// A project as returned by the store, used as a relationship candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedProject {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Store-native status label (e.g. "active").
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_round_trips() {
        for value in [
            "traffic_order",
            "consultation",
            "infrastructure_project",
            "event",
            "other",
        ] {
            assert_eq!(ProjectType::parse(value).unwrap().as_str(), value);
        }
        assert!(ProjectType::parse("bogus").is_none());
    }

    #[test]
    fn categorical_defaults() {
        assert_eq!(ProjectType::default(), ProjectType::Other);
        assert_eq!(ActionRequired::default(), ActionRequired::InformationOnly);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(RecordStatus::default(), RecordStatus::New);
        assert_eq!(ProcessingStatus::default(), ProcessingStatus::AiComplete);
    }

    #[test]
    fn extraction_result_deserializes_partial_json() {
        let raw = r#"{"title": "Junction works", "priority": "high"}"#;
        let result: ExtractionResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.title.as_deref(), Some("Junction works"));
        assert_eq!(result.priority.as_deref(), Some("high"));
        assert!(result.summary.is_none());
        assert!(result.tags.is_empty());
    }

    #[test]
    fn extraction_result_tolerates_non_list_tags() {
        let raw = r#"{"tags": "not-a-list", "locations": 7}"#;
        let result: ExtractionResult = serde_json::from_str(raw).unwrap();
        assert!(result.tags.is_empty());
        assert!(result.locations.is_empty());
    }

    #[test]
    fn extraction_result_keeps_string_lists() {
        let raw = r#"{"tags": ["cycling", "ltn"], "locations": ["High St", 42]}"#;
        let result: ExtractionResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.tags, vec!["cycling", "ltn"]);
        // Non-string entries are dropped, not errors.
        assert_eq!(result.locations, vec!["High St"]);
    }

    #[test]
    fn degraded_result_clamps_title_and_flags_review() {
        let long_subject = "x".repeat(250);
        let result = ExtractionResult::degraded(&long_subject, "timeout");
        assert_eq!(result.title.unwrap().chars().count(), 100);
        assert!(result.key_points.unwrap().contains("timeout"));
        assert!(result.summary.unwrap().contains("Manual review"));
    }
}
