//! Extraction-result validation.
//!
//! The AI collaborator returns a best-effort `ExtractionResult`; this
//! module is the only place that turns it into a `StructuredRecord`.
//! Every missing or malformed field gets a documented default, so a
//! record always persists even when extraction returned nothing usable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::model::{
    ActionRequired, ExtractionResult, InboundMessage, Priority, ProcessingStatus, ProjectType,
    RecordStatus, StructuredRecord,
};
use crate::pipeline::dedup::content_hash;

/// Maximum persisted title length, in characters.
const MAX_TITLE_CHARS: usize = 100;

const DEFAULT_TITLE: &str = "Untitled Item";
const DEFAULT_SUMMARY: &str = "No summary available.";

/// Validates raw extraction output into a persistable record.
pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        Self
    }

    /// Build a `StructuredRecord` from raw extraction output plus the
    /// source message. Infallible: invalid input degrades to defaults.
    pub fn validate(&self, raw: ExtractionResult, message: &InboundMessage) -> StructuredRecord {
        let title = raw
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .chars()
            .take(MAX_TITLE_CHARS)
            .collect();

        let summary = raw
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUMMARY)
            .to_string();

        StructuredRecord {
            title,
            summary,

            message_id: message.message_id.clone(),
            sender_email: message.sender_email.clone(),
            sender_name: message.sender_name.clone(),
            received_at: message.received_at,
            has_attachments: message.has_attachments(),
            attachment_count: message.attachment_count(),

            consultation_deadline: parse_date(raw.consultation_deadline.as_deref(), "consultation_deadline"),
            action_due_date: parse_date(raw.action_due_date.as_deref(), "action_due_date"),
            estimated_completion: parse_date(raw.estimated_completion.as_deref(), "estimated_completion"),

            project_type: parse_categorical(raw.project_type.as_deref(), "project_type", ProjectType::parse),
            action_required: parse_categorical(raw.action_required.as_deref(), "action_required", ActionRequired::parse),
            priority: parse_categorical(raw.priority.as_deref(), "priority", Priority::parse),

            tags: raw.tags,
            locations: raw.locations,
            key_points: raw.key_points.unwrap_or_default(),

            content_hash: content_hash(message),

            geocoded_coordinates: String::new(),
            attachment_urls: String::new(),
            attachment_analysis: String::new(),
            related_records: Vec::new(),
            related_project: None,

            status: RecordStatus::New,
            processing_status: ProcessingStatus::AiComplete,
        }
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an optional categorical field, falling back to the enum's
/// default on unknown values.
fn parse_categorical<T: Default>(
    raw: Option<&str>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> T {
    match raw.map(str::trim) {
        None | Some("") => T::default(),
        Some(value) => parse(value).unwrap_or_else(|| {
            warn!(field, value, "Unknown categorical value, using default");
            T::default()
        }),
    }
}

/// Parse an ISO-8601 date string into UTC.
///
/// Accepts a full RFC 3339 timestamp, a bare datetime, and a bare date
/// (midnight UTC); a trailing `Z` on a bare datetime is tolerated.
/// Anything else logs a warning and yields `None`.
fn parse_date(raw: Option<&str>, field: &'static str) -> Option<DateTime<Utc>> {
    let value = raw.map(str::trim).filter(|v| !v.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let bare = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(naive) = NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(bare, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    warn!(field, value, "Unparseable date, dropping");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message() -> InboundMessage {
        InboundMessage {
            message_id: "msg-9".into(),
            thread_id: "t-9".into(),
            subject: "Cycle lane consultation".into(),
            sender_email: "highways@example.gov".into(),
            sender_name: Some("Highways Team".into()),
            recipients: vec!["cllr@example.gov".into()],
            received_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
            body_plain: Some("Consultation opens today.".into()),
            body_html: None,
            snippet: None,
            attachments: vec![],
            labels: vec![],
            processed: false,
        }
    }

    #[test]
    fn empty_extraction_gets_all_defaults() {
        let record = RecordValidator::new().validate(ExtractionResult::default(), &message());

        assert_eq!(record.title, "Untitled Item");
        assert_eq!(record.summary, "No summary available.");
        assert_eq!(record.project_type, ProjectType::Other);
        assert_eq!(record.action_required, ActionRequired::InformationOnly);
        assert_eq!(record.priority, Priority::Medium);
        assert!(record.tags.is_empty());
        assert!(record.locations.is_empty());
        assert_eq!(record.key_points, "");
        assert!(record.consultation_deadline.is_none());
        assert_eq!(record.status, RecordStatus::New);
        assert_eq!(record.processing_status, ProcessingStatus::AiComplete);
    }

    #[test]
    fn message_metadata_carried_over() {
        let record = RecordValidator::new().validate(ExtractionResult::default(), &message());

        assert_eq!(record.message_id, "msg-9");
        assert_eq!(record.sender_email, "highways@example.gov");
        assert_eq!(record.sender_name.as_deref(), Some("Highways Team"));
        assert!(!record.has_attachments);
        assert!(!record.content_hash.is_empty());
    }

    #[test]
    fn bogus_project_type_coerces_to_other() {
        let raw = ExtractionResult {
            project_type: Some("road_rage".into()),
            action_required: Some("shout_loudly".into()),
            priority: Some("extreme".into()),
            ..ExtractionResult::default()
        };
        let record = RecordValidator::new().validate(raw, &message());

        assert_eq!(record.project_type, ProjectType::Other);
        assert_eq!(record.action_required, ActionRequired::InformationOnly);
        assert_eq!(record.priority, Priority::Medium);
    }

    #[test]
    fn valid_categoricals_pass_through() {
        let raw = ExtractionResult {
            project_type: Some("traffic_order".into()),
            action_required: Some("response_needed".into()),
            priority: Some("high".into()),
            ..ExtractionResult::default()
        };
        let record = RecordValidator::new().validate(raw, &message());

        assert_eq!(record.project_type, ProjectType::TrafficOrder);
        assert_eq!(record.action_required, ActionRequired::ResponseNeeded);
        assert_eq!(record.priority, Priority::High);
    }

    #[test]
    fn title_clamped_to_100_chars() {
        let raw = ExtractionResult {
            title: Some("t".repeat(300)),
            ..ExtractionResult::default()
        };
        let record = RecordValidator::new().validate(raw, &message());
        assert_eq!(record.title.chars().count(), 100);
    }

    #[test]
    fn date_formats_accepted() {
        assert_eq!(
            parse_date(Some("2026-04-01T12:00:00+01:00"), "t"),
            Some(Utc.with_ymd_and_hms(2026, 4, 1, 11, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date(Some("2026-04-01T12:00:00Z"), "t"),
            Some(Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date(Some("2026-04-01T12:00:00"), "t"),
            Some(Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date(Some("2026-04-01"), "t"),
            Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_dates_drop_to_none() {
        assert!(parse_date(Some("next Tuesday"), "t").is_none());
        assert!(parse_date(Some(""), "t").is_none());
        assert!(parse_date(None, "t").is_none());
    }

    #[test]
    fn whitespace_only_title_and_summary_default() {
        let raw = ExtractionResult {
            title: Some("   ".into()),
            summary: Some("".into()),
            ..ExtractionResult::default()
        };
        let record = RecordValidator::new().validate(raw, &message());
        assert_eq!(record.title, "Untitled Item");
        assert_eq!(record.summary, "No summary available.");
    }
}
