//! Inbound message and attachment types.
//!
//! An `InboundMessage` is immutable once retrieved from the mailbox
//! collaborator and owned by the orchestrator for the duration of one
//! processing attempt. Attachments are the exception: collaborators fill
//! `local_path` (download) and `stored_url` (upload) in place.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Original filename.
    pub filename: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// Provider-specific attachment handle.
    pub attachment_id: String,
    /// Binary payload, when fetched inline.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    /// Local staging path, filled by the mailbox collaborator on download.
    pub local_path: Option<PathBuf>,
    /// Object-storage URL, filled by the storage collaborator on upload.
    pub stored_url: Option<String>,
}

/// One inbound unit of content with metadata, body, and attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Provider-unique message identifier.
    pub message_id: String,
    /// Provider thread identifier.
    pub thread_id: String,
    /// Subject line.
    pub subject: String,
    /// Sender address.
    pub sender_email: String,
    /// Sender display name, when available.
    pub sender_name: Option<String>,
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
    /// Plain-text body variant.
    pub body_plain: Option<String>,
    /// HTML body variant.
    pub body_html: Option<String>,
    /// Short preview snippet.
    pub snippet: Option<String>,
    /// Attachments, in provider order.
    pub attachments: Vec<Attachment>,
    /// Provider labels applied to the message.
    pub labels: Vec<String>,
    /// Whether the provider has marked this message processed.
    pub processed: bool,
}

impl InboundMessage {
    /// Best available body text: plain, then HTML, then snippet.
    pub fn body_text(&self) -> &str {
        self.body_plain
            .as_deref()
            .or(self.body_html.as_deref())
            .or(self.snippet.as_deref())
            .unwrap_or("")
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// Attachments whose MIME type starts with the given prefix.
    pub fn attachments_by_type(&self, mime_prefix: &str) -> Vec<&Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.mime_type.starts_with(mime_prefix))
            .collect()
    }

    pub fn image_attachments(&self) -> Vec<&Attachment> {
        self.attachments_by_type("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_message() -> InboundMessage {
        InboundMessage {
            message_id: "msg-001".into(),
            thread_id: "thread-001".into(),
            subject: "Road closure consultation".into(),
            sender_email: "council@example.gov".into(),
            sender_name: Some("Highways Team".into()),
            recipients: vec!["intake@example.org".into()],
            received_at: Utc::now(),
            body_plain: Some("Plain body".into()),
            body_html: Some("<p>HTML body</p>".into()),
            snippet: Some("Snippet".into()),
            attachments: vec![],
            labels: vec!["intake".into()],
            processed: false,
        }
    }

    fn attachment(filename: &str, mime: &str) -> Attachment {
        Attachment {
            filename: filename.into(),
            mime_type: mime.into(),
            size_bytes: 1024,
            attachment_id: format!("att-{filename}"),
            data: None,
            local_path: None,
            stored_url: None,
        }
    }

    #[test]
    fn body_text_prefers_plain() {
        let msg = base_message();
        assert_eq!(msg.body_text(), "Plain body");
    }

    #[test]
    fn body_text_falls_back_to_html_then_snippet() {
        let mut msg = base_message();
        msg.body_plain = None;
        assert_eq!(msg.body_text(), "<p>HTML body</p>");

        msg.body_html = None;
        assert_eq!(msg.body_text(), "Snippet");

        msg.snippet = None;
        assert_eq!(msg.body_text(), "");
    }

    #[test]
    fn attachment_helpers() {
        let mut msg = base_message();
        assert!(!msg.has_attachments());

        msg.attachments = vec![
            attachment("report.pdf", "application/pdf"),
            attachment("photo.jpg", "image/jpeg"),
            attachment("map.png", "image/png"),
        ];
        assert!(msg.has_attachments());
        assert_eq!(msg.attachment_count(), 3);
        assert_eq!(msg.image_attachments().len(), 2);
        assert_eq!(msg.attachments_by_type("application/pdf").len(), 1);
    }
}
