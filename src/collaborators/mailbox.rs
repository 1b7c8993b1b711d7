//! Mailbox collaborator contract.

use async_trait::async_trait;

use crate::error::MailboxError;
use crate::model::InboundMessage;

/// Mailbox polling and retrieval.
///
/// `mark_processed` is the idempotence anchor: a marked message must not
/// reappear in `list_new_message_ids`. The orchestrator calls it only
/// after persistence succeeds (or a duplicate is confirmed).
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Identifiers of messages awaiting intake, in provider order.
    async fn list_new_message_ids(&self) -> Result<Vec<String>, MailboxError>;

    /// Full message detail for one identifier.
    async fn get_message_detail(&self, id: &str) -> Result<InboundMessage, MailboxError>;

    /// Download all attachments, filling each `Attachment::local_path`.
    async fn download_attachments(&self, message: &mut InboundMessage)
    -> Result<(), MailboxError>;

    /// Mark a message processed so it never reappears in listings.
    async fn mark_processed(&self, id: &str) -> Result<(), MailboxError>;
}
