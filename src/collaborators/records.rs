//! Record store contract — the persistence collaborator.
//!
//! Queries are a conjunction of typed property filters, modeled after
//! the store's native filter grammar so implementations translate
//! directly.

use async_trait::async_trait;

use crate::error::RecordStoreError;
use crate::model::{PersistedProject, PersistedRecord, StructuredRecord};

/// Property type a filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Date,
    Select,
    Text,
    Checkbox,
}

/// Comparison operator for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    After,
    Before,
}

/// One (property, operator, value) filter triple. Multiple filters are a
/// conjunction.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub property: String,
    pub kind: PropertyKind,
    pub op: FilterOp,
    pub value: String,
}

impl RecordFilter {
    pub fn new(
        property: impl Into<String>,
        kind: PropertyKind,
        op: FilterOp,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            kind,
            op,
            value: value.into(),
        }
    }

    /// Exact-match filter on a text property.
    pub fn text_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(property, PropertyKind::Text, FilterOp::Equals, value)
    }

    /// Date-after filter (ISO-8601 value).
    pub fn date_after(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(property, PropertyKind::Date, FilterOp::After, value)
    }

    /// Exact-match filter on a select property.
    pub fn select_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(property, PropertyKind::Select, FilterOp::Equals, value)
    }
}

/// Sort order for a query.
#[derive(Debug, Clone)]
pub struct RecordSort {
    pub property: String,
    pub descending: bool,
}

impl RecordSort {
    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            descending: true,
        }
    }
}

/// Persistence collaborator for structured records and projects.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a new record. The only input shape is a validated
    /// `StructuredRecord`.
    async fn create(&self, record: &StructuredRecord)
    -> Result<PersistedRecord, RecordStoreError>;

    /// Query records with a filter conjunction, sorts, and a result cap.
    async fn query(
        &self,
        filters: &[RecordFilter],
        sorts: &[RecordSort],
        limit: usize,
    ) -> Result<Vec<PersistedRecord>, RecordStoreError>;

    /// Query projects (relationship-detection candidates).
    async fn query_projects(
        &self,
        filters: &[RecordFilter],
        sorts: &[RecordSort],
        limit: usize,
    ) -> Result<Vec<PersistedProject>, RecordStoreError>;
}

/// Property names the pipeline filters and sorts on. Kept in one place
/// so the store implementation and the dedup queries agree.
pub mod properties {
    pub const MESSAGE_ID: &str = "Message ID";
    pub const CONTENT_HASH: &str = "Content Hash";
    pub const DATE_RECEIVED: &str = "Date Received";
    pub const STATUS: &str = "Status";
}
