//! Page revision model

use serde::{Deserialize, Serialize};

use super::{PageId, RevisionId};

/// One entry of a rendered document's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Anchor id emitted on the heading element
    pub id: String,
    /// Heading level, 1..=6
    pub level: u8,
    /// Plain heading text
    pub text: String,
}

/// An immutable rendered snapshot of a page's content.
///
/// Revisions are append-only per page, ordered by creation time. The writer
/// guarantees two consecutive revisions never share a `content_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Unique identifier
    pub id: RevisionId,
    pub page_id: PageId,
    /// Object type of the source document at render time
    pub source_obj_type: String,
    /// Object token of the source document at render time
    pub source_obj_token: String,
    /// Source edit-time fingerprint at render time (Unix ms)
    pub source_edit_time_ms: Option<i64>,
    /// Hex SHA-256 of `html`
    pub content_hash: String,
    /// Rendered HTML body
    pub html: String,
    /// Heading-derived outline in document order
    pub toc: Vec<TocEntry>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Revision {
    /// Create a new revision for the given page
    #[must_use]
    pub fn new(
        page_id: PageId,
        source_obj_type: impl Into<String>,
        source_obj_token: impl Into<String>,
        source_edit_time_ms: Option<i64>,
        content_hash: impl Into<String>,
        html: impl Into<String>,
        toc: Vec<TocEntry>,
    ) -> Self {
        Self {
            id: RevisionId::new(),
            page_id,
            source_obj_type: source_obj_type.into(),
            source_obj_token: source_obj_token.into(),
            source_edit_time_ms,
            content_hash: content_hash.into(),
            html: html.into(),
            toc,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
