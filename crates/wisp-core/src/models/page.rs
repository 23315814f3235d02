//! Page model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{PageId, SiteId};

/// Publishing status of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageStatus {
    Draft,
    Published,
}

impl PageStatus {
    /// Stable string form used in the database
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            other => Err(format!("unknown page status: {other}")),
        }
    }
}

/// The local, owner-editable publishing record bound 1:1 to a discovered
/// wiki node.
///
/// Created exactly once when its node is first discovered. Sync refreshes
/// `title` when it changes upstream; `slug`, `status`, `nav_visible` and
/// `sort` belong to the operator and are never overwritten by sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier
    pub id: PageId,
    pub site_id: SiteId,
    /// Backing wiki node token; unique per site together with `site_id`
    pub node_token: String,
    /// Title as last seen upstream
    pub title: String,
    /// URL-safe slug, unique per site
    pub slug: String,
    pub status: PageStatus,
    /// Whether the page shows up in site navigation
    pub nav_visible: bool,
    /// Manual navigation ordering
    pub sort: i64,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Page {
    /// Create a new draft, nav-visible page for a freshly discovered node
    #[must_use]
    pub fn new_draft(
        site_id: SiteId,
        node_token: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id: PageId::new(),
            site_id,
            node_token: node_token.into(),
            title: title.into(),
            slug: slug.into(),
            status: PageStatus::Draft,
            nav_visible: true,
            sort: 0,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [PageStatus::Draft, PageStatus::Published] {
            let parsed: PageStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
        assert!("ARCHIVED".parse::<PageStatus>().is_err());
    }

    #[test]
    fn test_new_draft_defaults() {
        let page = Page::new_draft(SiteId::new(), "node-1", "Guide", "guide");
        assert_eq!(page.status, PageStatus::Draft);
        assert!(page.nav_visible);
        assert_eq!(page.sort, 0);
    }
}
