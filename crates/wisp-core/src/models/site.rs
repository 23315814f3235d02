//! Site and space-binding models

use serde::{Deserialize, Serialize};

use super::SiteId;

/// A locally managed publishing site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Unique identifier
    pub id: SiteId,
    /// Display name
    pub name: String,
    /// URL-safe site slug
    pub slug: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Site {
    /// Create a new site with the given name and slug
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: SiteId::new(),
            name: name.into(),
            slug: slug.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// The association of a site to a remote wiki space.
///
/// Scopes synchronization: the walk starts at `root_node_token` when set,
/// otherwise at the space root. `bound_by` is the owning identity used to
/// obtain access credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceBinding {
    pub site_id: SiteId,
    /// Remote wiki space id
    pub space_id: String,
    /// Optional subtree root; `None` means the space root
    pub root_node_token: Option<String>,
    /// Identity whose credential is used for sync
    pub bound_by: String,
    /// Whether scheduled polls should include this site
    pub sync_enabled: bool,
    /// Last successful full sync (Unix ms)
    pub last_full_sync_at: Option<i64>,
    /// Last successful poll sync (Unix ms)
    pub last_poll_sync_at: Option<i64>,
}

impl SpaceBinding {
    /// Create a new enabled binding with no sync history
    #[must_use]
    pub fn new(site_id: SiteId, space_id: impl Into<String>, bound_by: impl Into<String>) -> Self {
        Self {
            site_id,
            space_id: space_id.into(),
            root_node_token: None,
            bound_by: bound_by.into(),
            sync_enabled: true,
            last_full_sync_at: None,
            last_poll_sync_at: None,
        }
    }

    /// Scope the binding to a subtree root
    #[must_use]
    pub fn with_root(mut self, root_node_token: impl Into<String>) -> Self {
        self.root_node_token = Some(root_node_token.into());
        self
    }
}
