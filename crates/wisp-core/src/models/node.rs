//! Remote wiki node mirror model

use serde::{Deserialize, Serialize};

use super::SiteId;

/// A locally mirrored entry of the remote wiki tree.
///
/// Identity is `(site_id, node_token)`. Rows are created and refreshed on
/// every sync pass and never deleted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub site_id: SiteId,
    /// Remote node token (opaque)
    pub node_token: String,
    /// Parent node token, `None` for roots
    pub parent_node_token: Option<String>,
    /// Node title as last seen upstream
    pub title: String,
    /// Type of the backing document object (e.g. "docx")
    pub obj_type: String,
    /// Opaque id of the backing document object
    pub obj_token: String,
    /// Externally supplied last-edit time (Unix ms), used as a cheap
    /// change-detection fingerprint. Not guaranteed strictly increasing.
    pub obj_edit_time_ms: Option<i64>,
}

/// Parse the remote API's edit-time field (a millisecond timestamp carried
/// as a decimal string) into Unix ms. Unparsable or absent values map to
/// `None` and are never treated as a change signal on their own.
#[must_use]
pub fn parse_edit_time_ms(value: Option<&str>) -> Option<i64> {
    value?.trim().parse::<i64>().ok()
}
