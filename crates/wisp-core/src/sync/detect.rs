//! Change detection between a stored node and its freshly fetched state

use crate::models::RemoteNode;

/// Decide whether a freshly fetched node differs from the stored one.
///
/// An absent stored node is always a change. Otherwise a change is a
/// different object token, a different object type, or a present edit time
/// that differs from the stored one. A node without a parsable edit time is
/// never flagged on that basis alone.
#[must_use]
pub fn is_changed(existing: Option<&RemoteNode>, incoming: &RemoteNode) -> bool {
    let Some(existing) = existing else {
        return true;
    };
    existing.obj_token != incoming.obj_token
        || existing.obj_type != incoming.obj_type
        || incoming
            .obj_edit_time_ms
            .is_some_and(|edit_ms| existing.obj_edit_time_ms != Some(edit_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteId;

    fn node(obj_token: &str, obj_type: &str, edit_ms: Option<i64>) -> RemoteNode {
        RemoteNode {
            site_id: SiteId::new(),
            node_token: "n1".to_string(),
            parent_node_token: None,
            title: "Title".to_string(),
            obj_type: obj_type.to_string(),
            obj_token: obj_token.to_string(),
            obj_edit_time_ms: edit_ms,
        }
    }

    #[test]
    fn test_absent_existing_is_changed() {
        assert!(is_changed(None, &node("d1", "docx", None)));
    }

    #[test]
    fn test_identical_node_is_unchanged() {
        let stored = node("d1", "docx", Some(100));
        assert!(!is_changed(Some(&stored), &node("d1", "docx", Some(100))));
    }

    #[test]
    fn test_token_or_type_difference_is_changed() {
        let stored = node("d1", "docx", Some(100));
        assert!(is_changed(Some(&stored), &node("d2", "docx", Some(100))));
        assert!(is_changed(Some(&stored), &node("d1", "sheet", Some(100))));
    }

    #[test]
    fn test_edit_time_difference_is_changed() {
        let stored = node("d1", "docx", Some(100));
        assert!(is_changed(Some(&stored), &node("d1", "docx", Some(200))));
        // A stored node without an edit time gains one
        let unstamped = node("d1", "docx", None);
        assert!(is_changed(Some(&unstamped), &node("d1", "docx", Some(100))));
    }

    #[test]
    fn test_missing_incoming_edit_time_is_not_a_change() {
        let stored = node("d1", "docx", Some(100));
        assert!(!is_changed(Some(&stored), &node("d1", "docx", None)));
    }
}
