//! Revision writing: render a page's current content and append a revision
//! only when the fingerprint moved.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::auth::Credential;
use crate::db::RevisionRepository;
use crate::error::Result;
use crate::models::{PageId, RemoteNode, Revision};
use crate::remote::RemoteApi;
use crate::render::{escape_html, render_blocks, RenderResult};

/// The one object type the renderer understands
pub const RENDERABLE_OBJ_TYPE: &str = "docx";

/// Fixed output for object types the renderer cannot handle. Not an error;
/// the page simply carries a placeholder revision until support lands.
pub(crate) fn unsupported_placeholder(obj_type: &str) -> RenderResult {
    let html = format!(
        "<div class=\"wsp-unsupported\">[Unsupported document type: {}]</div>",
        escape_html(obj_type)
    );
    let hash = hex::encode(Sha256::digest(html.as_bytes()));
    RenderResult {
        html,
        toc: Vec::new(),
        hash,
    }
}

/// Render the node's current content and append a revision for the page
/// unless the content hash equals the latest stored one. Returns whether a
/// row was written.
pub async fn refresh_revision(
    remote: &impl RemoteApi,
    revisions: &impl RevisionRepository,
    node: &RemoteNode,
    page_id: PageId,
    credential: &Credential,
) -> Result<bool> {
    let rendered = if node.obj_type == RENDERABLE_OBJ_TYPE {
        let blocks = remote.list_blocks(credential, &node.obj_token).await?;
        render_blocks(&blocks)
    } else {
        unsupported_placeholder(&node.obj_type)
    };

    if let Some(latest) = revisions.latest(&page_id).await? {
        if latest.content_hash == rendered.hash {
            debug!(page = %page_id, "content unchanged, skipping revision");
            return Ok(false);
        }
    }

    let revision = Revision::new(
        page_id,
        &node.obj_type,
        &node.obj_token,
        node.obj_edit_time_ms,
        &rendered.hash,
        &rendered.html,
        rendered.toc,
    );
    revisions.append(&revision).await?;
    Ok(true)
}
