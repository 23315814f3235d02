//! HTTP client for the remote wiki service.
//!
//! Every listing endpoint is paginated; loops follow `page_token` until
//! `has_more` is false, bounded by a per-endpoint page cap so a misbehaving
//! endpoint cannot spin forever.

mod wire;

pub use wire::WireBlock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::auth::Credential;
use crate::error::{Error, Result};
use crate::render::Block;

const SPACE_PAGE_SIZE: u32 = 50;
const NODE_PAGE_SIZE: u32 = 50;
const BLOCK_PAGE_SIZE: u32 = 500;

/// Per-endpoint pagination caps. Safety valves, not business rules.
#[derive(Debug, Clone, Copy)]
pub struct ClientLimits {
    pub space_pages: usize,
    pub node_pages: usize,
    pub block_pages: usize,
}

impl Default for ClientLimits {
    fn default() -> Self {
        Self {
            space_pages: 200,
            node_pages: 500,
            block_pages: 2000,
        }
    }
}

/// A remote wiki space
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceItem {
    pub space_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry of a node listing
#[derive(Debug, Clone, Deserialize)]
pub struct NodeItem {
    pub node_token: String,
    #[serde(default)]
    pub parent_node_token: Option<String>,
    pub title: String,
    #[serde(default)]
    pub has_child: bool,
    pub obj_type: String,
    pub obj_token: String,
    /// Last-edit time as reported by the remote, an opaque decimal string
    #[serde(default)]
    pub obj_edit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PageOf<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: Option<String>,
}

/// Remote listing operations the sync engine depends on
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    /// List the direct children of a node (or of the space root)
    async fn list_nodes(
        &self,
        credential: &Credential,
        space_id: &str,
        parent_node_token: Option<&str>,
    ) -> Result<Vec<NodeItem>>;

    /// Fetch the full block collection of a document
    async fn list_blocks(&self, credential: &Credential, document_id: &str) -> Result<Vec<Block>>;
}

/// reqwest-backed client for the remote wiki API
#[derive(Clone)]
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
    limits: ClientLimits,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_limits(base_url, ClientLimits::default())
    }

    pub fn with_limits(base_url: impl Into<String>, limits: ClientLimits) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            http: reqwest::Client::builder().build()?,
            limits,
        })
    }

    /// List every space visible to the credential
    pub async fn list_spaces(&self, credential: &Credential) -> Result<Vec<SpaceItem>> {
        self.paginate(
            credential,
            "/wiki/v2/spaces",
            Vec::new(),
            SPACE_PAGE_SIZE,
            self.limits.space_pages,
        )
        .await
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        base_query: Vec<(&'static str, String)>,
        page_size: u32,
        max_pages: usize,
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..max_pages {
            let mut query = base_query.clone();
            query.push(("page_size", page_size.to_string()));
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let page: PageOf<T> = self.get_json(credential, path, &query).await?;
            out.extend(page.items);

            if !page.has_more {
                return Ok(out);
            }
            match page.page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(out),
            }
        }

        debug!(path, pages = max_pages, "pagination cap reached");
        Ok(out)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&credential.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::RemoteApi(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body)
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|_| {
            Error::RemoteApi(format!("non-JSON response: {}", truncate(&body)))
        })?;
        if envelope.code != 0 {
            return Err(Error::RemoteApi(format!(
                "code={} msg={}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }
        envelope
            .data
            .ok_or_else(|| Error::RemoteApi("response missing data".to_string()))
    }
}

impl RemoteApi for RemoteClient {
    async fn list_nodes(
        &self,
        credential: &Credential,
        space_id: &str,
        parent_node_token: Option<&str>,
    ) -> Result<Vec<NodeItem>> {
        let mut base_query = Vec::new();
        if let Some(parent) = parent_node_token {
            base_query.push(("parent_node_token", parent.to_string()));
        }
        self.paginate(
            credential,
            &format!("/wiki/v2/spaces/{space_id}/nodes"),
            base_query,
            NODE_PAGE_SIZE,
            self.limits.node_pages,
        )
        .await
    }

    async fn list_blocks(&self, credential: &Credential, document_id: &str) -> Result<Vec<Block>> {
        let wire: Vec<WireBlock> = self
            .paginate(
                credential,
                &format!("/docx/v1/documents/{document_id}/blocks"),
                Vec::new(),
                BLOCK_PAGE_SIZE,
                self.limits.block_pages,
            )
            .await?;
        Ok(wire.into_iter().map(Block::from).collect())
    }
}

fn truncate(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    body[..end].trim()
}

fn normalize_base_url(raw: String) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("base URL must not be empty".to_string()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://wiki.example.com/".to_string()).unwrap(),
            "https://wiki.example.com"
        );
        assert!(normalize_base_url("wiki.example.com".to_string()).is_err());
        assert!(normalize_base_url("  ".to_string()).is_err());
    }

    #[test]
    fn test_envelope_rejects_nonzero_code() {
        let envelope: Envelope<PageOf<NodeItem>> =
            serde_json::from_str(r#"{"code": 99991663, "msg": "token expired"}"#).unwrap();
        assert_eq!(envelope.code, 99_991_663);
        assert_eq!(envelope.msg.as_deref(), Some("token expired"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_node_page_parses_with_missing_optionals() {
        let json = r#"{
            "code": 0,
            "msg": "success",
            "data": {
                "items": [
                    {"node_token": "n1", "title": "Home", "obj_type": "docx", "obj_token": "d1"}
                ],
                "has_more": false
            }
        }"#;
        let envelope: Envelope<PageOf<NodeItem>> = serde_json::from_str(json).unwrap();
        let page = envelope.data.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
        assert!(page.page_token.is_none());

        let node = &page.items[0];
        assert_eq!(node.node_token, "n1");
        assert!(node.parent_node_token.is_none());
        assert!(!node.has_child);
        assert!(node.obj_edit_time.is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let short = "short body";
        assert_eq!(truncate(short), "short body");
        let long = "é".repeat(300);
        assert_eq!(truncate(&long).chars().count(), 200);
    }
}
