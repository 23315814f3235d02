//! Slug sanitization and per-site unique allocation

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::db::PageRepository;
use crate::error::Result;
use crate::models::SiteId;

/// Maximum slug length in characters
const MAX_SLUG_LEN: usize = 80;

/// Numbered-suffix attempts before the randomized terminal fallback
const MAX_UNIQUE_ATTEMPTS: usize = 50;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex"))
}

fn disallowed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\-_]").expect("Invalid regex"))
}

/// Turn an arbitrary title into a URL-safe slug candidate.
///
/// Lowercases, collapses whitespace runs to single hyphens, strips anything
/// outside `[a-z0-9\-_]`, trims leading/trailing hyphens and truncates to 80
/// characters. Returns an empty string when nothing survives.
#[must_use]
pub fn sanitize(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let hyphenated = whitespace_re().replace_all(&lowered, "-");
    let cleaned = disallowed_re().replace_all(&hyphenated, "");
    cleaned
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect()
}

/// Slug candidate for a page: sanitized title, or a node-token-derived
/// fallback when the title sanitizes to nothing.
#[must_use]
pub fn page_slug(title: &str, node_token: &str) -> String {
    let sanitized = sanitize(title);
    if sanitized.is_empty() {
        let prefix: String = node_token.chars().take(8).collect();
        format!("n-{prefix}")
    } else {
        sanitized
    }
}

/// Allocate a slug unique within a site.
///
/// Tries `desired`, then `desired-2`, `desired-3`, ... for up to 50
/// attempts. If every attempt collides, appends a random 6-hex-digit suffix
/// and returns it without a further check — a best-effort terminal
/// fallback, not a hard guarantee.
pub async fn allocate_unique(
    pages: &impl PageRepository,
    site_id: &SiteId,
    desired: &str,
) -> Result<String> {
    let base = if desired.is_empty() { "page" } else { desired };

    let mut candidate = base.to_string();
    for attempt in 0..MAX_UNIQUE_ATTEMPTS {
        if pages.find_by_slug(site_id, &candidate).await?.is_none() {
            return Ok(candidate);
        }
        candidate = format!("{base}-{}", attempt + 2);
    }

    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    Ok(format!("{base}-{suffix}"))
}
