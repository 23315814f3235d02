//! Block tree renderer.
//!
//! Pure transform from a flat block collection to an HTML body, a
//! heading-derived table of contents, and a SHA-256 fingerprint of the HTML.
//! Rendering the same collection twice yields byte-identical output.

mod block;

pub use block::{Block, BlockKind, Span, SpanStyle};

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use crate::models::TocEntry;
use crate::slug;

/// Output of a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Hex-encoded SHA-256 of `html`
    pub hash: String,
}

/// Escape text for use in HTML content and attribute values
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Anchor id for a heading. Sanitizes like a slug; when nothing survives,
/// falls back to a digest-derived id so the anchor is still deterministic.
#[must_use]
pub fn anchor_id(s: &str) -> String {
    let cleaned = slug::sanitize(s);
    if cleaned.is_empty() {
        let digest = hex::encode(Sha256::digest(s.as_bytes()));
        format!("h-{}", &digest[..10])
    } else {
        cleaned
    }
}

fn plain_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text { content, .. } => out.push_str(content),
            Span::Mention => out.push_str("@user"),
            Span::Equation(content) => out.push_str(content),
        }
    }
    out
}

/// Wrap escaped text in its style tags. The nesting order is a fixed
/// rendering convention: link outermost, then inline-code, bold, italic,
/// underline, strikethrough.
fn render_span(span: &Span) -> String {
    match span {
        Span::Text { content, style } => {
            let mut html = escape_html(content);
            if let Some(url) = &style.link {
                html = format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{html}</a>",
                    escape_html(url)
                );
            }
            if style.inline_code {
                html = format!("<code class=\"wsp-inline-code\">{html}</code>");
            }
            if style.bold {
                html = format!("<strong>{html}</strong>");
            }
            if style.italic {
                html = format!("<em>{html}</em>");
            }
            if style.underline {
                html = format!("<u>{html}</u>");
            }
            if style.strikethrough {
                html = format!("<s>{html}</s>");
            }
            html
        }
        Span::Mention => "<span class=\"wsp-mention\">@user</span>".to_string(),
        Span::Equation(content) => {
            format!("<span class=\"wsp-equation\">{}</span>", escape_html(content))
        }
    }
}

fn render_inline(spans: &[Span]) -> String {
    spans.iter().map(render_span).collect()
}

/// Inline content of a block. Code blocks ignore span styling and escape the
/// raw concatenated text.
fn block_content(block: &Block) -> String {
    if block.kind == BlockKind::Code {
        let raw: String = block
            .spans
            .iter()
            .filter_map(|span| match span {
                Span::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        return escape_html(&raw);
    }
    render_inline(&block.spans)
}

struct Renderer<'a> {
    index: HashMap<&'a str, &'a Block>,
    rendered: HashSet<&'a str>,
    toc: Vec<TocEntry>,
}

impl<'a> Renderer<'a> {
    fn resolve_children(&self, block: &'a Block) -> Vec<&'a Block> {
        block
            .children
            .iter()
            .filter_map(|id| self.index.get(id.as_str()).copied())
            .collect()
    }

    fn render_block(&mut self, block: &'a Block) -> String {
        // Each block renders at most once; duplicate or cyclic child
        // references after the first occurrence yield nothing.
        if !self.rendered.insert(&block.id) {
            return String::new();
        }

        let children = self.resolve_children(block);
        let content = block_content(block);

        if let BlockKind::Heading(level) = block.kind {
            let text = plain_text(&block.spans);
            let id = anchor_id(if text.is_empty() { &block.id } else { &text });
            let toc_text = if text.trim().is_empty() {
                format!("Heading {level}")
            } else {
                text.trim().to_string()
            };
            self.toc.push(TocEntry {
                id: id.clone(),
                level,
                text: toc_text,
            });
            let body = if content.is_empty() {
                escape_html(&text)
            } else {
                content
            };
            return format!(
                "<h{level} id=\"{id}\" class=\"wsp-h wsp-h{level}\">{body}</h{level}>{}",
                self.render_children(&children)
            );
        }

        match &block.kind {
            BlockKind::Page => self.render_children(&children),
            BlockKind::Text => {
                format!("<p class=\"wsp-p\">{content}</p>{}", self.render_children(&children))
            }
            BlockKind::Quote => {
                let inner = if content.is_empty() {
                    self.render_children(&children)
                } else {
                    content
                };
                format!("<blockquote class=\"wsp-quote\">{inner}</blockquote>")
            }
            BlockKind::Code => {
                let lang_class = block.language.as_deref().map_or_else(String::new, |lang| {
                    format!("language-{}", escape_html(lang))
                });
                format!(
                    "<pre class=\"wsp-pre\"><code class=\"wsp-code {lang_class}\">{content}</code></pre>{}",
                    self.render_children(&children)
                )
            }
            BlockKind::Divider => {
                format!("<hr class=\"wsp-hr\" />{}", self.render_children(&children))
            }
            BlockKind::Callout => {
                let inner = if content.is_empty() {
                    self.render_children(&children)
                } else {
                    content
                };
                format!("<aside class=\"wsp-callout\">{inner}</aside>")
            }
            BlockKind::Image => {
                "<div class=\"wsp-unsupported\">[Image block not yet supported]</div>".to_string()
            }
            BlockKind::File => {
                "<div class=\"wsp-unsupported\">[File block not yet supported]</div>".to_string()
            }
            BlockKind::Table => {
                "<div class=\"wsp-unsupported\">[Table block not yet supported]</div>".to_string()
            }
            // List items only render inside a sibling run; one reached here
            // sits at the top level with no grouping context.
            BlockKind::Bullet | BlockKind::Ordered | BlockKind::Todo => {
                "<div class=\"wsp-unsupported\">[List item at root]</div>".to_string()
            }
            BlockKind::Unknown(tag) => format!(
                "<div class=\"wsp-unknown\" data-block-type=\"{}\">{content}{}</div>",
                escape_html(tag),
                self.render_children(&children)
            ),
            BlockKind::Heading(_) => unreachable!(),
        }
    }

    fn render_children(&mut self, children: &[&'a Block]) -> String {
        if children.is_empty() {
            return String::new();
        }

        let mut html = String::new();
        let mut i = 0;
        while i < children.len() {
            let kind = &children[i].kind;
            match kind {
                BlockKind::Bullet | BlockKind::Ordered => {
                    let (tag, class) = if *kind == BlockKind::Ordered {
                        ("ol", "wsp-ol")
                    } else {
                        ("ul", "wsp-ul")
                    };
                    let mut items = String::new();
                    while i < children.len() && children[i].kind == *kind {
                        let item = children[i];
                        let item_children = self.resolve_children(item);
                        items.push_str(&format!(
                            "<li class=\"wsp-li\">{}{}</li>",
                            block_content(item),
                            self.render_children(&item_children)
                        ));
                        self.rendered.insert(&item.id);
                        i += 1;
                    }
                    html.push_str(&format!("<{tag} class=\"{class}\">{items}</{tag}>"));
                }
                BlockKind::Todo => {
                    let mut items = String::new();
                    while i < children.len() && children[i].kind == BlockKind::Todo {
                        let item = children[i];
                        let item_children = self.resolve_children(item);
                        let checked = if item.done { "checked" } else { "" };
                        items.push_str(&format!(
                            "<li class=\"wsp-li\"><label class=\"wsp-todo\"><input type=\"checkbox\" disabled {checked}/> <span>{}</span></label>{}</li>",
                            block_content(item),
                            self.render_children(&item_children)
                        ));
                        self.rendered.insert(&item.id);
                        i += 1;
                    }
                    html.push_str(&format!("<ul class=\"wsp-ul\">{items}</ul>"));
                }
                _ => {
                    html.push_str(&self.render_block(children[i]));
                    i += 1;
                }
            }
        }
        html
    }
}

/// Render a flat block collection to HTML.
///
/// Roots are the blocks whose parent id is absent or unknown. If a
/// page-typed root exists it is the sole entry point, otherwise all roots
/// render in input order.
#[must_use]
pub fn render_blocks(blocks: &[Block]) -> RenderResult {
    let index: HashMap<&str, &Block> = blocks.iter().map(|b| (b.id.as_str(), b)).collect();

    let roots: Vec<&Block> = blocks
        .iter()
        .filter(|b| {
            b.parent_id
                .as_deref()
                .is_none_or(|pid| !index.contains_key(pid))
        })
        .collect();

    let mut renderer = Renderer {
        index,
        rendered: HashSet::new(),
        toc: Vec::new(),
    };

    let html = match roots.iter().find(|r| r.kind == BlockKind::Page) {
        Some(page_root) => renderer.render_block(page_root),
        None => roots
            .iter()
            .map(|root| renderer.render_block(root))
            .collect(),
    };

    let hash = hex::encode(Sha256::digest(html.as_bytes()));
    RenderResult {
        html,
        toc: renderer.toc,
        hash,
    }
}
