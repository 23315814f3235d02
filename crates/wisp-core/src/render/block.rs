//! Typed block model for the renderer.
//!
//! Blocks arrive as a flat list linked by id: each block names its parent and
//! its children by id rather than owning them. The renderer indexes this list
//! into an arena and walks it by id, so forward references and duplicate
//! child references are tolerated.

use serde::{Deserialize, Serialize};

/// Inline style flags on a text run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub inline_code: bool,
    #[serde(default)]
    pub link: Option<String>,
}

/// One inline element of a block's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Span {
    /// A styled text run
    Text { content: String, style: SpanStyle },
    /// A user mention, rendered as an anonymized placeholder
    Mention,
    /// An inline equation, rendered as its raw source
    Equation(String),
}

impl Span {
    /// Unstyled text run
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            style: SpanStyle::default(),
        }
    }

    /// Styled text run
    pub fn styled(content: impl Into<String>, style: SpanStyle) -> Self {
        Self::Text {
            content: content.into(),
            style,
        }
    }
}

/// Block type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Document root
    Page,
    /// Paragraph
    Text,
    /// Heading, level 1..=6
    Heading(u8),
    /// Bulleted list item
    Bullet,
    /// Ordered list item
    Ordered,
    /// Checklist item
    Todo,
    Quote,
    Code,
    Divider,
    Callout,
    Image,
    File,
    Table,
    /// Anything the renderer does not recognize, carrying the raw type tag
    Unknown(String),
}

/// One content block in the flat collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    pub kind: BlockKind,
    /// Inline content for text-bearing kinds
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Language token for code blocks
    #[serde(default)]
    pub language: Option<String>,
    /// Done flag for checklist items
    #[serde(default)]
    pub done: bool,
}

impl Block {
    /// A block with no inline content
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            children: Vec::new(),
            kind,
            spans: Vec::new(),
            language: None,
            done: false,
        }
    }

    /// A text-bearing block with the given spans
    pub fn with_spans(id: impl Into<String>, kind: BlockKind, spans: Vec<Span>) -> Self {
        Self {
            spans,
            ..Self::new(id, kind)
        }
    }

    #[must_use]
    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn children(mut self, ids: &[&str]) -> Self {
        self.children = ids.iter().map(|&s| s.to_string()).collect();
        self
    }
}
