//! Wire representation of remote document blocks and its conversion into the
//! renderer's typed model.

use serde::Deserialize;

use crate::render::{Block, BlockKind, Span, SpanStyle};

#[derive(Debug, Clone, Deserialize)]
pub struct WireBlock {
    pub block_id: String,
    pub block_type: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub text: Option<WireElements>,
    #[serde(default)]
    pub heading: Option<WireElements>,
    #[serde(default)]
    pub code: Option<WireCode>,
    #[serde(default)]
    pub todo: Option<WireTodo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireElements {
    #[serde(default)]
    pub elements: Vec<WireElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireCode {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub elements: Vec<WireElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTodo {
    #[serde(default)]
    pub is_done: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireElement {
    #[serde(default)]
    pub text_run: Option<WireTextRun>,
    #[serde(default)]
    pub mention_user: Option<WireMention>,
    #[serde(default)]
    pub equation: Option<WireEquation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub text_element_style: Option<WireStyle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireStyle {
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
    pub link: Option<WireLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLink {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMention {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEquation {
    #[serde(default)]
    pub content: Option<String>,
}

fn parse_kind(tag: &str) -> BlockKind {
    if let Some(digit) = tag.strip_prefix("heading") {
        if let Ok(level) = digit.parse::<u8>() {
            if (1..=6).contains(&level) {
                return BlockKind::Heading(level);
            }
        }
    }
    match tag {
        "page" => BlockKind::Page,
        "text" | "paragraph" => BlockKind::Text,
        "bullet" => BlockKind::Bullet,
        "ordered" => BlockKind::Ordered,
        "todo" => BlockKind::Todo,
        "quote" => BlockKind::Quote,
        "code" => BlockKind::Code,
        "divider" => BlockKind::Divider,
        "callout" => BlockKind::Callout,
        "image" => BlockKind::Image,
        "file" => BlockKind::File,
        "table" => BlockKind::Table,
        other => BlockKind::Unknown(other.to_string()),
    }
}

fn parse_span(element: &WireElement) -> Option<Span> {
    if let Some(run) = &element.text_run {
        let wire_style = run.text_element_style.clone().unwrap_or_default();
        let style = SpanStyle {
            bold: wire_style.bold,
            italic: wire_style.italic,
            underline: wire_style.underline,
            strikethrough: wire_style.strikethrough,
            inline_code: wire_style.inline_code,
            link: wire_style.link.and_then(|link| link.url),
        };
        return Some(Span::Text {
            content: run.content.clone(),
            style,
        });
    }
    if element
        .mention_user
        .as_ref()
        .is_some_and(|m| m.user_id.is_some())
    {
        return Some(Span::Mention);
    }
    if let Some(content) = element.equation.as_ref().and_then(|eq| eq.content.clone()) {
        return Some(Span::Equation(content));
    }
    None
}

impl From<WireBlock> for Block {
    fn from(wire: WireBlock) -> Self {
        let kind = parse_kind(&wire.block_type);
        let elements = wire
            .text
            .as_ref()
            .map(|t| t.elements.as_slice())
            .or_else(|| wire.heading.as_ref().map(|h| h.elements.as_slice()))
            .or_else(|| wire.code.as_ref().map(|c| c.elements.as_slice()))
            .unwrap_or_default();
        let spans = elements.iter().filter_map(parse_span).collect();

        Self {
            id: wire.block_id,
            parent_id: wire.parent_id,
            children: wire.children,
            kind,
            spans,
            language: wire.code.and_then(|c| c.language),
            done: wire.todo.is_some_and(|t| t.is_done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_tags_parse_to_levels() {
        assert_eq!(parse_kind("heading1"), BlockKind::Heading(1));
        assert_eq!(parse_kind("heading6"), BlockKind::Heading(6));
        assert_eq!(parse_kind("heading7"), BlockKind::Unknown("heading7".to_string()));
        assert_eq!(parse_kind("paragraph"), BlockKind::Text);
    }

    #[test]
    fn test_wire_block_converts_styles_and_payload() {
        let json = r#"{
            "block_id": "b1",
            "block_type": "text",
            "parent_id": "root",
            "children": ["b2"],
            "text": {
                "elements": [
                    {"text_run": {"content": "bold link", "text_element_style": {
                        "bold": true, "link": {"url": "https://example.com"}
                    }}},
                    {"mention_user": {"user_id": "u1"}},
                    {"equation": {"content": "x^2"}}
                ]
            }
        }"#;
        let wire: WireBlock = serde_json::from_str(json).unwrap();
        let block: Block = wire.into();

        assert_eq!(block.kind, BlockKind::Text);
        assert_eq!(block.parent_id.as_deref(), Some("root"));
        assert_eq!(block.children, vec!["b2".to_string()]);
        assert_eq!(block.spans.len(), 3);
        match &block.spans[0] {
            Span::Text { content, style } => {
                assert_eq!(content, "bold link");
                assert!(style.bold);
                assert_eq!(style.link.as_deref(), Some("https://example.com"));
            }
            other => panic!("unexpected span: {other:?}"),
        }
        assert_eq!(block.spans[1], Span::Mention);
        assert_eq!(block.spans[2], Span::Equation("x^2".to_string()));
    }

    #[test]
    fn test_code_and_todo_payloads() {
        let json = r#"{
            "block_id": "c1",
            "block_type": "code",
            "code": {"language": "rust", "elements": [{"text_run": {"content": "fn main() {}"}}]}
        }"#;
        let block: Block = serde_json::from_str::<WireBlock>(json).unwrap().into();
        assert_eq!(block.kind, BlockKind::Code);
        assert_eq!(block.language.as_deref(), Some("rust"));
        assert_eq!(block.spans.len(), 1);

        let json = r#"{"block_id": "t1", "block_type": "todo", "todo": {"is_done": true}}"#;
        let block: Block = serde_json::from_str::<WireBlock>(json).unwrap().into();
        assert_eq!(block.kind, BlockKind::Todo);
        assert!(block.done);
    }
}
