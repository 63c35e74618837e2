//! Block type registry.
//!
//! # Responsibility
//! - Enumerate every creatable block type in declaration order.
//! - Provide display metadata (name, icon id, slash aliases).
//! - Act as factory for default-content blocks.
//!
//! # Invariants
//! - `BlockType::ALL` order is the slash menu order.
//! - Aliases are lowercase; matching against them is case-insensitive.

use crate::model::block::{
    AgentStatus, Block, BlockContent, CalloutStyle, HeadingLevel, ListItem, TodoItem,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Closed, position-independent enumeration of block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Todo,
    Code,
    Quote,
    Divider,
    Callout,
    Image,
    Agent,
}

impl BlockType {
    /// Every block type, in declaration order.
    pub const ALL: [BlockType; 13] = [
        Self::Text,
        Self::Heading1,
        Self::Heading2,
        Self::Heading3,
        Self::BulletList,
        Self::NumberedList,
        Self::Todo,
        Self::Code,
        Self::Quote,
        Self::Divider,
        Self::Callout,
        Self::Image,
        Self::Agent,
    ];

    /// Maps a heading level onto its registry type.
    pub fn heading(level: HeadingLevel) -> Self {
        match level.get() {
            1 => Self::Heading1,
            2 => Self::Heading2,
            _ => Self::Heading3,
        }
    }

    /// Stable snake_case id used in logs and persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::BulletList => "bullet_list",
            Self::NumberedList => "numbered_list",
            Self::Todo => "todo",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Divider => "divider",
            Self::Callout => "callout",
            Self::Image => "image",
            Self::Agent => "agent",
        }
    }

    /// User-facing name shown in the command menu.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Heading1 => "Heading 1",
            Self::Heading2 => "Heading 2",
            Self::Heading3 => "Heading 3",
            Self::BulletList => "Bulleted List",
            Self::NumberedList => "Numbered List",
            Self::Todo => "To-do List",
            Self::Code => "Code",
            Self::Quote => "Quote",
            Self::Divider => "Divider",
            Self::Callout => "Callout",
            Self::Image => "Image",
            Self::Agent => "AI Agent",
        }
    }

    /// Opaque icon identifier resolved by the rendering layer.
    pub fn icon_id(self) -> &'static str {
        match self {
            Self::Text => "text.alignleft",
            Self::Heading1 => "textformat.size.larger",
            Self::Heading2 => "textformat.size",
            Self::Heading3 => "textformat.size.smaller",
            Self::BulletList => "list.bullet",
            Self::NumberedList => "list.number",
            Self::Todo => "checklist",
            Self::Code => "chevron.left.forwardslash.chevron.right",
            Self::Quote => "text.quote",
            Self::Divider => "minus",
            Self::Callout => "exclamationmark.bubble",
            Self::Image => "photo",
            Self::Agent => "sparkles",
        }
    }

    /// Lowercase search aliases for slash commands.
    pub fn slash_aliases(self) -> &'static [&'static str] {
        match self {
            Self::Text => &["text", "paragraph", "plain"],
            Self::Heading1 => &["h1", "heading1", "title"],
            Self::Heading2 => &["h2", "heading2", "subtitle"],
            Self::Heading3 => &["h3", "heading3", "subheading"],
            Self::BulletList => &["bullet", "ul", "unordered", "list"],
            Self::NumberedList => &["numbered", "ol", "ordered", "list"],
            Self::Todo => &["todo", "task", "checkbox", "check"],
            Self::Code => &["code", "snippet", "pre"],
            Self::Quote => &["quote", "blockquote", "citation"],
            Self::Divider => &["divider", "hr", "rule", "separator"],
            Self::Callout => &["callout", "note", "info", "warning"],
            Self::Image => &["image", "img", "picture", "photo"],
            Self::Agent => &["ai", "agent", "ask", "generate"],
        }
    }

    /// Whether this type holds an item list.
    pub fn is_list(self) -> bool {
        matches!(self, Self::BulletList | Self::NumberedList | Self::Todo)
    }

    /// Default (mostly empty) payload for a new block of this type.
    pub fn default_content(self) -> BlockContent {
        match self {
            Self::Text => BlockContent::Text {
                text: String::new(),
            },
            Self::Heading1 => empty_heading(HeadingLevel::ONE),
            Self::Heading2 => empty_heading(HeadingLevel::TWO),
            Self::Heading3 => empty_heading(HeadingLevel::THREE),
            Self::BulletList => BlockContent::BulletList {
                items: vec![ListItem::new("")],
            },
            Self::NumberedList => BlockContent::NumberedList {
                items: vec![ListItem::new("")],
            },
            Self::Todo => BlockContent::Todo {
                items: vec![TodoItem::new("")],
            },
            Self::Code => BlockContent::Code {
                content: String::new(),
                language: None,
            },
            Self::Quote => BlockContent::Quote {
                content: String::new(),
                attribution: None,
            },
            Self::Divider => BlockContent::Divider,
            Self::Callout => BlockContent::Callout {
                content: String::new(),
                style: CalloutStyle::default(),
            },
            Self::Image => BlockContent::Image {
                url: String::new(),
                caption: String::new(),
            },
            Self::Agent => BlockContent::Agent {
                prompt: String::new(),
                content: String::new(),
                status: AgentStatus::default(),
            },
        }
    }

    /// Creates a freshly identified block with default content.
    pub fn create_block(self) -> Block {
        Block::new(self.default_content())
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_heading(level: HeadingLevel) -> BlockContent {
    BlockContent::Heading {
        level,
        text: String::new(),
    }
}
