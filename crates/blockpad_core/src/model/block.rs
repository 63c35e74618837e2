//! Block domain model.
//!
//! # Responsibility
//! - Define the tagged union of block payloads (`BlockContent`).
//! - Define the lossy extract/seed contract used by block type conversion.
//!
//! # Invariants
//! - `BlockId` is immutable once created and never reused for another block.
//! - List-type blocks always hold at least one item.
//! - Heading levels stay within `1..=3`.
//! - Conversion never fails; structure with no target equivalent is dropped.

use crate::model::block_type::BlockType;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable, position-independent identity of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    /// Generates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an identity that already exists externally (storage, import).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one item inside a list-type block.
///
/// Scoped to its parent block: lookups are always `(BlockId, ItemId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a bulleted or numbered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ItemId,
    pub text: String,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
        }
    }
}

/// One checkbox entry of a to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: ItemId,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            done: false,
        }
    }
}

/// Heading level clamped to `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const ONE: Self = Self(1);
    pub const TWO: Self = Self(2);
    pub const THREE: Self = Self(3);

    /// Builds a level, clamping out-of-range input into `1..=3`.
    pub fn new(level: i64) -> Self {
        Self(level.clamp(1, 3) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for HeadingLevel {
    fn from(value: u8) -> Self {
        Self::new(i64::from(value))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(value: HeadingLevel) -> Self {
        value.0
    }
}

/// Visual emphasis of a callout block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutStyle {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

/// Execution state of an agent block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Prompt not sent yet.
    #[default]
    Idle,
    /// Completion request in flight.
    Running,
    /// Response written into `content`.
    Done,
    /// Last completion request failed.
    Failed,
}

/// Payload of one block. Serialized with an internal `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockContent {
    Text {
        text: String,
    },
    Heading {
        level: HeadingLevel,
        text: String,
    },
    BulletList {
        items: Vec<ListItem>,
    },
    NumberedList {
        items: Vec<ListItem>,
    },
    Todo {
        items: Vec<TodoItem>,
    },
    Code {
        content: String,
        #[serde(default)]
        language: Option<String>,
    },
    Quote {
        content: String,
        #[serde(default)]
        attribution: Option<String>,
    },
    Divider,
    Callout {
        content: String,
        #[serde(default)]
        style: CalloutStyle,
    },
    Image {
        url: String,
        #[serde(default)]
        caption: String,
    },
    Agent {
        prompt: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        status: AgentStatus,
    },
}

impl BlockContent {
    /// Returns the registry type describing this payload.
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Text { .. } => BlockType::Text,
            Self::Heading { level, .. } => BlockType::heading(*level),
            Self::BulletList { .. } => BlockType::BulletList,
            Self::NumberedList { .. } => BlockType::NumberedList,
            Self::Todo { .. } => BlockType::Todo,
            Self::Code { .. } => BlockType::Code,
            Self::Quote { .. } => BlockType::Quote,
            Self::Divider => BlockType::Divider,
            Self::Callout { .. } => BlockType::Callout,
            Self::Image { .. } => BlockType::Image,
            Self::Agent { .. } => BlockType::Agent,
        }
    }

    /// Best-effort textual content used to seed a converted block.
    ///
    /// Lists contribute their first item only.
    pub fn extract_content(&self) -> String {
        match self {
            Self::Text { text } | Self::Heading { text, .. } => text.clone(),
            Self::BulletList { items } | Self::NumberedList { items } => items
                .first()
                .map(|item| item.text.clone())
                .unwrap_or_default(),
            Self::Todo { items } => items
                .first()
                .map(|item| item.text.clone())
                .unwrap_or_default(),
            Self::Code { content, .. }
            | Self::Quote { content, .. }
            | Self::Callout { content, .. } => content.clone(),
            Self::Divider => String::new(),
            Self::Image { caption, .. } => caption.clone(),
            Self::Agent {
                prompt, content, ..
            } => {
                if content.is_empty() {
                    prompt.clone()
                } else {
                    content.clone()
                }
            }
        }
    }

    /// Seeds this payload with plain text.
    ///
    /// Lists are replaced by one item holding `text`; dividers ignore it.
    pub fn set_content(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self {
            Self::Text { text: slot } | Self::Heading { text: slot, .. } => *slot = text,
            Self::BulletList { items } | Self::NumberedList { items } => {
                *items = vec![ListItem::new(text)];
            }
            Self::Todo { items } => *items = vec![TodoItem::new(text)],
            Self::Code { content, .. }
            | Self::Quote { content, .. }
            | Self::Callout { content, .. } => *content = text,
            Self::Divider => {}
            Self::Image { caption, .. } => *caption = text,
            Self::Agent { prompt, .. } => *prompt = text,
        }
    }

    /// Builds the payload of `target` seeded from this payload.
    ///
    /// List-to-list conversion keeps every item and its identity; todo
    /// completion does not survive. Everything else goes through
    /// `extract_content` then `set_content`.
    pub fn converted_to(&self, target: BlockType) -> BlockContent {
        if target.is_list() {
            if let Some(items) = self.list_items() {
                return list_content(target, items);
            }
        }

        let mut content = target.default_content();
        content.set_content(self.extract_content());
        content
    }

    /// Whole-block text, list items joined by newlines.
    pub fn plain_text(&self) -> String {
        match self {
            Self::BulletList { items } | Self::NumberedList { items } => items
                .iter()
                .map(|item| item.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Todo { items } => items
                .iter()
                .map(|item| item.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.extract_content(),
        }
    }

    /// Seeds an empty list with one empty item. Returns whether it changed.
    pub(crate) fn ensure_list_item(&mut self) -> bool {
        match self {
            Self::BulletList { items } | Self::NumberedList { items } if items.is_empty() => {
                items.push(ListItem::new(""));
                true
            }
            Self::Todo { items } if items.is_empty() => {
                items.push(TodoItem::new(""));
                true
            }
            _ => false,
        }
    }

    fn list_items(&self) -> Option<Vec<ListItem>> {
        match self {
            Self::BulletList { items } | Self::NumberedList { items } => Some(items.clone()),
            Self::Todo { items } => Some(
                items
                    .iter()
                    .map(|item| ListItem {
                        id: item.id,
                        text: item.text.clone(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

fn list_content(target: BlockType, items: Vec<ListItem>) -> BlockContent {
    match target {
        BlockType::NumberedList => BlockContent::NumberedList { items },
        BlockType::Todo => BlockContent::Todo {
            items: items
                .into_iter()
                .map(|item| TodoItem {
                    id: item.id,
                    text: item.text,
                    done: false,
                })
                .collect(),
        },
        _ => BlockContent::BulletList { items },
    }
}

/// One typed unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BlockRecord")]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub content: BlockContent,
}

#[derive(Deserialize)]
struct BlockRecord {
    id: BlockId,
    #[serde(flatten)]
    content: BlockContent,
}

impl From<BlockRecord> for Block {
    fn from(value: BlockRecord) -> Self {
        Self::with_id(value.id, value.content)
    }
}

impl Block {
    /// Creates a block with a freshly generated identity.
    pub fn new(content: BlockContent) -> Self {
        Self::with_id(BlockId::new(), content)
    }

    /// Creates a block with a caller-provided identity.
    ///
    /// An empty list payload is seeded with one empty item.
    pub fn with_id(id: BlockId, mut content: BlockContent) -> Self {
        content.ensure_list_item();
        Self { id, content }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(BlockContent::Text { text: text.into() })
    }

    pub fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self::new(BlockContent::Heading {
            level,
            text: text.into(),
        })
    }

    /// Bulleted list; an empty `items` yields one empty item.
    pub fn bullet_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<ListItem> = items.into_iter().map(ListItem::new).collect();
        if items.is_empty() {
            items.push(ListItem::new(""));
        }
        Self::new(BlockContent::BulletList { items })
    }

    pub fn code(content: impl Into<String>, language: Option<String>) -> Self {
        Self::new(BlockContent::Code {
            content: content.into(),
            language,
        })
    }

    pub fn quote(content: impl Into<String>) -> Self {
        Self::new(BlockContent::Quote {
            content: content.into(),
            attribution: None,
        })
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    pub fn extract_content(&self) -> String {
        self.content.extract_content()
    }

    pub fn plain_text(&self) -> String {
        self.content.plain_text()
    }

    /// Deep copy carrying a new `BlockId`.
    pub fn duplicate(&self) -> Self {
        Self::new(self.content.clone())
    }

    /// Lossy conversion into `target`; the result carries a new `BlockId`.
    pub fn converted_to(&self, target: BlockType) -> Self {
        Self::new(self.content.converted_to(target))
    }
}
