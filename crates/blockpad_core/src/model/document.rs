//! Document aggregate.
//!
//! # Responsibility
//! - Own the ordered block sequence, title, and modification timestamp.
//! - Provide identity-based lookups used by focus and drag targeting.
//!
//! # Invariants
//! - The block sequence is never empty and block ids are unique within it.
//! - `updated_at` strictly increases on every applied mutation.
//! - Blocks are mutated only through `editor::DocumentEditor`.

use crate::model::block::{Block, BlockId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable document identifier.
pub type DocumentId = Uuid;

/// Title given to documents created without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Ordered sequence of blocks plus document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub id: DocumentId,
    title: String,
    blocks: Vec<Block>,
    /// Unix epoch milliseconds of the last applied mutation.
    updated_at: i64,
}

#[derive(Deserialize)]
struct DocumentRecord {
    id: DocumentId,
    title: String,
    blocks: Vec<Block>,
    updated_at: i64,
}

impl From<DocumentRecord> for Document {
    fn from(value: DocumentRecord) -> Self {
        Self::from_parts(value.id, value.title, value.blocks, value.updated_at)
    }
}

impl Document {
    /// Creates a document seeded with one empty text block.
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_parts(Uuid::new_v4(), title.into(), Vec::new(), now_epoch_ms())
    }

    /// Rebuilds a document from stored parts.
    ///
    /// Repairs applied on the way in: an empty block list gets one empty text
    /// block, empty lists get one empty item, repeated block ids are re-keyed,
    /// and a blank title falls back to `DEFAULT_TITLE`.
    pub fn from_parts(
        id: DocumentId,
        title: impl Into<String>,
        mut blocks: Vec<Block>,
        updated_at: i64,
    ) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::text(""));
        }
        let mut seen = HashSet::with_capacity(blocks.len());
        for block in &mut blocks {
            block.content.ensure_list_item();
            if !seen.insert(block.id) {
                block.id = BlockId::new();
                seen.insert(block.id);
            }
        }
        Self {
            id,
            title: normalize_title(title.into()),
            blocks,
            updated_at,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Whether the title is still the placeholder.
    pub fn is_untitled(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Current position of a block, resolved by identity.
    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.replace_title(title);
        self.touch();
    }

    /// Title change folded into another mutation's timestamp bump.
    pub(crate) fn replace_title(&mut self, title: impl Into<String>) {
        self.title = normalize_title(title.into());
    }

    /// Bumps `updated_at`, never moving it backwards or leaving it unchanged.
    pub(crate) fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at.saturating_add(1));
    }
}

fn normalize_title(title: String) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{Document, DEFAULT_TITLE};
    use uuid::Uuid;

    #[test]
    fn new_document_has_one_text_block() {
        let document = Document::new("Plan");
        assert_eq!(document.len(), 1);
        assert_eq!(document.title(), "Plan");
        assert_eq!(document.blocks()[0].extract_content(), "");
    }

    #[test]
    fn from_parts_repairs_empty_sequence_and_blank_title() {
        let document = Document::from_parts(Uuid::new_v4(), "   ", Vec::new(), 42);
        assert_eq!(document.len(), 1);
        assert_eq!(document.title(), DEFAULT_TITLE);
        assert_eq!(document.updated_at(), 42);
    }

    #[test]
    fn touch_always_moves_forward() {
        let mut document = Document::from_parts(Uuid::new_v4(), "Future", Vec::new(), i64::MAX - 1);
        document.touch();
        assert_eq!(document.updated_at(), i64::MAX);
    }

    #[test]
    fn deserialization_repairs_empty_blocks() {
        let value = serde_json::json!({
            "id": "11111111-2222-4333-8444-555555555555",
            "title": "Stored",
            "blocks": [],
            "updated_at": 7
        });
        let document: Document = serde_json::from_value(value).expect("document should decode");
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn from_parts_repairs_empty_lists_and_repeated_ids() {
        use crate::model::block::{Block, BlockContent};

        let shared = Block::text("first");
        let empty_list = Block {
            id: Default::default(),
            content: BlockContent::NumberedList { items: Vec::new() },
        };
        let document = Document::from_parts(
            Uuid::new_v4(),
            "Repaired",
            vec![shared.clone(), shared.clone(), empty_list],
            1,
        );

        let blocks = document.blocks();
        assert_eq!(blocks[0].id, shared.id);
        assert_ne!(blocks[1].id, shared.id);
        assert!(matches!(
            &blocks[2].content,
            BlockContent::NumberedList { items } if items.len() == 1
        ));
    }
}
