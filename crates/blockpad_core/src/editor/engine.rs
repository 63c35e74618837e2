//! Document sequence engine.
//!
//! # Responsibility
//! - Apply insert/delete/move/duplicate/convert operations to one document.
//! - Track the focused block by identity.
//! - Provide identity-based content edits for text and list items.
//!
//! # Invariants
//! - The document never drops below one block; deleting the last block is a no-op.
//! - Every applied operation bumps `Document::updated_at` exactly once.
//! - No-op outcomes (out-of-range index, refused delete, `move(i, i)`) leave
//!   the document untouched, including `updated_at`.
//! - Duplicates and converted blocks always carry a new `BlockId`.
//! - Block ids are unique within the document; inserted batches are re-keyed
//!   on collision.

use crate::editor::reorder::resolve_move;
use crate::model::block::{
    AgentStatus, Block, BlockContent, BlockId, CalloutStyle, ItemId, ListItem, TodoItem,
};
use crate::model::block_type::BlockType;
use crate::model::document::Document;
use log::debug;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from identity-based editor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// No block with this id exists in the document.
    BlockNotFound(BlockId),
    /// The block exists but has no item with this id.
    ItemNotFound { block_id: BlockId, item_id: ItemId },
    /// The operation does not apply to this block's type.
    UnsupportedBlockType {
        block_id: BlockId,
        block_type: BlockType,
    },
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockNotFound(id) => write!(f, "block not found: {id}"),
            Self::ItemNotFound { block_id, item_id } => {
                write!(f, "item {item_id} not found in block {block_id}")
            }
            Self::UnsupportedBlockType {
                block_id,
                block_type,
            } => write!(
                f,
                "operation not supported for block {block_id} of type {block_type}"
            ),
        }
    }
}

impl Error for EditorError {}

/// Single-session mutator for one document.
#[derive(Debug, Clone)]
pub struct DocumentEditor {
    document: Document,
    focused: Option<BlockId>,
}

impl DocumentEditor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            focused: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn focused(&self) -> Option<BlockId> {
        self.focused
    }

    /// Points focus at an existing block.
    pub fn set_focus(&mut self, id: BlockId) -> Result<(), EditorError> {
        if self.document.index_of(id).is_none() {
            return Err(EditorError::BlockNotFound(id));
        }
        self.focused = Some(id);
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Replaces the title; blank input resets it to the placeholder.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.set_title(title);
        debug!("event=title_set module=editor status=ok");
    }

    /// Inserts a default block of `block_type` at `at`, clamped to `[0, len]`.
    ///
    /// The new block takes focus.
    pub fn insert(&mut self, block_type: BlockType, at: usize) -> BlockId {
        let block = block_type.create_block();
        let id = block.id;
        let index = at.min(self.document.len());
        self.document.blocks_mut().insert(index, block);
        self.focused = Some(id);
        self.document.touch();
        debug!(
            "event=block_insert module=editor status=ok index={} block_type={}",
            index, block_type
        );
        id
    }

    /// Inserts a prepared batch at `at` (clamped) with a single timestamp bump.
    ///
    /// Blocks whose id is already in the document (or earlier in the batch)
    /// get a fresh id. Focus moves to the last inserted block. Returns the
    /// number inserted.
    pub fn insert_blocks(&mut self, at: usize, mut blocks: Vec<Block>) -> usize {
        if blocks.is_empty() {
            return 0;
        }
        let mut seen: HashSet<BlockId> =
            self.document.blocks().iter().map(|block| block.id).collect();
        let mut reassigned = 0usize;
        for block in &mut blocks {
            if !seen.insert(block.id) {
                block.id = BlockId::new();
                seen.insert(block.id);
                reassigned += 1;
            }
        }

        let index = at.min(self.document.len());
        let count = blocks.len();
        let last_id = blocks.last().map(|block| block.id);
        self.document
            .blocks_mut()
            .splice(index..index, blocks);
        self.focused = last_id;
        self.document.touch();
        debug!(
            "event=block_insert_batch module=editor status=ok index={} count={} reassigned_ids={}",
            index, count, reassigned
        );
        count
    }

    /// Inserts an imported batch, adopting `suggested_title` while the
    /// document is still untitled. Bumps `updated_at` once for the whole batch.
    pub fn insert_imported(
        &mut self,
        at: usize,
        blocks: Vec<Block>,
        suggested_title: &str,
    ) -> usize {
        if blocks.is_empty() {
            return 0;
        }
        if self.document.is_untitled() {
            self.document.replace_title(suggested_title);
        }
        self.insert_blocks(at, blocks)
    }

    /// Removes the block at `at`.
    ///
    /// Returns `None` without touching the document when `at` is out of range
    /// or when the block is the only one left.
    pub fn delete(&mut self, at: usize) -> Option<Block> {
        let len = self.document.len();
        if at >= len {
            debug!(
                "event=block_delete module=editor status=skipped reason=out_of_range index={} len={}",
                at, len
            );
            return None;
        }
        if len == 1 {
            debug!("event=block_delete module=editor status=skipped reason=last_block");
            return None;
        }

        let removed = self.document.blocks_mut().remove(at);
        if self.focused == Some(removed.id) {
            let neighbour = at.saturating_sub(1);
            self.focused = self.document.blocks().get(neighbour).map(|block| block.id);
        }
        self.document.touch();
        debug!(
            "event=block_delete module=editor status=ok index={} block_type={}",
            at,
            removed.block_type()
        );
        Some(removed)
    }

    /// Moves the block at `from` so it lands at `to`.
    ///
    /// Remove-then-insert; `to` is clamped after removal. Returns `false` when
    /// nothing changed.
    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        let len = self.document.len();
        if from == to || from >= len {
            return false;
        }
        let target = to.min(len - 1);
        if target == from {
            return false;
        }

        let block = self.document.blocks_mut().remove(from);
        self.document.blocks_mut().insert(target, block);
        self.document.touch();
        debug!(
            "event=block_move module=editor status=ok from={} to={}",
            from, target
        );
        true
    }

    /// Drops `source` onto `destination`, resolving both by identity now.
    pub fn move_by_id(&mut self, source: BlockId, destination: BlockId) -> bool {
        match resolve_move(&self.document, source, destination) {
            Some((from, to)) => self.move_block(from, to),
            None => false,
        }
    }

    /// Deep-copies the block at `at` under a new id, right after the source.
    ///
    /// The duplicate takes focus.
    pub fn duplicate(&mut self, at: usize) -> Option<BlockId> {
        let copy = self.document.blocks().get(at)?.duplicate();
        let id = copy.id;
        self.document.blocks_mut().insert(at + 1, copy);
        self.focused = Some(id);
        self.document.touch();
        debug!(
            "event=block_duplicate module=editor status=ok index={}",
            at
        );
        Some(id)
    }

    /// Replaces the block at `at` with a lossy conversion to `new_type`.
    ///
    /// The replacement has a new id. Focus on the replaced block is cleared;
    /// callers re-point it using the returned id. Converting a block to its
    /// own type is a no-op.
    pub fn convert_type(&mut self, at: usize, new_type: BlockType) -> Option<BlockId> {
        let current = self.document.blocks().get(at)?;
        let old_type = current.block_type();
        if old_type == new_type {
            return None;
        }
        let old_id = current.id;
        let converted = current.converted_to(new_type);
        let id = converted.id;

        self.document.blocks_mut()[at] = converted;
        if self.focused == Some(old_id) {
            self.focused = None;
        }
        self.document.touch();
        debug!(
            "event=block_convert module=editor status=ok index={} from={} to={}",
            at, old_type, new_type
        );
        Some(id)
    }

    /// Seeds a block with plain text via the set-content contract.
    pub fn set_text(&mut self, id: BlockId, text: impl Into<String>) -> Result<(), EditorError> {
        self.block_mut(id)?.content.set_content(text);
        self.document.touch();
        Ok(())
    }

    /// Inserts a list item after `after`, or at the front when `after` is `None`.
    pub fn insert_list_item(
        &mut self,
        block_id: BlockId,
        after: Option<ItemId>,
        text: impl Into<String>,
    ) -> Result<ItemId, EditorError> {
        let text = text.into();
        let block = self.block_mut(block_id)?;
        let item_id = match &mut block.content {
            BlockContent::BulletList { items } | BlockContent::NumberedList { items } => {
                insert_entry(items, block_id, after, ListItem::new(text))?
            }
            BlockContent::Todo { items } => {
                insert_entry(items, block_id, after, TodoItem::new(text))?
            }
            other => return Err(unsupported(block_id, other)),
        };
        self.document.touch();
        Ok(item_id)
    }

    /// Replaces the text of one list item.
    pub fn update_list_item(
        &mut self,
        block_id: BlockId,
        item_id: ItemId,
        text: impl Into<String>,
    ) -> Result<(), EditorError> {
        let text = text.into();
        let block = self.block_mut(block_id)?;
        match &mut block.content {
            BlockContent::BulletList { items } | BlockContent::NumberedList { items } => {
                entry_mut(items, block_id, item_id)?.set_text(text);
            }
            BlockContent::Todo { items } => entry_mut(items, block_id, item_id)?.set_text(text),
            other => return Err(unsupported(block_id, other)),
        }
        self.document.touch();
        Ok(())
    }

    /// Removes one list item.
    ///
    /// Returns `Ok(false)` when the item is the last one in its list.
    pub fn remove_list_item(
        &mut self,
        block_id: BlockId,
        item_id: ItemId,
    ) -> Result<bool, EditorError> {
        let block = self.block_mut(block_id)?;
        let removed = match &mut block.content {
            BlockContent::BulletList { items } | BlockContent::NumberedList { items } => {
                remove_entry(items, block_id, item_id)?
            }
            BlockContent::Todo { items } => remove_entry(items, block_id, item_id)?,
            other => return Err(unsupported(block_id, other)),
        };
        if removed {
            self.document.touch();
        }
        Ok(removed)
    }

    /// Flips a to-do item and returns its new completion state.
    pub fn toggle_todo_item(
        &mut self,
        block_id: BlockId,
        item_id: ItemId,
    ) -> Result<bool, EditorError> {
        let block = self.block_mut(block_id)?;
        let done = match &mut block.content {
            BlockContent::Todo { items } => {
                let item = entry_mut(items, block_id, item_id)?;
                item.done = !item.done;
                item.done
            }
            other => return Err(unsupported(block_id, other)),
        };
        self.document.touch();
        Ok(done)
    }

    pub fn set_code_language(
        &mut self,
        block_id: BlockId,
        language: Option<String>,
    ) -> Result<(), EditorError> {
        let block = self.block_mut(block_id)?;
        match &mut block.content {
            BlockContent::Code { language: slot, .. } => {
                *slot = language.filter(|value| !value.trim().is_empty());
            }
            other => return Err(unsupported(block_id, other)),
        }
        self.document.touch();
        Ok(())
    }

    pub fn set_callout_style(
        &mut self,
        block_id: BlockId,
        style: CalloutStyle,
    ) -> Result<(), EditorError> {
        let block = self.block_mut(block_id)?;
        match &mut block.content {
            BlockContent::Callout { style: slot, .. } => *slot = style,
            other => return Err(unsupported(block_id, other)),
        }
        self.document.touch();
        Ok(())
    }

    pub fn set_image_url(
        &mut self,
        block_id: BlockId,
        url: impl Into<String>,
    ) -> Result<(), EditorError> {
        let url = url.into();
        let block = self.block_mut(block_id)?;
        match &mut block.content {
            BlockContent::Image { url: slot, .. } => *slot = url,
            other => return Err(unsupported(block_id, other)),
        }
        self.document.touch();
        Ok(())
    }

    /// Returns the prompt of an agent block.
    pub fn agent_prompt(&self, block_id: BlockId) -> Result<String, EditorError> {
        let block = self
            .document
            .block(block_id)
            .ok_or(EditorError::BlockNotFound(block_id))?;
        match &block.content {
            BlockContent::Agent { prompt, .. } => Ok(prompt.clone()),
            other => Err(unsupported(block_id, other)),
        }
    }

    /// Updates agent execution state, replacing `content` when provided.
    pub fn set_agent_state(
        &mut self,
        block_id: BlockId,
        status: AgentStatus,
        content: Option<String>,
    ) -> Result<(), EditorError> {
        let block = self.block_mut(block_id)?;
        match &mut block.content {
            BlockContent::Agent {
                content: slot,
                status: status_slot,
                ..
            } => {
                *status_slot = status;
                if let Some(content) = content {
                    *slot = content;
                }
            }
            other => return Err(unsupported(block_id, other)),
        }
        self.document.touch();
        Ok(())
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, EditorError> {
        self.document
            .block_mut(id)
            .ok_or(EditorError::BlockNotFound(id))
    }
}

/// Shared shape of list and to-do entries.
trait ListEntry {
    fn id(&self) -> ItemId;
    fn set_text(&mut self, text: String);
}

impl ListEntry for ListItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl ListEntry for TodoItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

fn insert_entry<T: ListEntry>(
    items: &mut Vec<T>,
    block_id: BlockId,
    after: Option<ItemId>,
    entry: T,
) -> Result<ItemId, EditorError> {
    let index = match after {
        Some(item_id) => position(items, block_id, item_id)? + 1,
        None => 0,
    };
    let id = entry.id();
    items.insert(index, entry);
    Ok(id)
}

fn entry_mut<T: ListEntry>(
    items: &mut [T],
    block_id: BlockId,
    item_id: ItemId,
) -> Result<&mut T, EditorError> {
    items
        .iter_mut()
        .find(|item| item.id() == item_id)
        .ok_or(EditorError::ItemNotFound { block_id, item_id })
}

fn remove_entry<T: ListEntry>(
    items: &mut Vec<T>,
    block_id: BlockId,
    item_id: ItemId,
) -> Result<bool, EditorError> {
    let index = position(items, block_id, item_id)?;
    if items.len() == 1 {
        return Ok(false);
    }
    items.remove(index);
    Ok(true)
}

fn position<T: ListEntry>(
    items: &[T],
    block_id: BlockId,
    item_id: ItemId,
) -> Result<usize, EditorError> {
    items
        .iter()
        .position(|item| item.id() == item_id)
        .ok_or(EditorError::ItemNotFound { block_id, item_id })
}

fn unsupported(block_id: BlockId, content: &BlockContent) -> EditorError {
    EditorError::UnsupportedBlockType {
        block_id,
        block_type: content.block_type(),
    }
}
