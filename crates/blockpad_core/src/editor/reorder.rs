//! Drag reorder resolution.
//!
//! # Invariants
//! - Drag gestures capture block identities only, never indices.
//! - Indices are resolved against the current document at drop time.

use crate::editor::engine::DocumentEditor;
use crate::model::block::BlockId;
use crate::model::document::Document;
use log::debug;

/// Resolves a drag source/destination pair into `(from, to)` indices.
///
/// Returns `None` when source and destination are the same block or when
/// either block is no longer part of the document.
pub fn resolve_move(
    document: &Document,
    source: BlockId,
    destination: BlockId,
) -> Option<(usize, usize)> {
    if source == destination {
        return None;
    }
    let from = document.index_of(source)?;
    let to = document.index_of(destination)?;
    Some((from, to))
}

/// In-progress drag of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    source: BlockId,
    target: Option<BlockId>,
}

impl DragGesture {
    pub fn begin(source: BlockId) -> Self {
        Self {
            source,
            target: None,
        }
    }

    pub fn source(&self) -> BlockId {
        self.source
    }

    /// Records the block currently under the pointer.
    pub fn hover(&mut self, target: BlockId) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<BlockId> {
        self.target
    }

    /// Completes the gesture against the editor's current state.
    pub fn drop_onto(self, editor: &mut DocumentEditor) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let moved = editor.move_by_id(self.source, target);
        debug!(
            "event=drag_drop module=reorder status={}",
            if moved { "ok" } else { "skipped" }
        );
        moved
    }
}
