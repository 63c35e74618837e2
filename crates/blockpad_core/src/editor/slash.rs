//! Slash-command block type search.
//!
//! # Responsibility
//! - Filter block types against a typed query fragment.
//! - Keep a wrapping selection cursor over the current matches.
//!
//! # Invariants
//! - Results keep registry declaration order; there is no relevance ranking.
//! - An empty query lists every type except plain text.
//! - The selection index is always `< matches.len()` when matches exist.

use crate::model::block_type::BlockType;

/// Filters `types` by case-insensitive substring match on the display name
/// or any slash alias.
pub fn match_block_types(types: &[BlockType], query: &str) -> Vec<BlockType> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return types
            .iter()
            .copied()
            .filter(|block_type| *block_type != BlockType::Text)
            .collect();
    }

    types
        .iter()
        .copied()
        .filter(|block_type| {
            block_type.display_name().to_lowercase().contains(&needle)
                || block_type
                    .slash_aliases()
                    .iter()
                    .any(|alias| alias.contains(&needle))
        })
        .collect()
}

fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    trimmed
        .strip_prefix('/')
        .unwrap_or(trimmed)
        .trim()
        .to_lowercase()
}

/// Command menu state for one slash interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashMenu {
    query: String,
    matches: Vec<BlockType>,
    selected: usize,
}

impl Default for SlashMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl SlashMenu {
    /// Opens the menu with an empty query.
    pub fn new() -> Self {
        Self {
            query: String::new(),
            matches: match_block_types(&BlockType::ALL, ""),
            selected: 0,
        }
    }

    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    pub fn matches(&self) -> &[BlockType] {
        &self.matches
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Currently highlighted type, if anything matches.
    pub fn selected(&self) -> Option<BlockType> {
        self.matches.get(self.selected).copied()
    }

    /// Re-filters and re-clamps the selection when the match set shrinks.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.matches = match_block_types(&BlockType::ALL, &self.query);
        if self.selected >= self.matches.len() {
            self.selected = self.matches.len().saturating_sub(1);
        }
    }

    /// Moves the selection by `delta`, wrapping at both ends.
    pub fn move_selection(&mut self, delta: isize) {
        let Ok(count) = isize::try_from(self.matches.len()) else {
            return;
        };
        if count == 0 {
            return;
        }
        let current = isize::try_from(self.selected).unwrap_or(0);
        self.selected = (current + delta % count + count).rem_euclid(count) as usize;
    }
}
