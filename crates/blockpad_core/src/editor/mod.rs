//! Editing session components.
//!
//! # Responsibility
//! - Apply block-level mutations to one document (`engine`).
//! - Resolve slash-command queries and drag gestures.
//! - Debounce persistence after edits (`save_state`).
//! - Compose all of the above into one session (`session`).
//!
//! # Invariants
//! - One mutator per document; nothing in this module locks the document.

pub mod debounce;
pub mod engine;
pub mod reorder;
pub mod save_state;
pub mod session;
pub mod slash;
