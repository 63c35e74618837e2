//! Document domain model.
//!
//! # Responsibility
//! - Define the closed set of block variants and their payloads.
//! - Define the block type registry used for creation and slash search.
//! - Define the document aggregate that owns the ordered block sequence.
//!
//! # Invariants
//! - Every block is identified by a stable `BlockId`, independent of position.
//! - A document always holds at least one block.

pub mod block;
pub mod block_type;
pub mod document;
