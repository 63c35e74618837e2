//! Text import pipeline.
//!
//! # Responsibility
//! - Turn raw text from files, clipboard, or urls into blocks.
//! - Combine an agent-assisted parse with a deterministic fallback.
//!
//! # Invariants
//! - This layer performs no file or network I/O of its own.
//! - Agent JSON is consumed, never produced, and treated as untrusted.

pub mod agent;
pub mod content;
pub mod fallback;
pub mod pipeline;
