//! Core document model and editing logic for BlockPad.
//! This crate owns the block invariants; UI layers only render and forward input.

pub mod config;
pub mod db;
pub mod editor;
pub mod import;
pub mod logging;
pub mod model;
pub mod store;

pub use config::{ConfigError, EditorConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use editor::debounce::DebounceSlot;
pub use editor::engine::{DocumentEditor, EditorError};
pub use editor::reorder::{resolve_move, DragGesture};
pub use editor::save_state::{SaveController, SaveStatus};
pub use editor::session::{AgentReply, AgentRequest, EditorSession, ParsedImport, PendingImport};
pub use editor::slash::{match_block_types, SlashMenu};
pub use import::agent::{decode_agent_response, AgentDecodeError};
pub use import::content::{suggest_title, ImportContent, ImportSource};
pub use import::fallback::parse_plain_text;
pub use import::pipeline::{CompletionError, CompletionService, ImportError, ImportPipeline};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::block::{
    AgentStatus, Block, BlockContent, BlockId, CalloutStyle, HeadingLevel, ItemId, ListItem,
    TodoItem,
};
pub use model::block_type::BlockType;
pub use model::document::{Document, DocumentId, DEFAULT_TITLE};
pub use store::{
    DocumentStore, DocumentSummary, SqliteDocumentStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
