//! Editor session composition.
//!
//! # Responsibility
//! - Route every mutation through `DocumentEditor`.
//! - Notify the save controller after each applied mutation.
//! - Run imports and agent blocks against the optional completion service.
//!
//! # Invariants
//! - No-op mutations do not arm the save timer.
//! - A cancelled import leaves the document untouched.
//! - Completion calls run on detached requests that do not borrow the session,
//!   so edits keep landing while a call is pending.
//! - Results are written back by block id, never by captured index.

use crate::config::EditorConfig;
use crate::editor::engine::{DocumentEditor, EditorError};
use crate::editor::save_state::{SaveController, SaveStatus};
use crate::import::content::ImportContent;
use crate::import::pipeline::{CompletionError, CompletionService, ImportError, ImportPipeline};
use crate::model::block::{AgentStatus, Block, BlockId};
use crate::model::block_type::BlockType;
use crate::model::document::Document;
use crate::store::{DocumentStore, StoreResult};
use log::{info, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Import parse detached from the session.
pub struct PendingImport {
    pipeline: ImportPipeline,
    content: ImportContent,
    use_agent_assist: bool,
}

impl PendingImport {
    pub fn content(&self) -> &ImportContent {
        &self.content
    }

    /// Parses the content; `cancel` drops any pending completion request.
    pub async fn run(self, cancel: &CancellationToken) -> Result<ParsedImport, ImportError> {
        let blocks = self
            .pipeline
            .import_cancellable(&self.content.raw_text, self.use_agent_assist, cancel)
            .await?;
        Ok(ParsedImport {
            blocks,
            suggested_title: self.content.suggested_title,
        })
    }
}

/// Parsed import waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImport {
    blocks: Vec<Block>,
    suggested_title: String,
}

impl ParsedImport {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn suggested_title(&self) -> &str {
        self.suggested_title.as_str()
    }
}

/// Completion request for one agent block, detached from the session.
pub struct AgentRequest {
    block_id: BlockId,
    prompt: String,
    completion: Option<Arc<dyn CompletionService>>,
}

impl AgentRequest {
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_str()
    }

    /// Sends the prompt. A missing service yields `CompletionError::Unavailable`.
    pub async fn send(self) -> AgentReply {
        let result = match &self.completion {
            Some(service) => service.complete(&self.prompt).await,
            None => Err(CompletionError::Unavailable),
        };
        AgentReply {
            block_id: self.block_id,
            result,
        }
    }
}

/// Outcome of an `AgentRequest`, applied with `EditorSession::finish_agent_block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub block_id: BlockId,
    pub result: Result<String, CompletionError>,
}

/// One open document with its save and import machinery.
pub struct EditorSession {
    editor: DocumentEditor,
    save: SaveController,
    pipeline: ImportPipeline,
    completion: Option<Arc<dyn CompletionService>>,
    config: EditorConfig,
}

impl EditorSession {
    /// Saves are scheduled on the calling context's runtime, if any.
    pub fn new(
        document: Document,
        store: Arc<dyn DocumentStore>,
        completion: Option<Arc<dyn CompletionService>>,
        config: EditorConfig,
    ) -> Self {
        let save = SaveController::new(store, config.debounce());
        Self::assemble(document, save, completion, config)
    }

    /// Saves are scheduled on `runtime`; mutations may come from any thread.
    pub fn with_runtime(
        document: Document,
        store: Arc<dyn DocumentStore>,
        completion: Option<Arc<dyn CompletionService>>,
        config: EditorConfig,
        runtime: Handle,
    ) -> Self {
        let save = SaveController::with_runtime(store, config.debounce(), runtime);
        Self::assemble(document, save, completion, config)
    }

    fn assemble(
        document: Document,
        save: SaveController,
        completion: Option<Arc<dyn CompletionService>>,
        config: EditorConfig,
    ) -> Self {
        Self {
            editor: DocumentEditor::new(document),
            save,
            pipeline: ImportPipeline::new(completion.clone(), &config),
            completion,
            config,
        }
    }

    pub fn document(&self) -> &Document {
        self.editor.document()
    }

    pub fn editor(&self) -> &DocumentEditor {
        &self.editor
    }

    pub fn focused(&self) -> Option<BlockId> {
        self.editor.focused()
    }

    pub fn set_focus(&mut self, id: BlockId) -> Result<(), EditorError> {
        self.editor.set_focus(id)
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save.status()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.save.subscribe()
    }

    pub fn insert(&mut self, block_type: BlockType, at: usize) -> BlockId {
        let id = self.editor.insert(block_type, at);
        self.mutated();
        id
    }

    pub fn delete(&mut self, at: usize) -> Option<Block> {
        let removed = self.editor.delete(at);
        if removed.is_some() {
            self.mutated();
        }
        removed
    }

    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        self.applied(|editor| editor.move_block(from, to))
    }

    pub fn move_by_id(&mut self, source: BlockId, destination: BlockId) -> bool {
        self.applied(|editor| editor.move_by_id(source, destination))
    }

    pub fn duplicate(&mut self, at: usize) -> Option<BlockId> {
        let id = self.editor.duplicate(at);
        if id.is_some() {
            self.mutated();
        }
        id
    }

    pub fn convert_type(&mut self, at: usize, new_type: BlockType) -> Option<BlockId> {
        let id = self.editor.convert_type(at, new_type);
        if id.is_some() {
            self.mutated();
        }
        id
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.editor.set_title(title);
        self.mutated();
    }

    /// Runs an identity-based edit and arms the save timer when it succeeds.
    pub fn edit<T>(
        &mut self,
        op: impl FnOnce(&mut DocumentEditor) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let value = op(&mut self.editor)?;
        self.mutated();
        Ok(value)
    }

    /// Detaches the parse of `content` so edits can continue meanwhile.
    pub fn prepare_import(&self, content: ImportContent) -> PendingImport {
        PendingImport {
            pipeline: self.pipeline.clone(),
            content,
            use_agent_assist: self.config.agent_assist,
        }
    }

    /// Inserts a parsed batch at `at` and returns the number of inserted blocks.
    ///
    /// Adopts the suggested title while the document is still untitled.
    pub fn apply_import(&mut self, parsed: ParsedImport, at: usize) -> usize {
        let inserted = self
            .editor
            .insert_imported(at, parsed.blocks, &parsed.suggested_title);
        if inserted > 0 {
            self.mutated();
        }
        inserted
    }

    /// Prepares, runs and applies one import in sequence.
    pub async fn import(
        &mut self,
        content: ImportContent,
        at: usize,
        cancel: &CancellationToken,
    ) -> Result<usize, ImportError> {
        let parsed = self.prepare_import(content).run(cancel).await?;
        Ok(self.apply_import(parsed, at))
    }

    /// Marks an agent block `Running` and detaches its completion request.
    ///
    /// Without an available service the status is left alone; the returned
    /// request then replies `Unavailable`.
    pub fn begin_agent_block(&mut self, id: BlockId) -> Result<AgentRequest, EditorError> {
        let prompt = self.editor.agent_prompt(id)?;
        let completion = self
            .completion
            .clone()
            .filter(|service| service.is_available());
        if completion.is_some() {
            self.editor.set_agent_state(id, AgentStatus::Running, None)?;
            self.mutated();
        } else {
            warn!("event=agent_run module=session status=skipped reason=unavailable");
        }
        Ok(AgentRequest {
            block_id: id,
            prompt,
            completion,
        })
    }

    /// Writes a reply back to its block, re-resolved by id.
    ///
    /// Fails with `BlockNotFound` when the block was deleted meanwhile.
    pub fn finish_agent_block(&mut self, reply: AgentReply) -> Result<AgentStatus, EditorError> {
        let (status, content) = match reply.result {
            Ok(response) => {
                info!(
                    "event=agent_run module=session status=ok response_chars={}",
                    response.chars().count()
                );
                (AgentStatus::Done, Some(response))
            }
            Err(err) => {
                warn!("event=agent_run module=session status=error error={err}");
                (AgentStatus::Failed, None)
            }
        };
        self.editor.set_agent_state(reply.block_id, status, content)?;
        self.mutated();
        Ok(status)
    }

    /// Begins, sends and finishes one agent block in sequence.
    pub async fn run_agent_block(&mut self, id: BlockId) -> Result<AgentStatus, EditorError> {
        let reply = self.begin_agent_block(id)?.send().await;
        self.finish_agent_block(reply)
    }

    /// Flushes pending edits and closes the session.
    pub async fn close(self) -> StoreResult<()> {
        if self.save.status() == SaveStatus::Saved {
            return Ok(());
        }
        self.save.flush_now(self.editor.document().clone()).await
    }

    fn applied(&mut self, op: impl FnOnce(&mut DocumentEditor) -> bool) -> bool {
        let changed = op(&mut self.editor);
        if changed {
            self.mutated();
        }
        changed
    }

    fn mutated(&self) {
        self.save.notify_mutation(self.editor.document().clone());
    }
}
