//! Two-stage import pipeline.
//!
//! # Responsibility
//! - Try an agent-assisted structured parse when enabled and available.
//! - Fall back to the deterministic line parser on any agent failure.
//! - Support cancellation that drops the in-flight completion request.
//!
//! # Invariants
//! - Agent failures are never surfaced to callers; the fallback always runs.
//! - At most one completion request is issued per import.
//! - A cancelled import yields no blocks.

use crate::config::EditorConfig;
use crate::import::agent::{build_prompt, decode_agent_response};
use crate::import::fallback::parse_plain_text;
use crate::model::block::Block;
use async_trait::async_trait;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Errors from the text completion collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No provider is configured or reachable.
    Unavailable,
    /// Provider returned an error.
    Failed(String),
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "completion service unavailable"),
            Self::Failed(reason) => write!(f, "completion failed: {reason}"),
        }
    }
}

impl Error for CompletionError {}

/// Single-shot text completion collaborator.
///
/// Streamed providers buffer their output into one string before returning.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn is_available(&self) -> bool {
        true
    }
}

/// Import-level errors surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Cancelled,
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "import cancelled"),
        }
    }
}

impl Error for ImportError {}

/// Converts raw text into blocks.
#[derive(Clone)]
pub struct ImportPipeline {
    completion: Option<Arc<dyn CompletionService>>,
    max_prompt_chars: usize,
}

impl ImportPipeline {
    pub fn new(completion: Option<Arc<dyn CompletionService>>, config: &EditorConfig) -> Self {
        Self {
            completion,
            max_prompt_chars: config.agent_prompt_max_chars,
        }
    }

    /// Pipeline with no completion service; always uses the line parser.
    pub fn deterministic() -> Self {
        Self::new(None, &EditorConfig::default())
    }

    /// Imports `raw_text`, trying the agent first when `use_agent_assist` is set.
    pub async fn import(&self, raw_text: &str, use_agent_assist: bool) -> Vec<Block> {
        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        if use_agent_assist {
            if let Some(blocks) = self.agent_parse(raw_text).await {
                info!(
                    "event=import module=import status=ok path=agent blocks={}",
                    blocks.len()
                );
                return blocks;
            }
        }

        let blocks = parse_plain_text(raw_text);
        info!(
            "event=import module=import status=ok path=fallback blocks={}",
            blocks.len()
        );
        blocks
    }

    /// Like `import`, but abandons the work when `cancel` fires.
    ///
    /// Cancellation drops the pending completion request.
    pub async fn import_cancellable(
        &self,
        raw_text: &str,
        use_agent_assist: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Block>, ImportError> {
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("event=import module=import status=cancelled");
                Err(ImportError::Cancelled)
            }
            blocks = self.import(raw_text, use_agent_assist) => Ok(blocks),
        }
    }

    async fn agent_parse(&self, raw_text: &str) -> Option<Vec<Block>> {
        let service = match &self.completion {
            Some(service) if service.is_available() => service,
            _ => {
                warn!("event=import_agent module=import status=skipped reason=unavailable");
                return None;
            }
        };

        let prompt = build_prompt(raw_text, self.max_prompt_chars);
        let response = match service.complete(&prompt).await {
            Ok(response) => response,
            Err(err) => {
                warn!("event=import_agent module=import status=error stage=complete error={err}");
                return None;
            }
        };

        match decode_agent_response(&response) {
            Ok(blocks) if blocks.is_empty() => {
                warn!("event=import_agent module=import status=error stage=decode reason=empty");
                None
            }
            Ok(blocks) => Some(blocks),
            Err(err) => {
                warn!("event=import_agent module=import status=error stage=decode error={err}");
                None
            }
        }
    }
}
