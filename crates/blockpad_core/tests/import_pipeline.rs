use async_trait::async_trait;
use blockpad_core::{
    BlockContent, BlockType, CompletionError, CompletionService, EditorConfig, HeadingLevel,
    ImportError, ImportPipeline,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const NOTES: &str = "# Title\nIntro line\n- a\n- b\n## Sub";

/// Completion double that replays one canned reply and records prompts.
struct ScriptedCompletion {
    reply: Result<String, CompletionError>,
    available: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            available: true,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(CompletionError::Failed("timeout".to_string())),
            ..Self::replying("")
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

fn pipeline_with(service: &Arc<ScriptedCompletion>) -> ImportPipeline {
    let completion: Arc<dyn CompletionService> = service.clone();
    ImportPipeline::new(Some(completion), &EditorConfig::default())
}

fn types(blocks: &[blockpad_core::Block]) -> Vec<BlockType> {
    blocks.iter().map(|block| block.block_type()).collect()
}

#[tokio::test]
async fn fallback_parses_markdown_like_lines() {
    let blocks = ImportPipeline::deterministic().import(NOTES, true).await;

    assert_eq!(
        types(&blocks),
        vec![
            BlockType::Heading1,
            BlockType::Text,
            BlockType::BulletList,
            BlockType::BulletList,
            BlockType::Heading2,
        ]
    );
    assert_eq!(blocks[2].plain_text(), "a");
    assert_eq!(blocks[3].plain_text(), "b");
}

#[tokio::test]
async fn agent_result_is_used_when_valid() {
    let service = Arc::new(ScriptedCompletion::replying(
        r#"[{"type":"heading","level":1,"content":"Title"},{"type":"quote","content":"Intro"}]"#,
    ));
    let blocks = pipeline_with(&service).import(NOTES, true).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(types(&blocks), vec![BlockType::Heading1, BlockType::Quote]);
    assert_eq!(
        blocks[0].content,
        BlockContent::Heading {
            level: HeadingLevel::ONE,
            text: "Title".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_agent_json_falls_back() {
    let service = Arc::new(ScriptedCompletion::replying("[{\"type\": \"text\", oops"));
    let blocks = pipeline_with(&service).import(NOTES, true).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[0].block_type(), BlockType::Heading1);
}

#[tokio::test]
async fn empty_agent_result_falls_back() {
    let service = Arc::new(ScriptedCompletion::replying(r#"[{"type":"table"}]"#));
    let blocks = pipeline_with(&service).import(NOTES, true).await;
    assert_eq!(blocks.len(), 5);
}

#[tokio::test]
async fn agent_error_falls_back() {
    let service = Arc::new(ScriptedCompletion::failing());
    let blocks = pipeline_with(&service).import(NOTES, true).await;
    assert_eq!(blocks.len(), 5);
}

#[tokio::test]
async fn unavailable_or_disabled_agent_is_not_called() {
    let service = Arc::new(ScriptedCompletion {
        available: false,
        ..ScriptedCompletion::replying("[]")
    });
    let blocks = pipeline_with(&service).import(NOTES, true).await;
    assert_eq!(blocks.len(), 5);
    assert_eq!(service.calls(), 0);

    let enabled = Arc::new(ScriptedCompletion::replying(r#"[{"type":"text"}]"#));
    let blocks = pipeline_with(&enabled).import(NOTES, false).await;
    assert_eq!(blocks.len(), 5);
    assert_eq!(enabled.calls(), 0);
}

#[tokio::test]
async fn blank_input_yields_nothing_without_calling_agent() {
    let service = Arc::new(ScriptedCompletion::replying(r#"[{"type":"text"}]"#));
    let blocks = pipeline_with(&service).import(" \n\t\n", true).await;
    assert!(blocks.is_empty());
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn prompt_is_bounded_to_configured_budget() {
    let service = Arc::new(ScriptedCompletion::failing());
    let raw = "§".repeat(10_000);
    pipeline_with(&service).import(&raw, true).await;

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].matches('§').count(), 4_000);
    let excerpt = prompts[0]
        .split_once("\n\nText:\n")
        .map(|(_, excerpt)| excerpt)
        .unwrap();
    assert_eq!(excerpt.chars().count(), 4_000);
}

#[tokio::test(start_paused = true)]
async fn cancellation_drops_pending_request() {
    let service = Arc::new(ScriptedCompletion {
        delay: Some(Duration::from_secs(30)),
        ..ScriptedCompletion::replying(r#"[{"type":"text","content":"late"}]"#)
    });
    let pipeline = pipeline_with(&service);
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let result = pipeline.import_cancellable(NOTES, true, &token).await;
    assert_eq!(result, Err(ImportError::Cancelled));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn already_cancelled_token_skips_work() {
    let service = Arc::new(ScriptedCompletion::replying(r#"[{"type":"text"}]"#));
    let token = CancellationToken::new();
    token.cancel();

    let result = pipeline_with(&service)
        .import_cancellable(NOTES, true, &token)
        .await;
    assert_eq!(result, Err(ImportError::Cancelled));
    assert_eq!(service.calls(), 0);
}
