//! Agent-assisted structured parse.
//!
//! # Responsibility
//! - Build the bounded completion prompt for one import.
//! - Decode the agent's JSON block records into blocks.
//!
//! # Invariants
//! - Responses are untrusted: surrounding prose is ignored, missing fields
//!   default, and records with an unknown `type` are skipped.
//! - Each accepted record maps to exactly one block.

use crate::model::block::{Block, HeadingLevel};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_HEADING_LEVEL: i64 = 3;

/// Fixed instruction prepended to every import prompt.
pub const AGENT_INSTRUCTION: &str = "Convert the following text into document blocks. \
Respond with a JSON array only. Each element is an object with a \"type\" field set to one of \
\"heading\", \"text\", \"bullet\", \"code\", \"quote\". Headings carry \"level\" (1-3) and \
\"content\"; text and quote carry \"content\"; bullet carries \"items\" (array of strings); \
code carries \"content\" and optional \"language\". Preserve the original wording.";

/// Builds the completion prompt from at most `max_chars` characters of input.
pub fn build_prompt(raw_text: &str, max_chars: usize) -> String {
    let excerpt: String = raw_text.chars().take(max_chars).collect();
    format!("{AGENT_INSTRUCTION}\n\nText:\n{excerpt}")
}

/// One element of the agent's JSON block array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentBlockRecord {
    #[serde(rename = "type")]
    pub kind: String,
    /// Accepts `2`, `2.0` or `"2"`; anything else falls back to level 3.
    #[serde(default)]
    pub level: Option<serde_json::Value>,
    pub content: Option<String>,
    pub items: Option<Vec<String>>,
    pub language: Option<String>,
}

impl AgentBlockRecord {
    /// Maps the record onto a block; `None` for unknown types.
    pub fn into_block(self) -> Option<Block> {
        let content = self.content.unwrap_or_default();
        let block = match self.kind.trim().to_ascii_lowercase().as_str() {
            "heading" => Block::heading(
                HeadingLevel::new(
                    self.level
                        .as_ref()
                        .and_then(lenient_level)
                        .unwrap_or(DEFAULT_HEADING_LEVEL),
                ),
                content,
            ),
            "text" => Block::text(content),
            "bullet" => {
                let items = self.items.unwrap_or_default();
                if items.is_empty() && !content.is_empty() {
                    Block::bullet_list([content])
                } else {
                    Block::bullet_list(items)
                }
            }
            "code" => Block::code(
                content,
                self.language.filter(|language| !language.trim().is_empty()),
            ),
            "quote" => Block::quote(content),
            _ => return None,
        };
        Some(block)
    }
}

fn lenient_level(value: &serde_json::Value) -> Option<i64> {
    let level = match value {
        serde_json::Value::Number(number) => number.as_f64()?,
        serde_json::Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    level.is_finite().then(|| level.round() as i64)
}

/// Reasons an agent response could not be decoded.
#[derive(Debug)]
pub enum AgentDecodeError {
    /// No `[` ... `]` span in the response.
    MissingArray,
    Json(serde_json::Error),
}

impl Display for AgentDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArray => write!(f, "agent response contains no JSON array"),
            Self::Json(err) => write!(f, "agent response is not a JSON array: {err}"),
        }
    }
}

impl Error for AgentDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingArray => None,
            Self::Json(err) => Some(err),
        }
    }
}

/// Decodes the span between the first `[` and the last `]` of `response`.
///
/// Elements that are not valid records are skipped like unknown types.
pub fn decode_agent_response(response: &str) -> Result<Vec<Block>, AgentDecodeError> {
    let start = response.find('[').ok_or(AgentDecodeError::MissingArray)?;
    let end = response.rfind(']').ok_or(AgentDecodeError::MissingArray)?;
    if end < start {
        return Err(AgentDecodeError::MissingArray);
    }

    let values: Vec<serde_json::Value> =
        serde_json::from_str(&response[start..=end]).map_err(AgentDecodeError::Json)?;
    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<AgentBlockRecord>(value).ok())
        .filter_map(AgentBlockRecord::into_block)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, decode_agent_response, AgentDecodeError, AGENT_INSTRUCTION};
    use crate::model::block::{BlockContent, HeadingLevel};
    use crate::model::block_type::BlockType;

    #[test]
    fn prompt_is_bounded_by_characters() {
        let raw = "é".repeat(5_000);
        let prompt = build_prompt(&raw, 4_000);
        assert!(prompt.starts_with(AGENT_INSTRUCTION));
        assert_eq!(prompt.matches('é').count(), 4_000);
    }

    #[test]
    fn decodes_array_wrapped_in_prose() {
        let response = r#"Sure! Here you go:
[{"type":"heading","level":2,"content":"Intro"},
 {"type":"text","content":"Body"},
 {"type":"bullet","items":["a","b"]},
 {"type":"code","content":"fn main() {}","language":"rust"},
 {"type":"quote","content":"Be brief."}]
Let me know if you need anything else."#;

        let blocks = decode_agent_response(response).expect("array should decode");
        let types: Vec<_> = blocks.iter().map(|block| block.block_type()).collect();
        assert_eq!(
            types,
            vec![
                BlockType::Heading2,
                BlockType::Text,
                BlockType::BulletList,
                BlockType::Code,
                BlockType::Quote,
            ]
        );
        assert_eq!(
            blocks[3].content,
            BlockContent::Code {
                content: "fn main() {}".to_string(),
                language: Some("rust".to_string()),
            }
        );
    }

    #[test]
    fn heading_level_defaults_to_three_and_clamps() {
        let blocks = decode_agent_response(
            r#"[{"type":"heading","content":"A"},{"type":"heading","level":7,"content":"B"}]"#,
        )
        .expect("array should decode");
        assert!(matches!(
            blocks[0].content,
            BlockContent::Heading { level, .. } if level == HeadingLevel::THREE
        ));
        assert!(matches!(
            blocks[1].content,
            BlockContent::Heading { level, .. } if level == HeadingLevel::THREE
        ));
    }

    #[test]
    fn unknown_types_and_malformed_records_are_skipped() {
        let blocks = decode_agent_response(
            r#"[{"type":"table","content":"x"},{"content":"no type"},{"type":"text","content":42},{"type":"text"}]"#,
        )
        .expect("array should decode");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].extract_content(), "");
    }

    #[test]
    fn missing_closing_bracket_is_an_error() {
        let err = decode_agent_response(r#"[{"type":"text","content":"cut off""#)
            .expect_err("truncated array must fail");
        assert!(matches!(err, AgentDecodeError::MissingArray));
    }

    #[test]
    fn bullet_without_items_uses_content() {
        let blocks = decode_agent_response(r#"[{"type":"bullet","content":"solo"}]"#)
            .expect("array should decode");
        assert_eq!(blocks[0].plain_text(), "solo");
    }

    #[test]
    fn heading_level_accepts_float_and_string_forms() {
        let blocks = decode_agent_response(
            r#"[{"type":"heading","level":2.0,"content":"A"},
                {"type":"heading","level":"1","content":"B"},
                {"type":"heading","level":null,"content":"C"},
                {"type":"heading","level":{"n":1},"content":"D"}]"#,
        )
        .expect("array should decode");
        let levels: Vec<_> = blocks
            .iter()
            .map(|block| match &block.content {
                BlockContent::Heading { level, text } => (level.get(), text.clone()),
                other => panic!("expected heading, got {other:?}"),
            })
            .collect();
        assert_eq!(
            levels,
            vec![
                (2, "A".to_string()),
                (1, "B".to_string()),
                (3, "C".to_string()),
                (3, "D".to_string()),
            ]
        );
    }
}
