//! Deterministic line-oriented text parser.
//!
//! Rules, checked per line in this order:
//! 1. blank line: flush the pending paragraph.
//! 2. `# `, `## `, `### `: flush, then emit a heading of that level.
//! 3. `- `, `* `: flush, then emit a one-item bulleted list.
//! 4. anything else: append to the pending paragraph, space-joined.
//!
//! The parser never fails and never drops a non-blank line.

use crate::model::block::{Block, HeadingLevel};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,3}) (.*)$").expect("valid heading regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*] (.*)$").expect("valid bullet regex"));

/// Parses raw text into blocks without any external help.
pub fn parse_plain_text(raw_text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in raw_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let level = HeadingLevel::new(caps[1].len() as i64);
            blocks.push(Block::heading(level, caps[2].trim()));
            continue;
        }

        if let Some(caps) = BULLET_RE.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::bullet_list([caps[1].trim()]));
            continue;
        }

        paragraph.push(line);
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    blocks
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    blocks.push(Block::text(paragraph.join(" ")));
    paragraph.clear();
}

#[cfg(test)]
mod tests {
    use super::parse_plain_text;
    use crate::model::block::{Block, BlockContent, HeadingLevel};

    fn contents(blocks: &[Block]) -> Vec<BlockContent> {
        blocks.iter().map(|block| block.content.clone()).collect()
    }

    fn bullet_texts(block: &Block) -> Vec<String> {
        match &block.content {
            BlockContent::BulletList { items } => {
                items.iter().map(|item| item.text.clone()).collect()
            }
            other => panic!("expected bullet list, got {other:?}"),
        }
    }

    #[test]
    fn parses_headings_paragraphs_and_bullets() {
        let blocks = parse_plain_text(
            "# Title\n\nSome body text.\nMore body.\n- item one\n- item two",
        );

        assert_eq!(blocks.len(), 4);
        assert_eq!(
            contents(&blocks[..2]),
            vec![
                BlockContent::Heading {
                    level: HeadingLevel::ONE,
                    text: "Title".to_string(),
                },
                BlockContent::Text {
                    text: "Some body text. More body.".to_string(),
                },
            ]
        );
        assert_eq!(bullet_texts(&blocks[2]), vec!["item one"]);
        assert_eq!(bullet_texts(&blocks[3]), vec!["item two"]);
    }

    #[test]
    fn heading_levels_follow_hash_count() {
        let blocks = parse_plain_text("## Two\n### Three\n#### Four");
        assert_eq!(blocks[0].block_type(), crate::BlockType::Heading2);
        assert_eq!(blocks[1].block_type(), crate::BlockType::Heading3);
        // Four hashes is not a heading marker; the line stays paragraph text.
        assert_eq!(blocks[2].extract_content(), "#### Four");
    }

    #[test]
    fn marker_without_space_is_paragraph_text() {
        let blocks = parse_plain_text("#hashtag\n-dash");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].extract_content(), "#hashtag -dash");
    }

    #[test]
    fn star_bullets_and_crlf_are_supported() {
        let blocks = parse_plain_text("* one\r\n* two\r\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(bullet_texts(&blocks[1]), vec!["two"]);
    }

    #[test]
    fn every_non_blank_line_survives() {
        let raw = "alpha\n\n  beta  \n# gamma\n- delta\nepsilon\n\n\n";
        let joined: String = parse_plain_text(raw)
            .iter()
            .map(|block| block.plain_text())
            .collect::<Vec<_>>()
            .join(" ");
        for word in ["alpha", "beta", "gamma", "delta", "epsilon"] {
            assert!(joined.contains(word), "missing {word} in {joined}");
        }
    }

    #[test]
    fn blank_input_yields_no_blocks() {
        assert!(parse_plain_text(" \n\n\t").is_empty());
    }
}
