//! Transient import payloads.
//!
//! # Invariants
//! - `ImportContent` lives for one import operation and is never persisted.
//! - `suggested_title` is never blank.

use crate::model::document::DEFAULT_TITLE;
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_TITLE_CHARS: usize = 80;

static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~\[\]]+").expect("valid markdown symbol regex"));
static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").expect("valid list marker regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Where imported text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// Dropped or picked file, identified by its file name.
    File(String),
    Clipboard,
    Url(String),
}

/// Raw text handed over by a file/clipboard provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportContent {
    pub source: ImportSource,
    pub raw_text: String,
    pub suggested_title: String,
}

impl ImportContent {
    /// File import; the title is the file stem.
    pub fn from_file(file_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let raw_text = raw_text.into();
        let stem = file_name
            .rsplit(['/', '\\'])
            .next()
            .map(|name| match name.rfind('.') {
                Some(dot) if dot > 0 => &name[..dot],
                _ => name,
            })
            .unwrap_or_default()
            .to_string();
        let suggested_title = title_or_first_line(&stem, &raw_text);
        Self {
            source: ImportSource::File(file_name),
            raw_text,
            suggested_title,
        }
    }

    /// Clipboard import; the title comes from the first non-blank line.
    pub fn from_clipboard(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let suggested_title = suggest_title(&raw_text);
        Self {
            source: ImportSource::Clipboard,
            raw_text,
            suggested_title,
        }
    }

    /// Fetched-url import; the title is the last path segment.
    pub fn from_url(url: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let url = url.into();
        let raw_text = raw_text.into();
        let without_query = url.split(['?', '#']).next().unwrap_or_default();
        let segment = without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let segment = if segment.contains(':') {
            String::new()
        } else {
            segment
        };
        let suggested_title = title_or_first_line(&segment, &raw_text);
        Self {
            source: ImportSource::Url(url),
            raw_text,
            suggested_title,
        }
    }
}

fn title_or_first_line(candidate: &str, raw_text: &str) -> String {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        suggest_title(raw_text)
    } else {
        truncate_chars(candidate, MAX_TITLE_CHARS)
    }
}

/// Derives a title from the first non-blank line, markdown stripped.
pub fn suggest_title(raw_text: &str) -> String {
    raw_text
        .lines()
        .map(|line| LIST_MARKER_RE.replace(line, ""))
        .map(|line| MARKDOWN_SYMBOL_RE.replace_all(&line, " ").into_owned())
        .map(|line| WHITESPACE_RE.replace_all(&line, " ").trim().to_string())
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(&line, MAX_TITLE_CHARS))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::{suggest_title, ImportContent, ImportSource};

    #[test]
    fn file_title_is_stem() {
        let content = ImportContent::from_file("/tmp/notes/Weekly Plan.md", "# Ignored");
        assert_eq!(content.suggested_title, "Weekly Plan");
        assert_eq!(
            content.source,
            ImportSource::File("/tmp/notes/Weekly Plan.md".to_string())
        );
    }

    #[test]
    fn clipboard_title_strips_markdown() {
        assert_eq!(suggest_title("\n\n## **Road** map\nbody"), "Road map");
        assert_eq!(suggest_title("- first bullet"), "first bullet");
    }

    #[test]
    fn blank_text_falls_back_to_default_title() {
        assert_eq!(ImportContent::from_clipboard("   \n").suggested_title, "Untitled");
    }

    #[test]
    fn url_title_uses_last_segment() {
        let content = ImportContent::from_url("https://example.com/docs/setup-guide?x=1", "");
        assert_eq!(content.suggested_title, "setup-guide");

        let bare = ImportContent::from_url("https://", "Fallback line");
        assert_eq!(bare.suggested_title, "Fallback line");
    }

    #[test]
    fn long_titles_are_truncated() {
        let title = suggest_title(&"word ".repeat(40));
        assert!(title.chars().count() <= 80);
    }
}
