//! Editor session configuration.
//!
//! # Responsibility
//! - Hold tunables for the save debounce and import agent assist.
//! - Decode configuration from JSON with per-field defaults.
//!
//! # Invariants
//! - A validated config has a positive debounce no longer than one minute.
//! - The agent prompt budget stays within `MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1_000;
const MAX_SAVE_DEBOUNCE_MS: u64 = 60_000;
const DEFAULT_AGENT_PROMPT_MAX_CHARS: usize = 4_000;
const MIN_PROMPT_CHARS: usize = 256;
const MAX_PROMPT_CHARS: usize = 32_000;

/// Tunables for one editor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before a save is issued.
    pub save_debounce_ms: u64,
    /// Maximum number of raw-text characters sent to the completion service.
    pub agent_prompt_max_chars: usize,
    /// Whether imports try the completion service before the line parser.
    pub agent_assist: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            agent_prompt_max_chars: DEFAULT_AGENT_PROMPT_MAX_CHARS,
            agent_assist: true,
        }
    }
}

impl EditorConfig {
    /// Decodes and validates a JSON config document.
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_debounce_ms == 0 || self.save_debounce_ms > MAX_SAVE_DEBOUNCE_MS {
            return Err(ConfigError::InvalidDebounce(self.save_debounce_ms));
        }
        if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&self.agent_prompt_max_chars) {
            return Err(ConfigError::InvalidPromptBudget(
                self.agent_prompt_max_chars,
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

/// Configuration decode/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidDebounce(u64),
    InvalidPromptBudget(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid editor config: {err}"),
            Self::InvalidDebounce(value) => write!(
                f,
                "save_debounce_ms must be within 1..={MAX_SAVE_DEBOUNCE_MS}, got {value}"
            ),
            Self::InvalidPromptBudget(value) => write!(
                f,
                "agent_prompt_max_chars must be within {MIN_PROMPT_CHARS}..={MAX_PROMPT_CHARS}, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
