//! Bot runtime state
//!
//! The pedantic on/off flag, the command prefix, and the store that links
//! interaction component ids back to the words they offered to add. One
//! value per process, passed explicitly to each handler.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared bot state
#[derive(Debug)]
pub struct BotState {
    /// Whether the bot currently corrects typos
    pedantic: AtomicBool,

    /// Prefix the bot intercepts as commands
    prefix: String,

    /// Pending interactions: component id → offered word
    interactions: DashMap<String, String>,
}

impl BotState {
    /// Create bot state with the given command prefix; correction starts
    /// enabled
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            pedantic: AtomicBool::new(true),
            prefix: prefix.into(),
            interactions: DashMap::new(),
        }
    }

    /// Whether typo correction is enabled
    #[must_use]
    pub fn is_pedantic(&self) -> bool {
        self.pedantic.load(Ordering::SeqCst)
    }

    /// Enable or disable typo correction
    pub fn set_pedantic(&self, value: bool) {
        self.pedantic.store(value, Ordering::SeqCst);
    }

    /// The command prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Check whether `content` is exactly the given command
    #[must_use]
    pub fn is_command(&self, content: &str, command: &str) -> bool {
        content == format!("{}{command}", self.prefix)
    }

    /// Remember which word an interaction component offers to add
    pub fn save_interaction(&self, interaction_id: impl Into<String>, word: impl Into<String>) {
        self.interactions.insert(interaction_id.into(), word.into());
    }

    /// Look up the word an interaction component offered
    #[must_use]
    pub fn get_interaction(&self, interaction_id: &str) -> Option<String> {
        self.interactions.get(interaction_id).map(|entry| entry.clone())
    }
}
