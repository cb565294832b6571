//! Model persistence
//!
//! Loads and saves the word-frequency model. The on-disk format is a
//! tab-separated file with a header row: `word<TAB>frequency`.

use crate::{CorrectorError, WordModel};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Storage backend for the word model
pub trait ModelStore: Send + Sync {
    /// Load the model
    fn load(&self) -> Result<WordModel, CorrectorError>;

    /// Persist the model
    fn save(&self, model: &WordModel) -> Result<(), CorrectorError>;
}

/// Tab-separated file storage
pub struct TsvModelStore {
    path: PathBuf,
}

impl TsvModelStore {
    /// Create a store over the given file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelStore for TsvModelStore {
    fn load(&self) -> Result<WordModel, CorrectorError> {
        let raw = fs::read_to_string(&self.path)?;
        let model = parse_model(&raw)?;

        tracing::info!(
            path = %self.path.display(),
            words = model.len(),
            "Word model loaded"
        );

        Ok(model)
    }

    fn save(&self, model: &WordModel) -> Result<(), CorrectorError> {
        fs::write(&self.path, render_model(model))?;

        tracing::debug!(
            path = %self.path.display(),
            words = model.len(),
            "Word model saved"
        );

        Ok(())
    }
}

/// Parse the tab-separated model format
///
/// The first line is a header and is skipped. Entries whose word column
/// contains no alphabetic character (punctuation rows, bare numbers) are
/// filtered out.
fn parse_model(raw: &str) -> Result<WordModel, CorrectorError> {
    let mut words = HashMap::new();

    for (idx, line) in raw.lines().enumerate().skip(1) {
        if line.is_empty() {
            continue;
        }

        let (word, freq) = line.split_once('\t').ok_or(CorrectorError::MalformedLine {
            line: idx + 1,
            reason: "expected two tab-separated columns".to_string(),
        })?;

        if !word.chars().any(char::is_alphabetic) {
            continue;
        }

        let freq: u64 = freq.trim().parse().map_err(|_| CorrectorError::MalformedLine {
            line: idx + 1,
            reason: format!("invalid frequency: {freq}"),
        })?;

        words.insert(word.to_string(), freq);
    }

    Ok(WordModel::new(words))
}

/// Render the model back into the tab-separated format
fn render_model(model: &WordModel) -> String {
    let mut entries: Vec<(&str, u64)> = model.iter().collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::from("Palabras\tFrecuencias\n");
    for (word, freq) in entries {
        out.push_str(word);
        out.push('\t');
        out.push_str(&freq.to_string());
        out.push('\n');
    }
    out
}
