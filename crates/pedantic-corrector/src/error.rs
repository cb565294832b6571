//! Corrector error types

/// Errors produced while loading or persisting the word model
#[derive(Debug, thiserror::Error)]
pub enum CorrectorError {
    /// The model file could not be read or written
    #[error("Model I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A model line did not have the expected shape
    #[error("Malformed model line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
}
