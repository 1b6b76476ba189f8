use std::path::PathBuf;

use thiserror::Error;

/// Failure of a generation call.
///
/// The `Display` text of each variant is the exact string handed back across
/// the boundary in place of generated output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Tokenization failed")]
    TokenizationFailed,

    #[error("Context init failed")]
    ContextInitFailed,

    #[error("Decode failed")]
    DecodeFailed,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model file not found: '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load model from '{path}': {reason}")]
    Failed { path: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// Text is handed to the engine as a C string, so a NUL byte inside it
    /// is rejected even where the engine call takes an explicit length.
    #[error("text contains an interior nul byte")]
    InteriorNul,

    #[error("text is too long to tokenize ({0} bytes)")]
    TooLong(usize),

    /// The sizing probe reported no tokens.
    #[error("text produced no tokens")]
    Empty,

    #[error("tokenizer returned {0}")]
    Rejected(i32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create context: {0}")]
pub struct SessionError(pub String);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Decode failed with code {0}")]
pub struct DecodeError(pub i32);

/// Errors of the convenience entry points on [`crate::Bridge`] that do more
/// than one boundary operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}
