use std::path::PathBuf;

use runnable_core::{DecodeError, LoadError, SessionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlamaError {
    #[error("Model file not found: '{}'", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoadFailed { path: String, reason: String },

    #[error("Failed to create context: {0}")]
    ContextCreationFailed(String),

    #[error("Failed to create sampler: {0}")]
    SamplerInitFailed(String),

    #[error("Decode failed with code {0}")]
    DecodeFailed(i32),

    #[error("Batch of {requested} tokens exceeds capacity {capacity}")]
    BatchOverflow { requested: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, LlamaError>;

impl From<LlamaError> for LoadError {
    fn from(e: LlamaError) -> Self {
        match e {
            LlamaError::ModelNotFound(path) => LoadError::NotFound(path),
            LlamaError::ModelLoadFailed { path, reason } => LoadError::Failed { path, reason },
            other => LoadError::Failed {
                path: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<LlamaError> for SessionError {
    fn from(e: LlamaError) -> Self {
        SessionError(e.to_string())
    }
}

impl From<LlamaError> for DecodeError {
    fn from(e: LlamaError) -> Self {
        match e {
            LlamaError::DecodeFailed(code) => DecodeError(code),
            _ => DecodeError(-1),
        }
    }
}
