//! Safe Rust wrapper around the llama.cpp C API.
//!
//! Provides RAII-managed types for backend initialization, model loading,
//! tokenization, context creation and sampling, and implements the
//! `runnable-core` engine traits on top of them as [`LlamaCpp`].

pub mod backend;
pub mod batch;
pub mod context;
pub mod engine;
pub mod error;
pub mod model;
pub mod sampler;
pub mod session;
pub mod vocab;

pub use backend::LlamaBackend;
pub use batch::LlamaBatch;
pub use context::{DecodeStats, LlamaContext};
pub use engine::LlamaCpp;
pub use error::{LlamaError, Result};
pub use model::LlamaModel;
pub use runnable_core::ModelParams;
pub use sampler::SamplerChain;
pub use session::LlamaSession;
pub use vocab::LlamaVocab;
