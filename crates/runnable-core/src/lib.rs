//! Model lifecycle and generation-session machinery behind the runnable
//! bridge.
//!
//! The engine itself is abstracted by the traits in [`engine`]; `llama-core`
//! provides the llama.cpp implementation. This crate owns the parts that do
//! not depend on native code: request normalization, the sampler chain
//! layout, the prefill/decode loop with its failure policy, opaque model
//! handles, and the boundary operations of [`Bridge`].

pub mod bridge;
pub mod engine;
pub mod error;
pub mod generate;
pub mod registry;
pub mod request;
pub mod sampling;

#[cfg(test)]
mod testing;

pub use bridge::Bridge;
pub use engine::{
    Backend, DecodeSession, InferenceModel, ModelParams, SessionParams, Token, Vocabulary,
};
pub use error::{BridgeError, DecodeError, GenerateError, LoadError, SessionError, TokenizeError};
pub use generate::{FinishReason, Generation, generate};
pub use registry::{LoadedModel, ModelHandle, ModelRegistry};
pub use request::{GenerationRequest, default_threads};
pub use sampling::{SamplerConfig, SamplerStage};
