//! Seams between the generation machinery and a concrete inference engine.
//!
//! `llama-core` implements these traits on top of llama.cpp; the unit tests
//! of this crate implement them with a scripted in-memory engine.

use std::path::Path;

use crate::error::{DecodeError, LoadError, SessionError, TokenizeError};
use crate::sampling::SamplerConfig;

/// Token id, meaningful only relative to the vocabulary that produced it.
pub type Token = i32;

/// Parameters for loading a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelParams {
    /// Layers to offload to GPU. 0 = CPU only, -1 = all.
    pub n_gpu_layers: i32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { n_gpu_layers: 0 }
    }
}

/// Decoding-context parameters for one generation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Context length in tokens (0 = model's training context).
    pub n_ctx: u32,
    /// Logical batch size; sized to the prompt so prefill fits one batch.
    pub n_batch: u32,
    pub n_threads: i32,
    pub n_threads_batch: i32,
}

/// Process-wide engine entry point.
pub trait Backend: Send + Sync {
    type Model: InferenceModel;

    /// One-time global initialization. Loads compute-backend plugins from
    /// `plugin_dir` when given, otherwise whatever backends are available.
    fn initialize(&self, plugin_dir: Option<&Path>);

    fn load_model(&self, path: &Path, params: &ModelParams) -> Result<Self::Model, LoadError>;

    /// Static description of build/runtime capabilities.
    fn system_info(&self) -> String;
}

/// Read-only token/text mapping borrowed from a loaded model.
pub trait Vocabulary {
    /// Tokenize with a beginning-of-sequence marker, parsing special tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;

    /// Raw surface bytes of a single token. Never fails; unrenderable
    /// tokens yield no bytes. A piece may hold part of a multi-byte UTF-8
    /// character.
    fn token_to_piece(&self, token: Token) -> Vec<u8>;

    /// `true` if `token` marks the end of generation.
    fn is_eog(&self, token: Token) -> bool;
}

/// A loaded model that can hand out vocabulary views and decoding sessions.
pub trait InferenceModel: Send + Sync {
    type Vocab<'m>: Vocabulary
    where
        Self: 'm;

    type Session<'m>: DecodeSession
    where
        Self: 'm;

    fn vocab(&self) -> Self::Vocab<'_>;

    /// Build a decoding context and sampler chain. Both are released when
    /// the returned session is dropped.
    fn new_session(
        &self,
        params: &SessionParams,
        sampling: &SamplerConfig,
    ) -> Result<Self::Session<'_>, SessionError>;
}

/// Per-request decoding state: context plus sampler chain.
pub trait DecodeSession {
    /// Submit `tokens` as one batch at the next positions of the sequence.
    fn decode(&mut self, tokens: &[Token]) -> Result<(), DecodeError>;

    /// Draw the next token from the logits of the last decoded position.
    fn sample(&mut self) -> Token;
}
