//! Generation request parameters.

use serde::{Deserialize, Serialize};

use crate::engine::SessionParams;
use crate::sampling::SamplerConfig;

pub const DEFAULT_CONTEXT_SIZE: i32 = 2048;
pub const DEFAULT_MAX_TOKENS: u32 = 128;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One generation call: prompt plus decoding knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Context window in tokens. Must cover the prompt; 0 = model default.
    /// A negative size never fits and fails once the prompt is tokenized.
    #[serde(default = "default_context_size")]
    pub context_size: i32,
    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Compute threads for both single-token and batch decode.
    #[serde(default = "default_threads")]
    pub threads: i32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_context_size() -> i32 {
    DEFAULT_CONTEXT_SIZE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Available parallelism, never below 2.
pub fn default_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i32)
        .unwrap_or(4)
        .max(2)
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context_size: DEFAULT_CONTEXT_SIZE,
            max_tokens: DEFAULT_MAX_TOKENS,
            threads: default_threads(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Build a request from the signed integers of the C boundary.
    ///
    /// Negative budgets generate nothing. The context size is kept as given
    /// and checked against the prompt once it is tokenized; non-positive
    /// thread counts fall back to [`default_threads`], and negative or NaN
    /// temperatures become 0.
    pub fn from_raw(
        prompt: &str,
        context_size: i32,
        max_tokens: i32,
        threads: i32,
        temperature: f32,
    ) -> Self {
        Self {
            prompt: prompt.to_owned(),
            context_size,
            max_tokens: max_tokens.max(0) as u32,
            threads,
            temperature,
        }
    }

    /// Whether the requested context can hold `n_prompt` tokens. A size of 0
    /// defers to the model and always fits.
    pub fn fits_prompt(&self, n_prompt: usize) -> bool {
        match self.context_size {
            0 => true,
            n => usize::try_from(n).is_ok_and(|n| n >= n_prompt),
        }
    }

    pub fn effective_threads(&self) -> i32 {
        if self.threads > 0 {
            self.threads
        } else {
            default_threads()
        }
    }

    pub fn effective_temperature(&self) -> f32 {
        if self.temperature.is_nan() || self.temperature < 0.0 {
            0.0
        } else {
            self.temperature
        }
    }

    /// Context parameters for a prompt of `n_prompt` tokens.
    pub fn session_params(&self, n_prompt: usize) -> SessionParams {
        let threads = self.effective_threads();
        SessionParams {
            n_ctx: self.context_size.max(0) as u32,
            n_batch: n_prompt as u32,
            n_threads: threads,
            n_threads_batch: threads,
        }
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::with_temperature(self.effective_temperature())
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new(String::new())
    }
}
