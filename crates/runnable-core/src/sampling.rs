//! Sampler chain configuration.

use serde::{Deserialize, Serialize};

/// Keep the 40 most likely tokens.
pub const DEFAULT_TOP_K: i32 = 40;
/// Nucleus probability mass.
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_MIN_KEEP: usize = 1;
/// Fixed distribution seed of the final draw.
pub const DEFAULT_SEED: u32 = 0;

/// One transform of the sampler chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerStage {
    TopK(i32),
    TopP { p: f32, min_keep: usize },
    Temperature(f32),
    /// Categorical draw from the remaining distribution.
    Dist { seed: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_top_k")]
    pub top_k: i32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_min_keep")]
    pub min_keep: usize,
    pub temperature: f32,
    #[serde(default)]
    pub seed: u32,
}

fn default_top_k() -> i32 {
    DEFAULT_TOP_K
}
fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}
fn default_min_keep() -> usize {
    DEFAULT_MIN_KEEP
}

impl SamplerConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            min_keep: DEFAULT_MIN_KEEP,
            temperature,
            seed: DEFAULT_SEED,
        }
    }

    /// Stages in application order: top-k, top-p, temperature, draw.
    ///
    /// Engines must add them to their chain in exactly this order; any other
    /// order changes the output distribution.
    pub fn stages(&self) -> [SamplerStage; 4] {
        [
            SamplerStage::TopK(self.top_k),
            SamplerStage::TopP {
                p: self.top_p,
                min_keep: self.min_keep,
            },
            SamplerStage::Temperature(self.temperature),
            SamplerStage::Dist { seed: self.seed },
        ]
    }
}
