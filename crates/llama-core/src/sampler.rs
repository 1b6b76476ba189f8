//! Sampler chain construction and token sampling.

use runnable_core::{SamplerConfig, SamplerStage, Token};
use tracing::debug;

use crate::context::LlamaContext;
use crate::error::{LlamaError, Result};

/// RAII wrapper around a `llama_sampler` chain.
pub struct SamplerChain {
    ptr: *mut llama_sys::llama_sampler,
}

unsafe impl Send for SamplerChain {}

impl SamplerChain {
    /// Create an empty sampler chain.
    pub fn new() -> Result<Self> {
        let params = unsafe { llama_sys::llama_sampler_chain_default_params() };
        let ptr = unsafe { llama_sys::llama_sampler_chain_init(params) };
        if ptr.is_null() {
            return Err(LlamaError::SamplerInitFailed(
                "llama_sampler_chain_init returned null".into(),
            ));
        }
        Ok(Self { ptr })
    }

    /// Build the chain described by `config`, stage by stage in order.
    pub fn from_config(config: &SamplerConfig) -> Result<Self> {
        let mut chain = Self::new()?;
        for stage in config.stages() {
            chain.add(stage);
        }
        debug!(?config, "Sampler chain built");
        Ok(chain)
    }

    pub fn add(&mut self, stage: SamplerStage) {
        match stage {
            SamplerStage::TopK(k) => self.add_top_k(k),
            SamplerStage::TopP { p, min_keep } => self.add_top_p(p, min_keep),
            SamplerStage::Temperature(t) => self.add_temp(t),
            SamplerStage::Dist { seed } => self.add_dist(seed),
        }
    }

    //  Sampler primitives

    pub fn add_dist(&mut self, seed: u32) {
        unsafe {
            llama_sys::llama_sampler_chain_add(self.ptr, llama_sys::llama_sampler_init_dist(seed))
        }
    }

    pub fn add_top_k(&mut self, k: i32) {
        unsafe {
            llama_sys::llama_sampler_chain_add(self.ptr, llama_sys::llama_sampler_init_top_k(k))
        }
    }

    pub fn add_top_p(&mut self, p: f32, min_keep: usize) {
        unsafe {
            llama_sys::llama_sampler_chain_add(
                self.ptr,
                llama_sys::llama_sampler_init_top_p(p, min_keep),
            )
        }
    }

    pub fn add_temp(&mut self, t: f32) {
        unsafe {
            llama_sys::llama_sampler_chain_add(self.ptr, llama_sys::llama_sampler_init_temp(t))
        }
    }

    pub fn len(&self) -> i32 {
        unsafe { llama_sys::llama_sampler_chain_n(self.ptr) }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    //  Sampling

    /// Sample the next token from the logits at batch index `idx`
    /// (-1 = last output of the previous decode).
    pub fn sample(&mut self, ctx: &LlamaContext<'_>, idx: i32) -> Token {
        unsafe { llama_sys::llama_sampler_sample(self.ptr, ctx.as_ptr(), idx) }
    }
}

impl Drop for SamplerChain {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            debug!("Freeing sampler chain");
            unsafe { llama_sys::llama_sampler_free(self.ptr) }
        }
    }
}
