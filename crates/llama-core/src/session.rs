//! One generation session: context, sampler chain and decode position.

use runnable_core::{DecodeError, DecodeSession, SamplerConfig, SessionParams, Token};
use tracing::debug;

use crate::batch::LlamaBatch;
use crate::context::LlamaContext;
use crate::error::Result;
use crate::model::LlamaModel;
use crate::sampler::SamplerChain;

/// Field order is drop order: the sampler goes before the context.
pub struct LlamaSession<'m> {
    sampler: SamplerChain,
    batch: LlamaBatch,
    ctx: LlamaContext<'m>,
    n_past: i32,
}

impl<'m> LlamaSession<'m> {
    pub fn new(
        model: &'m LlamaModel,
        params: &SessionParams,
        sampling: &SamplerConfig,
    ) -> Result<Self> {
        let ctx = LlamaContext::new(model, params)?;
        let sampler = SamplerChain::from_config(sampling)?;
        let batch = LlamaBatch::new(params.n_batch as usize);
        Ok(Self {
            sampler,
            batch,
            ctx,
            n_past: 0,
        })
    }

    fn decode_tokens(&mut self, tokens: &[Token]) -> Result<()> {
        self.batch.fill(tokens, self.n_past)?;
        self.ctx.decode(&self.batch)?;
        self.n_past += tokens.len() as i32;
        Ok(())
    }
}

impl DecodeSession for LlamaSession<'_> {
    fn decode(&mut self, tokens: &[Token]) -> std::result::Result<(), DecodeError> {
        self.decode_tokens(tokens).map_err(DecodeError::from)
    }

    fn sample(&mut self) -> Token {
        self.sampler.sample(&self.ctx, -1)
    }
}

impl Drop for LlamaSession<'_> {
    fn drop(&mut self) {
        let stats = self.ctx.stats();
        debug!(
            n_past = self.n_past,
            prefill_tps = stats.prefill_tps(),
            decode_tps = stats.decode_tps(),
            "Session released"
        );
    }
}
