//! `llama_context`: the KV cache and decode state of one session.

use std::marker::PhantomData;

use runnable_core::SessionParams;
use tracing::debug;

use crate::batch::LlamaBatch;
use crate::error::{LlamaError, Result};
use crate::model::LlamaModel;

/// Owns a `llama_context` built from a model that must outlive it.
pub struct LlamaContext<'m> {
    ptr: *mut llama_sys::llama_context,
    _model: PhantomData<&'m LlamaModel>,
}

impl<'m> LlamaContext<'m> {
    /// `n_ctx == 0` takes the model's training context.
    pub fn new(model: &'m LlamaModel, params: &SessionParams) -> Result<Self> {
        let mut raw = unsafe { llama_sys::llama_context_default_params() };
        raw.n_ctx = params.n_ctx;
        raw.n_batch = params.n_batch;
        raw.n_threads = params.n_threads;
        raw.n_threads_batch = params.n_threads_batch;
        raw.no_perf = false;

        let ptr = unsafe { llama_sys::llama_init_from_model(model.as_ptr(), raw) };
        if ptr.is_null() {
            return Err(LlamaError::ContextCreationFailed(format!(
                "llama_init_from_model returned null (n_ctx {}, n_batch {})",
                params.n_ctx, params.n_batch
            )));
        }

        let ctx = Self {
            ptr,
            _model: PhantomData,
        };
        debug!(
            n_ctx = ctx.n_ctx(),
            n_batch = params.n_batch,
            n_threads = params.n_threads,
            "Context created"
        );
        Ok(ctx)
    }

    pub(crate) fn as_ptr(&self) -> *mut llama_sys::llama_context {
        self.ptr
    }

    /// Resolved context size.
    pub fn n_ctx(&self) -> u32 {
        unsafe { llama_sys::llama_n_ctx(self.ptr) }
    }

    /// Non-zero status codes from `llama_decode` are errors, including the
    /// warning code 1 (no KV slot).
    pub fn decode(&mut self, batch: &LlamaBatch) -> Result<()> {
        match unsafe { llama_sys::llama_decode(self.ptr, batch.raw()) } {
            0 => Ok(()),
            rc => Err(LlamaError::DecodeFailed(rc)),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        let d = unsafe { llama_sys::llama_perf_context(self.ptr) };
        DecodeStats {
            prefill_ms: d.t_p_eval_ms,
            decode_ms: d.t_eval_ms,
            prefill_tokens: d.n_p_eval,
            decode_tokens: d.n_eval,
        }
    }
}

impl Drop for LlamaContext<'_> {
    fn drop(&mut self) {
        unsafe { llama_sys::llama_free(self.ptr) }
    }
}

/// Timings llama.cpp accumulated for one context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeStats {
    pub prefill_ms: f64,
    pub decode_ms: f64,
    pub prefill_tokens: i32,
    pub decode_tokens: i32,
}

fn tokens_per_sec(n: i32, ms: f64) -> f64 {
    if ms > 0.0 { f64::from(n) * 1000.0 / ms } else { 0.0 }
}

impl DecodeStats {
    pub fn prefill_tps(&self) -> f64 {
        tokens_per_sec(self.prefill_tokens, self.prefill_ms)
    }

    pub fn decode_tps(&self) -> f64 {
        tokens_per_sec(self.decode_tokens, self.decode_ms)
    }
}
