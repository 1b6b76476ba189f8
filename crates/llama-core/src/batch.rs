//! Safe wrapper around `llama_batch`.

use runnable_core::Token;

use crate::error::{LlamaError, Result};

/// RAII batch of tokens for a single sequence.
pub struct LlamaBatch {
    inner: llama_sys::llama_batch,
    capacity: usize,
}

impl LlamaBatch {
    /// Allocate a batch with room for `capacity` tokens of sequence 0.
    pub fn new(capacity: usize) -> Self {
        let inner = unsafe { llama_sys::llama_batch_init(capacity.max(1) as i32, 0, 1) };
        Self {
            inner,
            capacity: capacity.max(1),
        }
    }

    /// The raw batch, passed to llama.cpp by value.
    pub fn raw(&self) -> llama_sys::llama_batch {
        self.inner
    }

    /// Number of tokens currently stored.
    pub fn n_tokens(&self) -> i32 {
        self.inner.n_tokens
    }

    /// Remove all tokens.
    pub fn clear(&mut self) {
        self.inner.n_tokens = 0;
    }

    /// Push a token at absolute position `pos`.
    pub fn add(&mut self, token: Token, pos: i32, logits: bool) -> Result<()> {
        let i = self.inner.n_tokens as usize;
        if i >= self.capacity {
            return Err(LlamaError::BatchOverflow {
                requested: i + 1,
                capacity: self.capacity,
            });
        }

        unsafe {
            *self.inner.token.add(i) = token;
            *self.inner.pos.add(i) = pos;
            *self.inner.n_seq_id.add(i) = 1;
            *(*self.inner.seq_id.add(i)).add(0) = 0;
            *self.inner.logits.add(i) = i8::from(logits);
        }
        self.inner.n_tokens += 1;
        Ok(())
    }

    /// Replace the contents with `tokens` starting at `start_pos`.
    /// Only the last token requests logits.
    pub fn fill(&mut self, tokens: &[Token], start_pos: i32) -> Result<()> {
        if tokens.len() > self.capacity {
            return Err(LlamaError::BatchOverflow {
                requested: tokens.len(),
                capacity: self.capacity,
            });
        }
        self.clear();
        let last = tokens.len().saturating_sub(1);
        for (i, &tok) in tokens.iter().enumerate() {
            self.add(tok, start_pos + i as i32, i == last)?;
        }
        Ok(())
    }
}

impl Drop for LlamaBatch {
    fn drop(&mut self) {
        unsafe { llama_sys::llama_batch_free(self.inner) }
    }
}
