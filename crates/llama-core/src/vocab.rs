//! Tokenization / detokenization over a model's vocabulary.

use std::ffi::CString;
use std::marker::PhantomData;

use runnable_core::{Token, TokenizeError, Vocabulary};

use crate::model::LlamaModel;

/// Fixed piece buffer; longer pieces render as empty.
const PIECE_BUF_LEN: usize = 256;

/// Borrowed `llama_vocab` view. Valid exactly as long as its model.
#[derive(Clone, Copy)]
pub struct LlamaVocab<'m> {
    ptr: *const llama_sys::llama_vocab,
    _model: PhantomData<&'m LlamaModel>,
}

impl LlamaVocab<'_> {
    pub(crate) fn new(ptr: *const llama_sys::llama_vocab) -> Self {
        Self {
            ptr,
            _model: PhantomData,
        }
    }

    pub fn bos(&self) -> Token {
        unsafe { llama_sys::llama_vocab_bos(self.ptr) }
    }

    /// Tokenize `text`, adding BOS and parsing special tokens.
    ///
    /// The required length is probed with an empty buffer first; llama.cpp
    /// reports it negated. Empty text is rejected up front, since BOS alone
    /// would otherwise make it look tokenizable.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        if text.is_empty() {
            return Err(TokenizeError::Empty);
        }
        let c_text = CString::new(text).map_err(|_| TokenizeError::InteriorNul)?;
        let text_len = i32::try_from(text.len()).map_err(|_| TokenizeError::TooLong(text.len()))?;

        // First call: query required buffer size (returns negative count).
        let probe = unsafe {
            llama_sys::llama_tokenize(
                self.ptr,
                c_text.as_ptr(),
                text_len,
                std::ptr::null_mut(),
                0,
                true, // add_special
                true, // parse_special
            )
        };
        let n_tokens = required_len(probe)?;

        let mut tokens = vec![0 as Token; n_tokens as usize];
        let actual = unsafe {
            llama_sys::llama_tokenize(
                self.ptr,
                c_text.as_ptr(),
                text_len,
                tokens.as_mut_ptr(),
                n_tokens,
                true,
                true,
            )
        };

        if actual < 0 {
            return Err(TokenizeError::Rejected(actual));
        }

        tokens.truncate(actual as usize);
        Ok(tokens)
    }

    /// Raw bytes of one token, rendering special tokens.
    ///
    /// Pieces that do not fit the fixed buffer, and invalid tokens, yield no
    /// bytes.
    pub fn token_to_piece(&self, token: Token) -> Vec<u8> {
        let mut buf = vec![0u8; PIECE_BUF_LEN];
        let len = unsafe {
            llama_sys::llama_token_to_piece(
                self.ptr,
                token,
                buf.as_mut_ptr() as *mut std::ffi::c_char,
                buf.len() as i32,
                0,    // lstrip
                true, // special
            )
        };

        if len < 0 {
            return Vec::new();
        }
        buf.truncate(len as usize);
        buf
    }

    /// End-of-generation check (EOS, EOT and friends).
    pub fn is_eog(&self, token: Token) -> bool {
        unsafe { llama_sys::llama_vocab_is_eog(self.ptr, token) }
    }
}

/// Token count from a size probe. llama.cpp reports the required length
/// negated; anything else means the text yields no tokens.
fn required_len(probe: i32) -> Result<i32, TokenizeError> {
    match probe.checked_neg() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(TokenizeError::Empty),
    }
}

impl Vocabulary for LlamaVocab<'_> {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        LlamaVocab::tokenize(self, text)
    }

    fn token_to_piece(&self, token: Token) -> Vec<u8> {
        LlamaVocab::token_to_piece(self, token)
    }

    fn is_eog(&self, token: Token) -> bool {
        LlamaVocab::is_eog(self, token)
    }
}
