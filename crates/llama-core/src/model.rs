//! Loaded GGUF weights.

use std::ffi::{CString, c_char};
use std::path::Path;

use runnable_core::ModelParams;
use tracing::{debug, info};

use crate::error::{LlamaError, Result};
use crate::vocab::LlamaVocab;

/// Owns a `llama_model`. Not `Clone`: exactly one owner frees the weights.
pub struct LlamaModel {
    ptr: *mut llama_sys::llama_model,
}

// Safety: llama_model is internally read-only after creation.
unsafe impl Send for LlamaModel {}
unsafe impl Sync for LlamaModel {}

fn c_path(path: &Path) -> Result<CString> {
    let failed = |reason: &str| LlamaError::ModelLoadFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    };
    let s = path.to_str().ok_or_else(|| failed("path is not valid UTF-8"))?;
    CString::new(s).map_err(|_| failed("path contains a NUL byte"))
}

impl LlamaModel {
    /// Load a GGUF file, offloading `n_gpu_layers` layers when a GPU backend
    /// is available.
    pub fn load_from_file(path: &Path, params: &ModelParams) -> Result<Self> {
        if !path.is_file() {
            return Err(LlamaError::ModelNotFound(path.to_path_buf()));
        }
        let c_path = c_path(path)?;

        let mut raw = unsafe { llama_sys::llama_model_default_params() };
        raw.n_gpu_layers = params.n_gpu_layers;

        info!(path = %path.display(), n_gpu_layers = params.n_gpu_layers, "Loading model…");
        let ptr = unsafe { llama_sys::llama_model_load_from_file(c_path.as_ptr(), raw) };
        if ptr.is_null() {
            return Err(LlamaError::ModelLoadFailed {
                path: path.display().to_string(),
                reason: "not a loadable GGUF model".into(),
            });
        }

        let model = Self { ptr };
        info!(
            path = %path.display(),
            desc = %model.desc(),
            n_params = model.n_params(),
            size_mib = model.size() / (1024 * 1024),
            n_ctx_train = model.n_ctx_train(),
            "Model loaded"
        );
        Ok(model)
    }

    pub(crate) fn as_ptr(&self) -> *mut llama_sys::llama_model {
        self.ptr
    }

    /// Vocabulary view, valid for the lifetime of the model.
    pub fn vocab(&self) -> LlamaVocab<'_> {
        LlamaVocab::new(unsafe { llama_sys::llama_model_get_vocab(self.ptr) })
    }

    pub fn n_params(&self) -> u64 {
        unsafe { llama_sys::llama_model_n_params(self.ptr) }
    }

    /// Tensor bytes.
    pub fn size(&self) -> u64 {
        unsafe { llama_sys::llama_model_size(self.ptr) }
    }

    /// Context length the model was trained with; the size a session gets
    /// when it asks for 0.
    pub fn n_ctx_train(&self) -> i32 {
        unsafe { llama_sys::llama_model_n_ctx_train(self.ptr) }
    }

    /// Short "arch size quant" description, e.g. `llama 1B Q4_0`.
    pub fn desc(&self) -> String {
        let mut buf = [0u8; 128];
        let len = unsafe {
            llama_sys::llama_model_desc(self.ptr, buf.as_mut_ptr() as *mut c_char, buf.len())
        };
        match usize::try_from(len) {
            Ok(n) => String::from_utf8_lossy(&buf[..n.min(buf.len() - 1)]).into_owned(),
            Err(_) => String::new(),
        }
    }
}

impl Drop for LlamaModel {
    fn drop(&mut self) {
        debug!("Freeing llama model");
        unsafe { llama_sys::llama_model_free(self.ptr) }
    }
}
