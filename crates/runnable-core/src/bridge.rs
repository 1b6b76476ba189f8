//! Boundary operations over a [`Backend`].
//!
//! Every operation here returns plain values: handles are `u64` with `0`
//! meaning failure, and generation returns either the generated text or one
//! of the literal [`GenerateError`] strings.

use std::path::Path;
use std::sync::Once;

use tracing::{error, info};

use crate::engine::{Backend, ModelParams};
use crate::error::{BridgeError, GenerateError};
use crate::generate::{Generation, generate};
use crate::registry::{ModelHandle, ModelRegistry};
use crate::request::GenerationRequest;

pub struct Bridge<B: Backend> {
    backend: B,
    init: Once,
    models: ModelRegistry<B::Model>,
}

impl<B: Backend> Bridge<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            init: Once::new(),
            models: ModelRegistry::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn models(&self) -> &ModelRegistry<B::Model> {
        &self.models
    }

    //  Backend runtime

    /// Initialize the engine once per bridge. A `None` or empty
    /// `plugin_dir` loads the backends available without plugins. Only the
    /// first call has an effect.
    pub fn initialize_backend(&self, plugin_dir: Option<&str>) {
        self.init.call_once(|| {
            let dir = plugin_dir.filter(|d| !d.is_empty()).map(Path::new);
            self.backend.initialize(dir);
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.init.is_completed()
    }

    //  Model store

    /// Load a model; returns `0` on any failure.
    pub fn load_model(&self, path: &str, gpu_layers: i32) -> u64 {
        self.initialize_backend(None);
        let params = ModelParams {
            n_gpu_layers: gpu_layers,
        };
        match self.backend.load_model(Path::new(path), &params) {
            Ok(model) => self.models.insert(Path::new(path), model).as_raw(),
            Err(e) => {
                error!("{e}");
                ModelHandle::NULL.as_raw()
            }
        }
    }

    /// Release a model. No-op for `0` and for handles already freed.
    pub fn free_model(&self, handle: u64) {
        self.models.remove(ModelHandle::from_raw(handle));
    }

    //  Generation

    /// Run `request` against the model behind `handle`.
    ///
    /// Sessions against one model are serialized.
    pub fn generate_request(
        &self,
        handle: u64,
        request: &GenerationRequest,
    ) -> Result<Generation, GenerateError> {
        let loaded = self
            .models
            .get(ModelHandle::from_raw(handle))
            .ok_or(GenerateError::ModelNotLoaded)?;
        loaded.with_exclusive(|model| generate(model, request))
    }

    /// Boundary form of [`Self::generate_request`]: generated text on
    /// success, the literal error string otherwise.
    pub fn generate(
        &self,
        handle: u64,
        prompt: &str,
        context_size: i32,
        max_tokens: i32,
        threads: i32,
        temperature: f32,
    ) -> String {
        let request =
            GenerationRequest::from_raw(prompt, context_size, max_tokens, threads, temperature);
        self.generate_request(handle, &request)
            .map_or_else(|e| e.to_string(), |generation| generation.text)
    }

    /// Load `path`, generate once, and free the model on every path.
    pub fn generate_from_file(
        &self,
        path: &str,
        gpu_layers: i32,
        request: &GenerationRequest,
    ) -> Result<Generation, BridgeError> {
        let handle = self.load_model(path, gpu_layers);
        if handle == 0 {
            return Err(BridgeError::LoadFailed(path.to_owned()));
        }
        info!(path, "Generating from file");
        let result = self.generate_request(handle, request);
        self.free_model(handle);
        Ok(result?)
    }

    //  System info

    pub fn system_info(&self) -> String {
        self.initialize_backend(None);
        self.backend.system_info()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::generate::FinishReason;
    use crate::testing::{EOS, MockBackend, MockModel, tok};

    fn bridge(script: &str) -> Bridge<MockBackend> {
        Bridge::new(MockBackend::new(MockModel::new(script)))
    }

    #[test]
    fn test_initialize_runs_once_and_first_dir_wins() {
        let b = bridge("");
        assert!(!b.is_initialized());
        b.initialize_backend(Some("/data/app/lib"));
        b.initialize_backend(Some("/other"));
        b.initialize_backend(None);
        assert!(b.is_initialized());
        assert_eq!(b.backend().init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *b.backend().init_dirs.lock().unwrap(),
            vec![Some(PathBuf::from("/data/app/lib"))]
        );
    }

    #[test]
    fn test_empty_plugin_dir_means_none() {
        let b = bridge("");
        b.initialize_backend(Some(""));
        assert_eq!(*b.backend().init_dirs.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_load_initializes_lazily() {
        let b = bridge("");
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_ne!(h, 0);
        assert!(b.is_initialized());
        assert_eq!(b.backend().init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_passes_gpu_layers() {
        let b = bridge("");
        b.load_model("/models/tiny.gguf", 33);
        let loads = b.backend().loads.lock().unwrap();
        assert_eq!(loads[0].1.n_gpu_layers, 33);
    }

    #[test]
    fn test_failed_load_returns_zero() {
        let b = bridge("");
        assert_eq!(b.load_model("/models/missing.bin", 0), 0);
        assert!(b.models().is_empty());
    }

    #[test]
    fn test_null_handle_is_model_not_loaded() {
        let b = bridge("abc");
        assert_eq!(b.generate(0, "Hello", 512, 8, 2, 0.7), "Model not loaded");
        assert_eq!(b.backend().probe().created_sessions(), 0);
    }

    #[test]
    fn test_hello_with_zero_budget() {
        let b = bridge("abc");
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_eq!(b.generate(h, "Hello", 512, 0, 2, 0.7), "Hello");
    }

    #[test]
    fn test_literal_error_strings_at_boundary() {
        let b = Bridge::new(MockBackend::new(MockModel::new("abc").failing_decode_at(0)));
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_eq!(b.generate(h, "", 512, 8, 2, 0.7), "Tokenization failed");
        assert_eq!(b.generate(h, "Hello", 2, 8, 2, 0.7), "Context init failed");
        assert_eq!(b.generate(h, "Hello", -1, 8, 2, 0.7), "Context init failed");
        assert_eq!(b.generate(h, "Hello", 512, 8, 2, 0.7), "Decode failed");
        assert_eq!(b.backend().probe().live_sessions(), 0);
    }

    #[test]
    fn test_tokenization_failure_precedes_context_check() {
        let b = bridge("abc");
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_eq!(b.generate(h, "", -1, 8, 2, 0.7), "Tokenization failed");
        assert_eq!(b.generate(h, "", 0, 8, 2, 0.7), "Tokenization failed");
        assert_eq!(b.generate(h, "", i32::MIN, 8, 2, 0.7), "Tokenization failed");
        assert_eq!(b.backend().probe().created_sessions(), 0);
    }

    #[test]
    fn test_missing_model_precedes_every_other_error() {
        let b = bridge("abc");
        assert_eq!(b.generate(7, "", -1, 8, 2, 0.7), "Model not loaded");
        assert_eq!(b.generate(0, "Hello", -1, -1, -1, f32::NAN), "Model not loaded");
        assert_eq!(b.backend().probe().created_sessions(), 0);
    }

    #[test]
    fn test_generate_appends_continuation() {
        let model = MockModel::new("").with_script(vec![tok(' '), tok('y'), tok('o'), EOS]);
        let b = Bridge::new(MockBackend::new(model));
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_eq!(b.generate(h, "Hi", 512, 16, 0, 0.7), "Hi yo");

        let generation = b
            .generate_request(h, &GenerationRequest::new("Hi"))
            .unwrap();
        assert_eq!(generation.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_freed_handle_is_model_not_loaded() {
        let b = bridge("abc");
        let probe = b.backend().probe();
        let h = b.load_model("/models/tiny.gguf", 0);
        assert_eq!(probe.live_models(), 1);
        b.free_model(h);
        assert_eq!(probe.live_models(), 0);
        assert_eq!(b.generate(h, "Hello", 512, 4, 2, 0.7), "Model not loaded");
        b.free_model(h);
        b.free_model(0);
    }

    #[test]
    fn test_generate_from_file_frees_model() {
        let b = bridge("!!");
        let probe = b.backend().probe();
        let request = GenerationRequest {
            max_tokens: 2,
            ..GenerationRequest::new("Wow")
        };
        let out = b
            .generate_from_file("/models/tiny.gguf", 0, &request)
            .unwrap();
        assert_eq!(out.text, "Wow!!");
        assert_eq!(probe.live_models(), 0);
        assert!(b.models().is_empty());
    }

    #[test]
    fn test_generate_from_file_reports_load_failure() {
        let b = bridge("");
        let err = b
            .generate_from_file("/models/nope.bin", 0, &GenerationRequest::new("Hi"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to load model: /models/nope.bin");
    }

    #[test]
    fn test_generate_from_file_frees_on_generation_error() {
        let b = bridge("");
        let probe = b.backend().probe();
        let err = b
            .generate_from_file("/models/tiny.gguf", 0, &GenerationRequest::new(""))
            .unwrap_err();
        assert_eq!(err, BridgeError::Generate(GenerateError::TokenizationFailed));
        assert_eq!(probe.live_models(), 0);
    }

    #[test]
    fn test_system_info_initializes() {
        let b = bridge("");
        assert!(b.system_info().contains("mock"));
        assert!(b.is_initialized());
    }
}
