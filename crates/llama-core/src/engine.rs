//! llama.cpp implementation of the `runnable-core` engine traits.

use std::path::Path;

use runnable_core::{
    Backend, InferenceModel, LoadError, ModelParams, SamplerConfig, SessionError, SessionParams,
};

use crate::backend::LlamaBackend;
use crate::model::LlamaModel;
use crate::session::LlamaSession;
use crate::vocab::LlamaVocab;

/// The llama.cpp engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlamaCpp;

impl Backend for LlamaCpp {
    type Model = LlamaModel;

    fn initialize(&self, plugin_dir: Option<&Path>) {
        LlamaBackend::init(plugin_dir);
    }

    fn load_model(&self, path: &Path, params: &ModelParams) -> Result<LlamaModel, LoadError> {
        Ok(LlamaModel::load_from_file(path, params)?)
    }

    fn system_info(&self) -> String {
        LlamaBackend::system_info()
    }
}

impl InferenceModel for LlamaModel {
    type Vocab<'m> = LlamaVocab<'m>;
    type Session<'m> = LlamaSession<'m>;

    fn vocab(&self) -> LlamaVocab<'_> {
        LlamaModel::vocab(self)
    }

    fn new_session(
        &self,
        params: &SessionParams,
        sampling: &SamplerConfig,
    ) -> Result<LlamaSession<'_>, SessionError> {
        Ok(LlamaSession::new(self, params, sampling)?)
    }
}
