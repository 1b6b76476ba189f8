//! Scripted in-memory engine used by the unit tests.
//!
//! Tokens are one per character (`CHAR_BASE + codepoint`) behind a BOS
//! marker, plus single-byte tokens above `BYTE_BASE`. Sampling replays a
//! fixed script, and decode failures can be injected by call index
//! (0 = prefill).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{
    Backend, DecodeSession, InferenceModel, ModelParams, SessionParams, Token, Vocabulary,
};
use crate::error::{DecodeError, LoadError, SessionError, TokenizeError};
use crate::sampling::SamplerConfig;

pub const BOS: Token = 1;
pub const EOS: Token = 2;
const CHAR_BASE: Token = 100;
const BYTE_BASE: Token = 0x20_0000;

pub fn tok(c: char) -> Token {
    CHAR_BASE + c as Token
}

/// Token rendering as a single raw byte, like a byte-fallback vocabulary.
pub fn byte_tok(b: u8) -> Token {
    BYTE_BASE + b as Token
}

/// Observations shared between a model, its sessions and the test.
#[derive(Debug, Default)]
pub struct Probe {
    pub sessions_created: AtomicUsize,
    pub sessions_live: AtomicUsize,
    pub models_live: AtomicUsize,
    pub decode_batches: Mutex<Vec<Vec<Token>>>,
    pub last_params: Mutex<Option<SessionParams>>,
    pub last_sampling: Mutex<Option<SamplerConfig>>,
}

impl Probe {
    pub fn live_sessions(&self) -> usize {
        self.sessions_live.load(Ordering::SeqCst)
    }
    pub fn created_sessions(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }
    pub fn live_models(&self) -> usize {
        self.models_live.load(Ordering::SeqCst)
    }
    pub fn batches(&self) -> Vec<Vec<Token>> {
        self.decode_batches.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct MockModel {
    pub script: Vec<Token>,
    pub fail_context: bool,
    pub fail_decode_call: Option<usize>,
    pub probe: Arc<Probe>,
    counted: bool,
}

impl MockModel {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.chars().map(tok).collect(),
            fail_context: false,
            fail_decode_call: None,
            probe: Arc::new(Probe::default()),
            counted: false,
        }
    }

    pub fn with_script(mut self, script: Vec<Token>) -> Self {
        self.script = script;
        self
    }

    pub fn failing_context(mut self) -> Self {
        self.fail_context = true;
        self
    }

    pub fn failing_decode_at(mut self, call: usize) -> Self {
        self.fail_decode_call = Some(call);
        self
    }

    fn instance(&self) -> Self {
        self.probe.models_live.fetch_add(1, Ordering::SeqCst);
        Self {
            script: self.script.clone(),
            fail_context: self.fail_context,
            fail_decode_call: self.fail_decode_call,
            probe: self.probe.clone(),
            counted: true,
        }
    }
}

impl Drop for MockModel {
    fn drop(&mut self) {
        if self.counted {
            self.probe.models_live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Vocabulary for &MockModel {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        if text.contains('\0') {
            return Err(TokenizeError::InteriorNul);
        }
        if text.is_empty() {
            return Err(TokenizeError::Empty);
        }
        Ok(std::iter::once(BOS).chain(text.chars().map(tok)).collect())
    }

    fn token_to_piece(&self, token: Token) -> Vec<u8> {
        if token >= BYTE_BASE {
            return vec![(token - BYTE_BASE) as u8];
        }
        if token < CHAR_BASE {
            return Vec::new();
        }
        char::from_u32((token - CHAR_BASE) as u32)
            .map(|c| c.to_string().into_bytes())
            .unwrap_or_default()
    }

    fn is_eog(&self, token: Token) -> bool {
        token == EOS
    }
}

pub struct MockSession<'m> {
    model: &'m MockModel,
    cursor: usize,
    decode_calls: usize,
}

impl DecodeSession for MockSession<'_> {
    fn decode(&mut self, tokens: &[Token]) -> Result<(), DecodeError> {
        let call = self.decode_calls;
        self.decode_calls += 1;
        self.model
            .probe
            .decode_batches
            .lock()
            .unwrap()
            .push(tokens.to_vec());
        if self.model.fail_decode_call == Some(call) {
            return Err(DecodeError(1));
        }
        Ok(())
    }

    fn sample(&mut self) -> Token {
        let token = self.model.script.get(self.cursor).copied().unwrap_or(tok('x'));
        self.cursor += 1;
        token
    }
}

impl Drop for MockSession<'_> {
    fn drop(&mut self) {
        self.model.probe.sessions_live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InferenceModel for MockModel {
    type Vocab<'m> = &'m MockModel;
    type Session<'m> = MockSession<'m>;

    fn vocab(&self) -> Self::Vocab<'_> {
        self
    }

    fn new_session(
        &self,
        params: &SessionParams,
        sampling: &SamplerConfig,
    ) -> Result<Self::Session<'_>, SessionError> {
        *self.probe.last_params.lock().unwrap() = Some(params.clone());
        *self.probe.last_sampling.lock().unwrap() = Some(sampling.clone());
        if self.fail_context {
            return Err(SessionError("out of memory".into()));
        }
        self.probe.sessions_created.fetch_add(1, Ordering::SeqCst);
        self.probe.sessions_live.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            model: self,
            cursor: 0,
            decode_calls: 0,
        })
    }
}

/// Loads any path ending in `.gguf`; everything else fails.
#[derive(Debug)]
pub struct MockBackend {
    pub template: MockModel,
    pub init_calls: AtomicUsize,
    pub init_dirs: Mutex<Vec<Option<PathBuf>>>,
    pub loads: Mutex<Vec<(PathBuf, ModelParams)>>,
}

impl MockBackend {
    pub fn new(template: MockModel) -> Self {
        Self {
            template,
            init_calls: AtomicUsize::new(0),
            init_dirs: Mutex::new(Vec::new()),
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn probe(&self) -> Arc<Probe> {
        self.template.probe.clone()
    }
}

impl Backend for MockBackend {
    type Model = MockModel;

    fn initialize(&self, plugin_dir: Option<&Path>) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.init_dirs
            .lock()
            .unwrap()
            .push(plugin_dir.map(Path::to_path_buf));
    }

    fn load_model(&self, path: &Path, params: &ModelParams) -> Result<MockModel, LoadError> {
        self.loads.lock().unwrap().push((path.to_path_buf(), *params));
        if path.extension().is_some_and(|ext| ext == "gguf") {
            Ok(self.template.instance())
        } else {
            Err(LoadError::NotFound(path.to_path_buf()))
        }
    }

    fn system_info(&self) -> String {
        "CPU : NEON = 1 | mock".into()
    }
}
