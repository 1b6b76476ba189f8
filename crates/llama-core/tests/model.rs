//! llama.cpp-backed checks.
//!
//! Tests that need weights read a GGUF path from `RUNNABLE_TEST_MODEL` and are
//! ignored by default:
//!
//! ```sh
//! RUNNABLE_TEST_MODEL=/models/tinyllama-q4_0.gguf cargo test -p llama-core -- --ignored
//! ```

use std::path::{Path, PathBuf};

use llama_core::{LlamaBackend, LlamaCpp, LlamaModel, ModelParams};
use runnable_core::{Bridge, GenerateError, GenerationRequest, InferenceModel, Vocabulary};

fn test_model_path() -> PathBuf {
    std::env::var_os("RUNNABLE_TEST_MODEL")
        .map(PathBuf::from)
        .expect("set RUNNABLE_TEST_MODEL to a GGUF file")
}

fn load() -> LlamaModel {
    LlamaBackend::init(None);
    LlamaModel::load_from_file(&test_model_path(), &ModelParams::default()).unwrap()
}

#[test]
fn test_missing_file_is_load_error() {
    LlamaBackend::init(None);
    let err = LlamaModel::load_from_file(
        Path::new("/nonexistent/model.gguf"),
        &ModelParams::default(),
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_bridge_load_failure_yields_null_handle() {
    let bridge = Bridge::new(LlamaCpp);
    assert_eq!(bridge.load_model("/nonexistent/model.gguf", 0), 0);
    assert_eq!(bridge.generate(0, "Hello", 512, 4, 2, 0.7), "Model not loaded");
}

#[test]
fn test_corrupt_file_yields_null_handle() {
    let dir = std::env::temp_dir().join(format!("runnable-corrupt-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("corrupt.gguf");
    std::fs::write(&path, b"definitely not a gguf file").unwrap();

    let bridge = Bridge::new(LlamaCpp);
    assert_eq!(bridge.load_model(path.to_str().unwrap(), 0), 0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_system_info_is_not_empty() {
    LlamaBackend::init(None);
    assert!(!LlamaBackend::system_info().is_empty());
}

#[test]
#[ignore = "requires RUNNABLE_TEST_MODEL"]
fn test_tokenize_round_trip() {
    let model = load();
    let vocab = InferenceModel::vocab(&model);
    let text = "The quick brown fox jumps over the lazy dog";
    let tokens = Vocabulary::tokenize(&vocab, text).unwrap();
    assert!(tokens.len() > 1);
    assert_eq!(tokens, Vocabulary::tokenize(&vocab, text).unwrap());

    // BOS renders as its special text; skip it
    let bytes: Vec<u8> = tokens
        .iter()
        .filter(|&&t| t != vocab.bos())
        .flat_map(|&t| Vocabulary::token_to_piece(&vocab, t))
        .collect();
    let rebuilt = String::from_utf8_lossy(&bytes);
    assert_eq!(rebuilt.trim_start(), text);
}

#[test]
#[ignore = "requires RUNNABLE_TEST_MODEL"]
fn test_empty_prompt_does_not_tokenize() {
    let model = load();
    let vocab = InferenceModel::vocab(&model);
    assert_eq!(
        Vocabulary::tokenize(&vocab, ""),
        Err(runnable_core::TokenizeError::Empty)
    );
}

#[test]
#[ignore = "requires RUNNABLE_TEST_MODEL"]
fn test_generate_scenarios() {
    let bridge = Bridge::new(LlamaCpp);
    let path = test_model_path();
    let handle = bridge.load_model(path.to_str().unwrap(), 0);
    assert_ne!(handle, 0);

    assert_eq!(bridge.generate(handle, "Hello", 512, 0, 2, 0.7), "Hello");
    assert_eq!(bridge.generate(handle, "", 512, 8, 2, 0.7), "Tokenization failed");
    assert_eq!(
        bridge.generate(handle, "Hello there, how are you today?", 2, 8, 2, 0.7),
        GenerateError::ContextInitFailed.to_string()
    );

    let out = bridge
        .generate_request(
            handle,
            &GenerationRequest {
                max_tokens: 8,
                ..GenerationRequest::new("Once upon a time")
            },
        )
        .unwrap();
    assert!(out.text.starts_with("Once upon a time"));
    assert!(out.completion_tokens <= 8);

    bridge.free_model(handle);
    assert_eq!(bridge.generate(handle, "Hello", 512, 0, 2, 0.7), "Model not loaded");
}
