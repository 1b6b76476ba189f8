//! Process-wide llama.cpp bridge.
//!
//! Exposes one shared [`Bridge`] over the llama.cpp engine, the C ABI built
//! on it ([`ffi`]) and the persisted CLI defaults ([`config`]).

pub mod config;
pub mod ffi;

use std::sync::LazyLock;

use llama_core::LlamaCpp;
use runnable_core::Bridge;

static BRIDGE: LazyLock<Bridge<LlamaCpp>> = LazyLock::new(|| Bridge::new(LlamaCpp));

/// The bridge shared by every caller in this process.
pub fn bridge() -> &'static Bridge<LlamaCpp> {
    &BRIDGE
}
