//! Raw bindgen output for `llama.h` and `ggml-backend.h`.
//!
//! Everything here is `unsafe`; use the `llama-core` crate instead.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
