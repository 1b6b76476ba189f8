//! C ABI over the shared bridge.
//!
//! Strings returned by this module are owned by the library and must be
//! released with [`runnable_string_free`]. No panic unwinds into the caller:
//! each entry point catches it, logs it and returns a neutral value.

use std::borrow::Cow;
use std::ffi::{CStr, CString, c_char};
use std::panic::{self, AssertUnwindSafe};

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::bridge;

fn guarded<T>(function: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!(function, panic = %message, "Panic caught at the C boundary");
            fallback
        }
    }
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
    }
}

/// Hand `s` to the caller. Interior NULs are dropped.
fn into_c_string(s: String) -> *mut c_char {
    let mut bytes = s.into_bytes();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Initialize the engine, loading backend plugins from `plugin_dir` when it
/// is non-null and non-empty. Also installs a `tracing` subscriber driven by
/// `RUST_LOG` unless the host already set one.
///
/// # Safety
/// `plugin_dir` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runnable_init(plugin_dir: *const c_char) {
    guarded("runnable_init", (), || {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init();
        let dir = unsafe { borrow_str(plugin_dir) };
        bridge().initialize_backend(dir.as_deref());
    })
}

/// Load a GGUF model. Returns `0` on failure.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runnable_load_model(path: *const c_char, n_gpu_layers: i32) -> u64 {
    guarded("runnable_load_model", 0, || {
        match unsafe { borrow_str(path) } {
            Some(path) => bridge().load_model(&path, n_gpu_layers),
            None => 0,
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn runnable_free_model(handle: u64) {
    guarded("runnable_free_model", (), || bridge().free_model(handle))
}

/// Generate from `prompt`. Returns the prompt followed by the generated
/// text, or one of the literal error strings. Returns null only if the call
/// panicked.
///
/// # Safety
/// `prompt` must be null or a valid NUL-terminated string. A null prompt is
/// treated as empty.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runnable_generate(
    handle: u64,
    prompt: *const c_char,
    n_ctx: i32,
    n_predict: i32,
    n_threads: i32,
    temperature: f32,
) -> *mut c_char {
    guarded("runnable_generate", std::ptr::null_mut(), || {
        let prompt = unsafe { borrow_str(prompt) }.unwrap_or_default();
        let text = bridge().generate(handle, &prompt, n_ctx, n_predict, n_threads, temperature);
        into_c_string(text)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn runnable_system_info() -> *mut c_char {
    guarded("runnable_system_info", std::ptr::null_mut(), || {
        into_c_string(bridge().system_info())
    })
}

/// Release a string returned by this library. Null is ignored.
///
/// # Safety
/// `s` must be null or a pointer returned by this library that has not been
/// freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn runnable_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
