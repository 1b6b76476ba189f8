//! Global llama.cpp backend initialization and system queries.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::Once;

use tracing::{debug, info, warn};

static BACKEND_INIT: Once = Once::new();

/// Token proving the process-wide llama.cpp backend is up.
///
/// The first call to [`LlamaBackend::init`] loads the ggml compute backends
/// and initializes the C backend; later calls only return the token. The
/// backend lives until process exit.
pub struct LlamaBackend {
    _private: (),
}

impl LlamaBackend {
    /// Initialize the llama.cpp backend (idempotent).
    ///
    /// With a non-empty `plugin_dir`, every ggml backend module found in that
    /// directory is registered first; otherwise the default search is used.
    pub fn init(plugin_dir: Option<&Path>) -> Self {
        BACKEND_INIT.call_once(|| {
            install_log_callback();
            load_backends(plugin_dir);
            unsafe {
                llama_sys::llama_backend_init();
            }
            info!(
                backends = unsafe { llama_sys::ggml_backend_reg_count() },
                "llama.cpp backend initialized"
            );
        });
        Self { _private: () }
    }

    /// Return a human-readable system information string.
    pub fn system_info() -> String {
        unsafe {
            CStr::from_ptr(llama_sys::llama_print_system_info())
                .to_string_lossy()
                .into_owned()
        }
    }
}

fn load_backends(plugin_dir: Option<&Path>) {
    let dir = plugin_dir.filter(|d| !d.as_os_str().is_empty());
    let c_dir = dir.and_then(|d| match d.to_str().map(CString::new) {
        Some(Ok(c)) => Some(c),
        _ => {
            warn!(dir = %d.display(), "Unusable plugin directory, using default backends");
            None
        }
    });

    match c_dir {
        Some(c_dir) => {
            debug!(dir = ?dir, "Loading ggml backends from plugin directory");
            unsafe { llama_sys::ggml_backend_load_all_from_path(c_dir.as_ptr()) }
        }
        None => {
            debug!("Loading default ggml backends");
            unsafe { llama_sys::ggml_backend_load_all() }
        }
    }
}

/// Route llama.cpp / ggml logs into `tracing`.
fn install_log_callback() {
    unsafe extern "C" fn cb(
        level: llama_sys::ggml_log_level,
        text: *const std::ffi::c_char,
        _user_data: *mut std::ffi::c_void,
    ) {
        if text.is_null() {
            return;
        }
        let msg = unsafe { CStr::from_ptr(text) }.to_string_lossy();
        let msg = msg.trim();
        if msg.is_empty() {
            return;
        }
        // ggml_log_level: DEBUG=1, INFO=2, WARN=3, ERROR=4, CONT=5
        match level {
            4 => tracing::error!(target: "llama.cpp", "{msg}"),
            3 => tracing::warn!(target: "llama.cpp", "{msg}"),
            2 => tracing::info!(target: "llama.cpp", "{msg}"),
            _ => tracing::debug!(target: "llama.cpp", "{msg}"),
        }
    }

    unsafe {
        llama_sys::llama_log_set(Some(cb), std::ptr::null_mut());
    }
    debug!("llama.cpp log callback installed");
}
