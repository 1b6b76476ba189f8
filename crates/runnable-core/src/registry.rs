//! Opaque model handles.
//!
//! Loaded models live in a process-local table keyed by non-zero `u64`
//! handles, so the boundary never hands out raw pointers. Handles are not
//! reused: a stale or double-freed handle simply misses the table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

/// Opaque model handle. `0` is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ModelHandle(u64);

impl ModelHandle {
    pub const NULL: Self = Self(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A registered model plus the lock that serializes sessions against it.
pub struct LoadedModel<M> {
    pub path: PathBuf,
    model: M,
    session_lock: Mutex<()>,
}

impl<M> LoadedModel<M> {
    /// Run `f` with exclusive use of the model for decoding.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        let _guard = self
            .session_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&self.model)
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

pub struct ModelRegistry<M> {
    next: AtomicU64,
    slots: RwLock<HashMap<ModelHandle, Arc<LoadedModel<M>>>>,
}

impl<M> Default for ModelRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ModelRegistry<M> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Take ownership of a loaded model and return its new handle.
    pub fn insert(&self, path: &Path, model: M) -> ModelHandle {
        let handle = ModelHandle(self.next.fetch_add(1, Ordering::Relaxed));
        let loaded = Arc::new(LoadedModel {
            path: path.to_path_buf(),
            model,
            session_lock: Mutex::new(()),
        });
        self.slots.write().unwrap().insert(handle, loaded);
        debug!(%handle, path = %path.display(), "Model registered");
        handle
    }

    pub fn get(&self, handle: ModelHandle) -> Option<Arc<LoadedModel<M>>> {
        if handle.is_null() {
            return None;
        }
        self.slots.read().unwrap().get(&handle).cloned()
    }

    /// Drop the registry's reference to a model.
    ///
    /// The model is freed immediately unless a generation is still using
    /// it, in which case it is freed when that generation returns. Returns
    /// `false` for the null handle and for unknown or already-freed handles.
    pub fn remove(&self, handle: ModelHandle) -> bool {
        if handle.is_null() {
            return false;
        }
        match self.slots.write().unwrap().remove(&handle) {
            Some(loaded) => {
                info!(%handle, path = %loaded.path.display(), "Model freed");
                true
            }
            None => {
                warn!(%handle, "Free of unknown model handle ignored");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
