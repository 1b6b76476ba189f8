//! CLI defaults, persisted as JSON.

use std::path::{Path, PathBuf};

use runnable_core::request::{DEFAULT_CONTEXT_SIZE, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};

/// Defaults applied by `runnable run` when a flag is not given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding dynamically loadable ggml backends.
    #[serde(default)]
    pub plugin_dir: Option<PathBuf>,
    /// GPU layers (0 = CPU only).
    #[serde(default)]
    pub n_gpu_layers: i32,
    /// Context size (0 = model default).
    #[serde(default = "default_ctx_size")]
    pub ctx_size: i32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Compute threads; unset = available parallelism.
    #[serde(default)]
    pub threads: Option<i32>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_ctx_size() -> i32 {
    DEFAULT_CONTEXT_SIZE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            plugin_dir: None,
            n_gpu_layers: 0,
            ctx_size: default_ctx_size(),
            max_tokens: default_max_tokens(),
            threads: None,
            temperature: default_temperature(),
        }
    }
}

impl AppConfig {
    /// Platform config directory: `~/.config/runnable/`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("runnable")
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Load from disk, or return defaults if the file doesn't exist.
    pub fn load_or_default() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_file())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Set one field from its textual value. An empty value clears the
    /// optional fields.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "plugin_dir" => {
                self.plugin_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "n_gpu_layers" => self.n_gpu_layers = value.parse()?,
            "ctx_size" => self.ctx_size = value.parse()?,
            "max_tokens" => self.max_tokens = value.parse()?,
            "threads" => {
                self.threads = if value.is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
            "temperature" => self.temperature = value.parse()?,
            _ => anyhow::bail!("Unknown config key: {key}"),
        }
        Ok(())
    }
}
