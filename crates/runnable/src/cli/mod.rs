pub mod config_cmd;
pub mod info;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use runnable::config::AppConfig;
use runnable_core::GenerationRequest;

#[derive(Parser)]
#[command(
    name = "runnable",
    version,
    about = "Run GGUF models locally through llama.cpp"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
pub struct GlobalArgs {
    /// Directory of dynamically loadable ggml backends.
    #[arg(long, global = true, env = "RUNNABLE_PLUGIN_DIR")]
    pub plugin_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Plugin directory from the flag, falling back to the config file.
    pub fn plugin_dir(&self, cfg: &AppConfig) -> Option<PathBuf> {
        self.plugin_dir.clone().or_else(|| cfg.plugin_dir.clone())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a model, generate once and print the result.
    Run(RunArgs),

    /// Print the compute backends and CPU features llama.cpp sees.
    Info,

    /// View / edit configuration.
    Config(ConfigArgs),
}

//  Subcommand argument structs

#[derive(Debug, clap::Args, Clone)]
pub struct RunArgs {
    /// Path to a GGUF model file.
    pub model: PathBuf,

    /// Prompt text (read from stdin when omitted).
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Context size (0 = model default).
    #[arg(long, env = "RUNNABLE_CTX_SIZE")]
    pub ctx_size: Option<i32>,

    /// Maximum number of generated tokens.
    #[arg(short = 'n', long, env = "RUNNABLE_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// Threads.
    #[arg(short, long, env = "RUNNABLE_THREADS")]
    pub threads: Option<i32>,

    /// Temperature.
    #[arg(long)]
    pub temp: Option<f32>,

    /// GPU layers (0 = CPU only).
    #[arg(long, env = "RUNNABLE_N_GPU_LAYERS", allow_negative_numbers = true)]
    pub n_gpu_layers: Option<i32>,
}

impl RunArgs {
    /// Merge flags over `cfg` into a request for `prompt`.
    pub fn request(&self, cfg: &AppConfig, prompt: String) -> GenerationRequest {
        GenerationRequest {
            prompt,
            context_size: self.ctx_size.unwrap_or(cfg.ctx_size),
            max_tokens: self.max_tokens.unwrap_or(cfg.max_tokens),
            threads: self.threads.or(cfg.threads).unwrap_or(0),
            temperature: self.temp.unwrap_or(cfg.temperature),
        }
    }

    pub fn gpu_layers(&self, cfg: &AppConfig) -> i32 {
        self.n_gpu_layers.unwrap_or(cfg.n_gpu_layers)
    }
}

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Display the current configuration.
    Show,
    /// Set a configuration value.
    Set { key: String, value: String },
    /// Print the configuration file location.
    Path,
}
