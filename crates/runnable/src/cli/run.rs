use std::io::{self, Read};

use anyhow::Context;
use runnable::config::AppConfig;
use tracing::info;

use crate::cli::{GlobalArgs, RunArgs};

pub async fn execute(global: GlobalArgs, args: RunArgs) -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_default()?;

    let prompt = match &args.prompt {
        Some(prompt) => prompt.clone(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf.trim_end_matches(['\r', '\n']).to_owned()
        }
    };

    let model = args
        .model
        .to_str()
        .context("model path is not valid UTF-8")?
        .to_owned();
    let plugin_dir = global.plugin_dir(&cfg);
    let gpu_layers = args.gpu_layers(&cfg);
    let request = args.request(&cfg, prompt);

    info!(model = %args.model.display(), ctx_size = request.context_size, "Loading model…");

    let generation = tokio::task::spawn_blocking(move || {
        let bridge = runnable::bridge();
        bridge.initialize_backend(plugin_dir.as_deref().and_then(|d| d.to_str()));
        bridge.generate_from_file(&model, gpu_layers, &request)
    })
    .await??;

    println!("{}", generation.text);
    eprintln!(
        "  [{} | prompt: {} tok, gen: {} tok]",
        generation.finish_reason, generation.prompt_tokens, generation.completion_tokens
    );
    Ok(())
}
