use runnable::config::AppConfig;

use crate::cli::GlobalArgs;

pub async fn execute(global: GlobalArgs) -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_default()?;
    let plugin_dir = global.plugin_dir(&cfg);

    let info = tokio::task::spawn_blocking(move || {
        let bridge = runnable::bridge();
        bridge.initialize_backend(plugin_dir.as_deref().and_then(|d| d.to_str()));
        bridge.system_info()
    })
    .await?;

    println!("{info}");
    Ok(())
}
