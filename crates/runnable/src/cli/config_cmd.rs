use runnable::config::AppConfig;

use crate::cli::{ConfigAction, ConfigArgs};

pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.action {
        ConfigAction::Show => {
            let cfg = AppConfig::load_or_default()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        ConfigAction::Set { key, value } => {
            let mut cfg = AppConfig::load_or_default()?;
            cfg.set(&key, &value)?;
            cfg.save()?;
            println!("Configuration updated.");
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::config_file().display());
        }
    }
    Ok(())
}
