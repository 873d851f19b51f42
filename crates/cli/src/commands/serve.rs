//! `paddock serve`: run the static server

use clap::Args;
use std::path::PathBuf;
use tracing::info;

use paddock_web::ServerConfig;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Config file (TOML). Defaults to $PADDOCK_CONFIG, then ./paddock.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the built bundle
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

/// Flags win over the file and environment layers.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    resolve_config_with(args, |key| std::env::var(key).ok())
}

/// Like [`resolve_config`], reading the environment layer from `env`.
pub fn resolve_config_with<F>(args: &ServeArgs, env: F) -> anyhow::Result<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = ServerConfig::load_with(args.config.as_deref(), env)?;
    if let Some(host) = &args.host {
        cfg.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(dir) = &args.static_dir {
        cfg.static_dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args)?;
    if !cfg.static_dir.join(&cfg.spa_fallback_file).is_file() {
        tracing::warn!(
            "{} not found in {}; run `paddock bundle --out {}` first",
            cfg.spa_fallback_file,
            cfg.static_dir.display(),
            cfg.static_dir.display()
        );
    }

    info!("Starting Paddock on http://{}", cfg.socket_addr()?);
    paddock_web::serve(cfg).await
}
