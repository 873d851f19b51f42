use tracing::info;

use paddock_web::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = ServerConfig::load(None)?;

    info!(
        "Starting Paddock on http://{} (static dir: {})",
        cfg.socket_addr()?,
        cfg.static_dir.display()
    );

    paddock_web::serve(cfg).await
}
