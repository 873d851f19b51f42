//! Web server implementation

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::middleware::{cache_control, security_headers};
use crate::static_files::StaticFiles;

/// Shared, immutable after startup.
pub struct AppState {
    pub config: ServerConfig,
    pub static_files: StaticFiles,
}

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<AppState>,
}

pub async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
    WebServer::new(cfg).serve().await
}

impl WebServer {
    /// Create a new web server. Critical assets are read here.
    pub fn new(config: ServerConfig) -> Self {
        info!("Using static directory: {}", config.static_dir.display());
        info!("Using SPA fallback file: {}", config.spa_fallback_file);

        let static_files = StaticFiles::new(&config.static_dir, &config.spa_fallback_file);
        Self {
            state: Arc::new(AppState { config, static_files }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router. Every path goes to the static handler; the layers
    /// run outermost-first: trace, compression, security headers, cache policy.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(static_handler)
            .layer(middleware::from_fn_with_state(self.state.clone(), cache_control))
            .layer(middleware::from_fn_with_state(self.state.clone(), security_headers))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.state.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> anyhow::Result<()> {
        info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }
}

async fn static_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.static_files.serve(&method, uri.path(), &headers).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
