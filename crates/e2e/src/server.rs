//! Server management - spawning and health checking the web server

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running server process
pub struct ServerHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl ServerHandle {
    /// Spawn the paddock-web server
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning web server on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.env("PADDOCK_PORT", port.to_string())
            .env("PADDOCK_HOST", "127.0.0.1")
            .env("PADDOCK_STATIC_DIR", &config.static_dir)
            .env_remove("PADDOCK_CONFIG");

        // Server logs go to stderr; stdout is unused.
        cmd.stdout(Stdio::null()).stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!(
                "Failed to spawn {} (build it with `cargo build -p paddock-web`): {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let mut handle = ServerHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        // Wait for server to be healthy
        if let Err(e) = handle.wait_for_healthy(config.startup_timeout).await {
            let _ = handle.stop();
            return Err(e);
        }

        info!("Server is healthy at {}", base_url);
        Ok(handle)
    }

    /// Poll the shell document until the server answers.
    async fn wait_for_healthy(&mut self, timeout_duration: Duration) -> E2eResult<()> {
        wait_for_url(&format!("{}/", self.base_url), timeout_duration, || {
            match self.child.try_wait() {
                Ok(Some(status)) => Some(E2eError::ServerStartup(format!("server exited early: {}", status))),
                _ => None,
            }
        })
        .await
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server
    pub fn stop(&mut self) -> E2eResult<()> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(());
        }
        info!("Stopping server (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                // Give it a moment to shut down gracefully
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        self.child.wait()?;

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Poll `url` every 100 ms until it answers with a success status.
/// `exited` is consulted between attempts to fail fast on a dead process.
pub async fn wait_for_url<F>(url: &str, timeout_duration: Duration, mut exited: F) -> E2eResult<()>
where
    F: FnMut() -> Option<E2eError>,
{
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout_duration {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => {
                warn!("Health check returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for server to start...");
                }
                // Connection refused is expected while server is starting
                if !e.is_connect() {
                    warn!("Health check error: {}", e);
                }
            }
        }

        if let Some(err) = exited() {
            return Err(err);
        }
        sleep(Duration::from_millis(100)).await;
    }

    Err(E2eError::ServerHealthCheck(attempts))
}

/// Configuration for spawning a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the paddock-web binary
    pub binary_path: PathBuf,

    /// Directory containing the built bundle
    pub static_dir: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: default_server_binary(),
            static_dir: PathBuf::from("dist"),
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// `paddock-web` in the workspace target directory (debug profile).
pub fn default_server_binary() -> PathBuf {
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target.join("debug").join(format!("paddock-web{}", std::env::consts::EXE_SUFFIX))
}

/// Find a free port to use
pub fn find_free_port() -> E2eResult<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port().unwrap();
        let port2 = find_free_port().unwrap();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn test_default_binary_name() {
        let path = default_server_binary();
        assert!(path.to_string_lossy().contains("paddock-web"));
        assert!(path.parent().unwrap().ends_with("debug"));
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_start() {
        let config = ServerConfig {
            binary_path: PathBuf::from("/nonexistent/paddock-web"),
            ..Default::default()
        };
        let err = ServerHandle::spawn(config).await.err().unwrap();
        assert!(matches!(err, E2eError::ServerStartup(_)));
    }

    #[tokio::test]
    async fn test_wait_for_url_gives_up() {
        let port = find_free_port().unwrap();
        let url = format!("http://127.0.0.1:{}/", port);
        let err = wait_for_url(&url, Duration::from_millis(300), || None).await.unwrap_err();
        assert!(matches!(err, E2eError::ServerHealthCheck(n) if n >= 1));
    }
}
