//! Server configuration
//!
//! Layers, later wins: built-in defaults, an optional TOML file, then
//! `PADDOCK_*` environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use paddock_common::{Error, Result};

pub const ENV_CONFIG: &str = "PADDOCK_CONFIG";
pub const ENV_HOST: &str = "PADDOCK_HOST";
pub const ENV_PORT: &str = "PADDOCK_PORT";
pub const ENV_STATIC_DIR: &str = "PADDOCK_STATIC_DIR";
pub const ENV_SPA_FALLBACK_FILE: &str = "PADDOCK_SPA_FALLBACK_FILE";
pub const ENV_CSP_HEADER: &str = "PADDOCK_CSP_HEADER";
pub const ENV_HSTS_MAX_AGE: &str = "PADDOCK_HSTS_MAX_AGE";
pub const ENV_X_CONTENT_TYPE_OPTIONS: &str = "PADDOCK_X_CONTENT_TYPE_OPTIONS";
pub const ENV_X_FRAME_OPTIONS: &str = "PADDOCK_X_FRAME_OPTIONS";
pub const ENV_REFERRER_POLICY: &str = "PADDOCK_REFERRER_POLICY";
pub const ENV_PERMISSIONS_POLICY: &str = "PADDOCK_PERMISSIONS_POLICY";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "paddock.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Directory holding the built bundle.
    pub static_dir: PathBuf,

    /// Shell document served for `/` and for every unknown path. A bare
    /// file name inside `static_dir`.
    pub spa_fallback_file: String,

    pub csp_header: Option<String>,

    /// `Strict-Transport-Security` max-age; 0 disables the header.
    pub hsts_max_age: u64,

    pub security: SecurityHeaders,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            static_dir: PathBuf::from("./dist"),
            spa_fallback_file: "index.html".to_string(),
            csp_header: None,
            hsts_max_age: 0,
            security: SecurityHeaders::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityHeaders {
    pub x_content_type_options: String,
    pub x_frame_options: String,
    pub referrer_policy: String,
    pub permissions_policy: String,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            x_content_type_options: "nosniff".to_string(),
            x_frame_options: "DENY".to_string(),
            referrer_policy: "no-referrer-when-downgrade".to_string(),
            permissions_policy: "geolocation=(), microphone=(), camera=()".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment. `path` overrides the config file
    /// location; otherwise `PADDOCK_CONFIG`, then `./paddock.toml` if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`] with an injectable variable lookup.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => match non_empty(env(ENV_CONFIG)) {
                Some(p) => Some(PathBuf::from(p)),
                None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
            },
        };

        let mut config = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = non_empty(env(ENV_HOST)) {
            self.host = v;
        }
        if let Some(v) = non_empty(env(ENV_PORT)) {
            self.port = v.parse().map_err(|_| Error::invalid_env(ENV_PORT, &v))?;
        }
        if let Some(v) = non_empty(env(ENV_STATIC_DIR)) {
            self.static_dir = PathBuf::from(v);
        }
        if let Some(v) = non_empty(env(ENV_SPA_FALLBACK_FILE)) {
            self.spa_fallback_file = v;
        }
        if let Some(v) = non_empty(env(ENV_CSP_HEADER)) {
            self.csp_header = Some(v);
        }
        if let Some(v) = non_empty(env(ENV_HSTS_MAX_AGE)) {
            self.hsts_max_age = v.parse().map_err(|_| Error::invalid_env(ENV_HSTS_MAX_AGE, &v))?;
        }
        if let Some(v) = non_empty(env(ENV_X_CONTENT_TYPE_OPTIONS)) {
            self.security.x_content_type_options = v;
        }
        if let Some(v) = non_empty(env(ENV_X_FRAME_OPTIONS)) {
            self.security.x_frame_options = v;
        }
        if let Some(v) = non_empty(env(ENV_REFERRER_POLICY)) {
            self.security.referrer_policy = v;
        }
        if let Some(v) = non_empty(env(ENV_PERMISSIONS_POLICY)) {
            self.security.permissions_policy = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let fallback = &self.spa_fallback_file;
        if fallback.is_empty() || fallback.contains('/') || fallback.contains('\\') || fallback == "." || fallback == ".." {
            return Err(Error::InvalidConfig(format!(
                "invalid spa_fallback_file: {:?}",
                fallback
            )));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        };
        addr.parse()
            .map_err(|_| Error::InvalidConfig(format!("invalid listen address: {}", addr)))
    }

    /// URL path of the shell document, e.g. `/index.html`.
    pub fn fallback_url_path(&self) -> String {
        format!("/{}", self.spa_fallback_file)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        if v.is_empty() { None } else { Some(v.to_string()) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("paddock.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.spa_fallback_file, "index.html");
        assert_eq!(cfg.fallback_url_path(), "/index.html");
        assert!(cfg.csp_header.is_none());
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "127.0.0.1:8081");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = env_from(&[
            (ENV_PORT, "9000"),
            (ENV_STATIC_DIR, "/srv/app"),
            (ENV_SPA_FALLBACK_FILE, "app.html"),
            (ENV_CSP_HEADER, "default-src 'self'"),
            (ENV_HSTS_MAX_AGE, "31536000"),
            (ENV_X_FRAME_OPTIONS, "SAMEORIGIN"),
        ]);
        let cfg = ServerConfig::load_with(None, env).unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.static_dir, PathBuf::from("/srv/app"));
        assert_eq!(cfg.spa_fallback_file, "app.html");
        assert_eq!(cfg.csp_header.as_deref(), Some("default-src 'self'"));
        assert_eq!(cfg.hsts_max_age, 31536000);
        assert_eq!(cfg.security.x_frame_options, "SAMEORIGIN");
        assert_eq!(cfg.security.x_content_type_options, "nosniff");
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
port = 7000
static_dir = "/from/file"

[security]
referrer_policy = "same-origin"
"#,
        );

        let cfg = ServerConfig::load_with(Some(&path), env_from(&[(ENV_PORT, "7001")])).unwrap();
        assert_eq!(cfg.port, 7001);
        assert_eq!(cfg.static_dir, PathBuf::from("/from/file"));
        assert_eq!(cfg.security.referrer_policy, "same-origin");
        assert_eq!(cfg.security.x_frame_options, "DENY");
        assert_eq!(cfg.spa_fallback_file, "index.html");
    }

    #[test]
    fn test_config_path_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "port = 7100\n");
        let path_str = path.to_string_lossy().to_string();

        let cfg = ServerConfig::load_with(None, env_from(&[(ENV_CONFIG, &path_str)])).unwrap();
        assert_eq!(cfg.port, 7100);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ServerConfig::load_with(Some(&missing), env_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "port = \"not a number\"\n");
        let err = ServerConfig::load_with(Some(&path), env_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_invalid_port_env() {
        let err = ServerConfig::load_with(None, env_from(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PADDOCK_PORT"));
    }

    #[test]
    fn test_invalid_hsts_env() {
        let err = ServerConfig::load_with(None, env_from(&[(ENV_HSTS_MAX_AGE, "-1")])).unwrap_err();
        assert!(err.to_string().contains("PADDOCK_HSTS_MAX_AGE"));
    }

    #[test]
    fn test_fallback_file_must_be_bare_name() {
        let err = ServerConfig::load_with(None, env_from(&[(ENV_SPA_FALLBACK_FILE, "nested/index.html")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let cfg = ServerConfig {
            spa_fallback_file: String::new(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        for name in [".", ".."] {
            let cfg = ServerConfig {
                spa_fallback_file: name.to_string(),
                ..Default::default()
            };
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{}", name);
        }
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let cfg = ServerConfig::load_with(None, env_from(&[(ENV_PORT, "  "), (ENV_HOST, "")])).unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_ipv6_host() {
        let cfg = ServerConfig {
            host: "::1".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "[::1]:8081");
    }
}
