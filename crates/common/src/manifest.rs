//! Asset manifest for provenance and hashed-name lookup
//!
//! The bundler writes `asset-manifest.json` next to `index.html`. Each entry
//! binds a logical asset name (`horse.webp`) to the content-hashed public
//! path it was emitted under.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// File name of the manifest inside a bundle directory.
pub const MANIFEST_FILE_NAME: &str = "asset-manifest.json";

/// Manifest describing one bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub schema_version: String,
    pub app_version: String,
    pub build_timestamp: String,
    /// Public path of the shell document.
    pub entry: String,
    pub total_size_bytes: u64,
    pub asset_count: usize,
    #[serde(default)]
    pub assets: Vec<ManifestAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    /// Name the asset is referred to by in source (`horse.webp`).
    pub logical: String,
    /// Public URL path, e.g. `/assets/horse-1a2b3c4d.webp`.
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl AssetManifest {
    pub fn new(entry: impl Into<String>, assets: Vec<ManifestAsset>) -> Self {
        let total_size_bytes = assets.iter().map(|a| a.size).sum();
        Self {
            schema_version: "1".to_string(),
            app_version: crate::VERSION.to_string(),
            build_timestamp: chrono::Utc::now().to_rfc3339(),
            entry: entry.into(),
            total_size_bytes,
            asset_count: assets.len(),
            assets,
        }
    }

    /// Look up an asset by its logical name.
    pub fn get(&self, logical: &str) -> Option<&ManifestAsset> {
        self.assets.iter().find(|a| a.logical == logical)
    }

    /// Public path for a logical name, or `NotFound`.
    pub fn resolve(&self, logical: &str) -> Result<&str> {
        self.get(logical)
            .map(|a| a.path.as_str())
            .ok_or_else(|| Error::NotFound(logical.to_string()))
    }

    /// Read the manifest from a bundle directory.
    pub fn load(bundle_dir: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(bundle_dir.join(MANIFEST_FILE_NAME))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the manifest into a bundle directory.
    pub fn write(&self, bundle_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(bundle_dir.join(MANIFEST_FILE_NAME), json)?;
        Ok(())
    }
}
