//! In-memory copies of critical assets
//!
//! The shell document and favicon are requested on nearly every page load,
//! so they are read once at startup. The cache is immutable afterwards;
//! rebuilding the bundle requires a restart to pick up a new shell.

use axum::body::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{info, warn};

/// Root-level files preloaded besides the fallback document.
pub const CRITICAL_FILES: &[&str] = &["favicon.svg"];

#[derive(Debug, Clone)]
pub struct CachedAsset {
    pub content: Bytes,
    pub modified: SystemTime,
    pub size: u64,
    pub mime: String,
}

#[derive(Debug, Clone, Default)]
pub struct CriticalAssets {
    entries: HashMap<String, CachedAsset>,
}

impl CriticalAssets {
    /// Load the fallback document plus [`CRITICAL_FILES`] from `static_dir`.
    /// Files that cannot be read are skipped with a warning.
    pub fn load(static_dir: &Path, fallback_file: &str) -> Self {
        let mut entries = HashMap::new();

        let names = std::iter::once(fallback_file).chain(CRITICAL_FILES.iter().copied());
        for name in names {
            let path = static_dir.join(name);
            let content = match std::fs::read(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Could not load critical asset {} into cache: {}", path.display(), e);
                    continue;
                }
            };
            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Could not get file info for {}: {}", path.display(), e);
                    continue;
                }
            };

            entries.insert(
                format!("/{}", name),
                CachedAsset {
                    size: content.len() as u64,
                    content: Bytes::from(content),
                    modified,
                    mime: crate::static_files::content_type_for(&path),
                },
            );
        }

        info!("Loaded {} critical assets into in-memory cache", entries.len());
        Self { entries }
    }

    /// Look up by URL path (`/index.html`).
    pub fn get(&self, url_path: &str) -> Option<&CachedAsset> {
        self.entries.get(url_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
