//! Static asset bundle
//!
//! Produces the served directory layout:
//!
//! ```text
//! dist/
//! ├── index.html               shell document, never cached
//! ├── favicon.svg              public file, stable name
//! ├── asset-manifest.json      logical name -> hashed path
//! └── assets/
//!     ├── horse-<hash>.webp
//!     ├── index-<hash>.css
//!     └── index-<hash>.js
//! ```
//!
//! The script embeds the hashed logo path, so the logo is hashed first and
//! the shell document is rendered last.

use std::path::Path;
use tracing::{debug, info};

use paddock_common::{hashed_file_name, sha256_hex, AssetManifest, Error, ManifestAsset, Result};

use crate::client::client_script;
use crate::route::RouteTable;
use crate::shell::{ShellDocument, DEFAULT_TITLE};

/// Logo image shipped with the shell.
pub const HORSE_WEBP: &[u8] = include_bytes!("../assets/horse.webp");
const FAVICON_SVG: &str = include_str!("../assets/favicon.svg");
const APP_CSS: &str = include_str!("../assets/app.css");

/// Directory (relative to the bundle root) holding hashed assets.
pub const ASSETS_DIR: &str = "assets";
pub const ENTRY_FILE: &str = "index.html";
pub const FAVICON_FILE: &str = "favicon.svg";

#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub title: String,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// One emitted file, path relative to the bundle root.
#[derive(Debug, Clone)]
pub struct BundleFile {
    pub path: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Bundle {
    files: Vec<BundleFile>,
    manifest: AssetManifest,
}

pub struct Bundler {
    routes: RouteTable,
    options: BundleOptions,
}

impl Bundler {
    pub fn new(routes: RouteTable, options: BundleOptions) -> Self {
        Self { routes, options }
    }

    pub fn build(&self) -> Result<Bundle> {
        let mut files = Vec::new();
        let mut assets = Vec::new();

        let logo = hashed_asset("horse.webp", HORSE_WEBP.to_vec());
        let logo_src = public_path(&logo.path);
        assets.push(manifest_entry("horse.webp", &logo));
        files.push(logo);

        let css = hashed_asset("index.css", APP_CSS.as_bytes().to_vec());
        assets.push(manifest_entry("index.css", &css));

        let js = hashed_asset("index.js", client_script(&self.routes, &logo_src)?.into_bytes());
        assets.push(manifest_entry("index.js", &js));

        let favicon = BundleFile {
            path: FAVICON_FILE.to_string(),
            contents: FAVICON_SVG.as_bytes().to_vec(),
        };
        assets.push(manifest_entry(FAVICON_FILE, &favicon));

        let index = ShellDocument {
            title: &self.options.title,
            favicon_href: &public_path(&favicon.path),
            stylesheet_href: &public_path(&css.path),
            script_src: &public_path(&js.path),
        }
        .render();

        files.push(css);
        files.push(js);
        files.push(favicon);
        files.push(BundleFile {
            path: ENTRY_FILE.to_string(),
            contents: index.into_bytes(),
        });

        let manifest = AssetManifest::new(public_path(ENTRY_FILE), assets);
        debug!(assets = manifest.asset_count, "bundle assembled");

        Ok(Bundle { files, manifest })
    }
}

impl Default for Bundler {
    fn default() -> Self {
        Self::new(RouteTable::standard(), BundleOptions::default())
    }
}

impl Bundle {
    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn file(&self, path: &str) -> Option<&BundleFile> {
        let path = path.trim_start_matches('/');
        self.files.iter().find(|f| f.path == path)
    }

    /// Write the bundle into `out_dir`. A previous `assets/` directory is
    /// removed first so stale hashed files do not accumulate.
    pub fn write_to(&self, out_dir: &Path) -> Result<()> {
        if out_dir.exists() && !out_dir.is_dir() {
            return Err(Error::Bundle(format!("{} is not a directory", out_dir.display())));
        }
        let assets_dir = out_dir.join(ASSETS_DIR);
        if assets_dir.exists() {
            std::fs::remove_dir_all(&assets_dir)?;
        }
        std::fs::create_dir_all(&assets_dir)?;

        for file in &self.files {
            let target = out_dir.join(&file.path);
            std::fs::write(&target, &file.contents)?;
            debug!(path = %target.display(), bytes = file.contents.len(), "wrote bundle file");
        }
        self.manifest.write(out_dir)?;

        info!(
            out_dir = %out_dir.display(),
            assets = self.manifest.asset_count,
            total_bytes = self.manifest.total_size_bytes,
            "bundle written"
        );
        Ok(())
    }
}

fn hashed_asset(name: &str, contents: Vec<u8>) -> BundleFile {
    BundleFile {
        path: format!("{}/{}", ASSETS_DIR, hashed_file_name(name, &contents)),
        contents,
    }
}

fn manifest_entry(logical: &str, file: &BundleFile) -> ManifestAsset {
    ManifestAsset {
        logical: logical.to_string(),
        path: public_path(&file.path),
        size: file.contents.len() as u64,
        sha256: sha256_hex(&file.contents),
    }
}

fn public_path(relative: &str) -> String {
    format!("/{}", relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_html(bundle: &Bundle) -> String {
        String::from_utf8(bundle.file(ENTRY_FILE).unwrap().contents.clone()).unwrap()
    }

    #[test]
    fn test_bundle_layout() {
        let bundle = Bundler::default().build().unwrap();
        let manifest = bundle.manifest();

        let logo = manifest.resolve("horse.webp").unwrap();
        assert!(logo.starts_with("/assets/horse-"));
        assert!(logo.ends_with(".webp"));
        assert!(manifest.resolve("index.js").unwrap().starts_with("/assets/index-"));
        assert!(manifest.resolve("index.css").unwrap().ends_with(".css"));
        assert_eq!(manifest.resolve(FAVICON_FILE).unwrap(), "/favicon.svg");
        assert_eq!(manifest.entry, "/index.html");

        // every manifest entry is backed by an emitted file
        for asset in &manifest.assets {
            let file = bundle.file(&asset.path).unwrap();
            assert_eq!(file.contents.len() as u64, asset.size);
        }
    }

    #[test]
    fn test_index_references_hashed_assets() {
        let bundle = Bundler::default().build().unwrap();
        let html = index_html(&bundle);
        let manifest = bundle.manifest();

        assert!(html.contains("<title>Vite + React</title>"));
        assert!(html.contains(manifest.resolve("index.js").unwrap()));
        assert!(html.contains(manifest.resolve("index.css").unwrap()));
    }

    #[test]
    fn test_script_references_hashed_logo() {
        let bundle = Bundler::default().build().unwrap();
        let manifest = bundle.manifest();
        let js = bundle.file(manifest.resolve("index.js").unwrap()).unwrap();
        let js = String::from_utf8(js.contents.clone()).unwrap();

        assert!(js.contains(manifest.resolve("horse.webp").unwrap()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = Bundler::default().build().unwrap();
        let b = Bundler::default().build().unwrap();
        assert_eq!(
            a.manifest().resolve("index.js").unwrap(),
            b.manifest().resolve("index.js").unwrap()
        );
    }

    #[test]
    fn test_custom_title() {
        let bundler = Bundler::new(
            RouteTable::standard(),
            BundleOptions { title: "Paddock".to_string() },
        );
        let html = index_html(&bundler.build().unwrap());
        assert!(html.contains("<title>Paddock</title>"));
    }

    #[test]
    fn test_write_replaces_stale_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/old-00000000.js"), "stale").unwrap();

        let bundle = Bundler::default().build().unwrap();
        bundle.write_to(dir.path()).unwrap();

        assert!(!dir.path().join("assets/old-00000000.js").exists());
        assert!(dir.path().join("index.html").is_file());
        assert!(dir.path().join("favicon.svg").is_file());
        assert!(dir.path().join("asset-manifest.json").is_file());

        let manifest = AssetManifest::load(dir.path()).unwrap();
        let logo = manifest.resolve("horse.webp").unwrap();
        let on_disk = std::fs::read(dir.path().join(logo.trim_start_matches('/'))).unwrap();
        assert_eq!(on_disk, HORSE_WEBP);
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dist");
        std::fs::write(&file, "not a dir").unwrap();

        let err = Bundler::default().build().unwrap().write_to(&file).unwrap_err();
        assert!(matches!(err, Error::Bundle(_)));
    }
}
