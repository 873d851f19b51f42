//! `paddock bundle`: emit the static bundle

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use paddock_app::{BundleOptions, Bundler, RouteTable, DEFAULT_TITLE};
use paddock_common::ManifestAsset;

use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Output directory
    #[arg(short, long, default_value = "dist")]
    pub out: PathBuf,

    /// Document title
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,
}

#[derive(Serialize)]
struct AssetRow<'a>(&'a ManifestAsset);

impl TableDisplay for AssetRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Asset", "Path", "Size", "SHA-256"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.0.logical.clone(),
            self.0.path.clone(),
            self.0.size.to_string(),
            self.0.sha256[..12.min(self.0.sha256.len())].to_string(),
        ]
    }
}

pub async fn execute(args: BundleArgs, format: OutputFormat) -> anyhow::Result<()> {
    info!("Bundling into {}", args.out.display());

    let bundler = Bundler::new(RouteTable::standard(), BundleOptions { title: args.title });
    let bundle = bundler.build()?;
    bundle.write_to(&args.out)?;

    let rows: Vec<AssetRow> = bundle.manifest().assets.iter().map(AssetRow).collect();
    output::print_list(&rows, format)?;
    output::print_success(&format!(
        "Wrote {} assets ({} bytes) to {}",
        bundle.manifest().asset_count,
        bundle.manifest().total_size_bytes,
        args.out.display()
    ));
    Ok(())
}
