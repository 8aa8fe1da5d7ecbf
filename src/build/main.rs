//! Precinct spatial-index builder.
//!
//! Downloads the national precinct-results TopoJSON, reprojects and
//! simplifies it with GDAL, and writes the features back out in R-tree
//! bulk-load order.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use precinct_index::config::BuildConfig;
use precinct_index::convert::Ogr2Ogr;
use precinct_index::pipeline;

#[derive(Parser, Debug)]
#[command(name = "build-index")]
#[command(about = "Build the precinct spatial index from the national results TopoJSON")]
struct Args {
    /// Directory for downloaded and generated files
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = BuildConfig::new(&args.build_dir);
    let client = reqwest::Client::new();

    pipeline::run_build(&config, &Ogr2Ogr, &client).await?;

    info!("Done: {}", config.index_path.display());
    Ok(())
}
