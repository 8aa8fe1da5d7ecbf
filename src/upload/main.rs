//! Publish the precinct spatial index as a GitHub release asset.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use precinct_index::config::{UploadConfig, TOKEN_VAR};
use precinct_index::github::{resolve_release, ReleaseClient};

#[derive(Parser, Debug)]
#[command(name = "upload-index")]
#[command(about = "Upload the precinct spatial index to a GitHub release")]
struct Args {
    /// Release tag to attach the asset to
    tag: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // A missing tag should exit 1 with usage, not clap's default code 2.
    let args = Args::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        std::process::exit(1);
    });

    let config = UploadConfig::default();

    if !config.asset_path.exists() {
        anyhow::bail!("File not found at {}", config.asset_path.display());
    }
    let token = std::env::var(TOKEN_VAR)
        .with_context(|| format!("{} environment variable not set", TOKEN_VAR))?;

    let client = ReleaseClient::new(config.clone(), token)?;
    let release = resolve_release(&client, &args.tag).await?;
    let asset = client.upload_asset(&release, &config.asset_path).await?;

    info!("Uploaded {} ({} bytes)", asset.name, asset.size);
    info!("Done: {}", release.html_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_missing_tag_is_a_usage_error() {
        let err = Args::try_parse_from(["upload-index"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_tag_argument_parses() {
        let args = Args::try_parse_from(["upload-index", "v2024.1"]).unwrap();
        assert_eq!(args.tag, "v2024.1");
    }
}
