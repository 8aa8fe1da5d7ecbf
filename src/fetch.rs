//! Streaming download and decompression of the source dataset.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::info;

/// Download a gzip-compressed file and decompress it into `dest`.
///
/// Skips the download entirely when `dest` already exists. The response body
/// is fed chunk-by-chunk through a gzip decoder writing straight to disk;
/// the dataset is national precinct geometry, so the payload is never held
/// in memory whole.
pub async fn fetch_topology(client: &Client, url: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        info!("TopoJSON already downloaded and extracted");
        return Ok(());
    }

    info!("Downloading {}", url);
    let mut response = client
        .get(url)
        .send()
        .await
        .context("Failed to reach download endpoint")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed: HTTP {}", response.status());
    }

    let pb = match response.content_length() {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    )?
                    .progress_chars("#>-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    // A truncated file left behind would pass the exists() check on the
    // next run, so discard the partial output on any streaming failure.
    if let Err(err) = stream_to_file(&mut response, dest, &pb).await {
        let _ = std::fs::remove_file(dest);
        return Err(err);
    }
    pb.finish_and_clear();

    info!("Downloaded and extracted to {}", dest.display());
    Ok(())
}

async fn stream_to_file(
    response: &mut reqwest::Response,
    dest: &Path,
    pb: &ProgressBar,
) -> Result<()> {
    let file = File::create(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut decoder = GzDecoder::new(file);

    while let Some(chunk) = response.chunk().await.context("Download interrupted")? {
        decoder
            .write_all(&chunk)
            .context("Failed to write decompressed data")?;
        pb.inc(chunk.len() as u64);
    }
    decoder.finish().context("Truncated gzip stream")?;
    Ok(())
}
