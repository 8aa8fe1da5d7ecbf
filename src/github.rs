//! GitHub release resolution and asset upload.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::UploadConfig;

const API_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("precinct-index/", env!("CARGO_PKG_VERSION"));
const RELEASE_BODY: &str = "Automated release of precincts spatial index";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
}

/// The slice of the release API the resolver needs; tests substitute a
/// counting double for the real client.
#[allow(async_fn_in_trait)]
pub trait ReleaseHost {
    async fn release_by_tag(&self, tag: &str) -> Result<Release>;
    async fn create_release(&self, tag: &str) -> Result<Release>;
}

/// Fetch a release by tag, creating one when the lookup fails for any reason.
pub async fn resolve_release(host: &impl ReleaseHost, tag: &str) -> Result<Release> {
    match host.release_by_tag(tag).await {
        Ok(release) => {
            info!("Found release for tag: {}", tag);
            Ok(release)
        }
        Err(err) => {
            info!("No release for tag {} ({:#}); creating one", tag, err);
            host.create_release(tag).await
        }
    }
}

/// Authenticated client for one repository's releases.
pub struct ReleaseClient {
    client: reqwest::Client,
    config: UploadConfig,
    token: String,
}

impl ReleaseClient {
    pub fn new(config: UploadConfig, token: String) -> Result<Self> {
        // GitHub rejects requests without a user agent.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            config,
            token,
        })
    }

    /// Stream a file as a named asset on `release`.
    ///
    /// The body is a streamed file, so `Content-Length` must be set
    /// explicitly up front along with the guessed `Content-Type`.
    /// Re-uploads are not checked against existing assets of the same name;
    /// the API may accumulate duplicates across runs.
    pub async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Asset path has no file name")?;
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let content_type = mime_guess::from_path(path).first_or_octet_stream();

        info!("Uploading {} ({} bytes)...", name, metadata.len());

        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let url = format!(
            "{}/repos/{}/{}/releases/{}/assets",
            self.config.upload_base, self.config.owner, self.config.repo, release.id
        );
        let response = self
            .client
            .post(&url)
            .query(&[("name", name)])
            .bearer_auth(&self.token)
            .header(ACCEPT, API_ACCEPT)
            .header(CONTENT_TYPE, content_type.essence_str())
            .header(CONTENT_LENGTH, metadata.len())
            .body(reqwest::Body::from(file))
            .send()
            .await
            .context("Asset upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Asset upload failed: HTTP {}: {}", status, detail);
        }
        response
            .json::<Asset>()
            .await
            .context("Failed to decode asset response")
    }

    fn releases_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/releases{}",
            self.config.api_base, self.config.owner, self.config.repo, suffix
        )
    }
}

impl ReleaseHost for ReleaseClient {
    async fn release_by_tag(&self, tag: &str) -> Result<Release> {
        let url = self.releases_url(&format!("/tags/{}", tag));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, API_ACCEPT)
            .send()
            .await
            .context("Release lookup request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Release lookup returned HTTP {}", response.status());
        }
        response
            .json::<Release>()
            .await
            .context("Failed to decode release response")
    }

    async fn create_release(&self, tag: &str) -> Result<Release> {
        info!("Creating release '{}'...", tag);
        let payload = CreateRelease {
            tag_name: tag,
            name: tag,
            body: RELEASE_BODY,
        };
        let response = self
            .client
            .post(self.releases_url(""))
            .bearer_auth(&self.token)
            .header(ACCEPT, API_ACCEPT)
            .json(&payload)
            .send()
            .await
            .context("Release creation request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Release creation failed: HTTP {}: {}", status, detail);
        }
        response
            .json::<Release>()
            .await
            .context("Failed to decode release response")
    }
}
