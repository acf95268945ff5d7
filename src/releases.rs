use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const SEARCH_ENGINE_OWNER: &str = "meilisearch";
pub const SEARCH_ENGINE_REPO: &str = "meilisearch";
// GitHub's maximum page size; the default of 30 can be all release candidates.
const RELEASES_PER_PAGE: u32 = 100;

#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Downloads every asset named `asset_name` from the newest stable release
    /// into `dest_dir` and returns the written paths.
    async fn download_latest(&self, asset_name: &str, dest_dir: &Path)
        -> anyhow::Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

pub fn newest_stable(releases: &[Release]) -> Option<&Release> {
    releases.iter().find(|r| !r.prerelease && !r.draft)
}

pub fn matching_assets<'a>(release: &'a Release, asset_name: &str) -> Vec<&'a ReleaseAsset> {
    release
        .assets
        .iter()
        .filter(|a| a.name == asset_name)
        .collect()
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub connect_timeout_ms: u64,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_URL.to_string(),
            owner: SEARCH_ENGINE_OWNER.to_string(),
            repo: SEARCH_ENGINE_REPO.to_string(),
            token: None,
            connect_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubReleases {
    settings: GitHubSettings,
    client: Client,
}

impl GitHubReleases {
    pub fn new(settings: GitHubSettings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "docbase-launcher/{}",
                env!("CARGO_PKG_VERSION")
            ))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) {
            log::debug!("adding GitHub token to release requests");
            let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { settings, client })
    }

    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases?per_page={RELEASES_PER_PAGE}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.owner,
            self.settings.repo
        )
    }

    pub async fn list_releases(&self) -> anyhow::Result<Vec<Release>> {
        let url = self.releases_url();
        log::debug!("listing releases from {url}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "failed to list releases: HTTP {} {}",
                status,
                body.trim()
            ));
        }
        resp.json::<Vec<Release>>()
            .await
            .context("failed to decode release list")
    }

    async fn download_asset(&self, asset: &ReleaseAsset, dest_dir: &Path) -> anyhow::Result<PathBuf> {
        let dest = dest_dir.join(&asset.name);
        let part = dest_dir.join(format!("{}.part", asset.name));
        log::info!("downloading {} from {}", asset.name, asset.browser_download_url);

        let resp = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await
            .with_context(|| format!("failed to request {}", asset.browser_download_url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!(
                "download failed: {} (HTTP {})",
                asset.browser_download_url,
                status
            ));
        }

        let mut file = tokio::fs::File::create(&part)
            .await
            .with_context(|| format!("failed to create {}", part.display()))?;
        let mut hasher = Sha256::new();
        let mut written = 0u64;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("download interrupted")?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        mark_executable(&part).await?;
        tokio::fs::rename(&part, &dest)
            .await
            .with_context(|| format!("failed to move download into {}", dest.display()))?;
        log::info!(
            "downloaded {} ({} bytes, sha256={})",
            dest.display(),
            written,
            hex::encode(hasher.finalize())
        );
        Ok(dest)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn download_latest(
        &self,
        asset_name: &str,
        dest_dir: &Path,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let releases = self.list_releases().await?;
        let Some(release) = newest_stable(&releases) else {
            return Err(anyhow!(
                "no stable release found for {}/{}",
                self.settings.owner,
                self.settings.repo
            ));
        };
        let assets = matching_assets(release, asset_name);
        log::debug!(
            "release {} has {} asset(s) named {}",
            release.tag_name,
            assets.len(),
            asset_name
        );
        let mut written = Vec::with_capacity(assets.len());
        for asset in assets {
            written.push(self.download_asset(asset, dest_dir).await?);
        }
        Ok(written)
    }
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
