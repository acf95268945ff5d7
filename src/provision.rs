use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::LauncherError;
use crate::materialize::{materialize, Materialized};
use crate::releases::ReleaseSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAsset {
    pub path: PathBuf,
    pub state: Materialized,
}

pub async fn ensure_asset(
    target_dir: &Path,
    asset_name: &str,
    source: &dyn ReleaseSource,
) -> anyhow::Result<ProvisionedAsset> {
    let target_dir = absolute_dir(target_dir)?;
    tokio::fs::create_dir_all(&target_dir)
        .await
        .with_context(|| format!("failed to create {}", target_dir.display()))?;
    let target = target_dir.join(asset_name);

    let dir = target_dir.as_path();
    let expected = target.as_path();
    let state = materialize(expected, || async move {
        log::info!("{asset_name} missing, fetching newest stable release");
        let written = source.download_latest(asset_name, dir).await?;
        match written.first() {
            Some(first) if first == expected => Ok(()),
            first => Err(anyhow::Error::from(LauncherError::ProvisioningMismatch {
                expected: expected.to_path_buf(),
                received: first.cloned(),
            })),
        }
    })
    .await?;

    Ok(ProvisionedAsset {
        path: target,
        state,
    })
}

fn absolute_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(cwd.join(dir))
}
