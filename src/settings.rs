use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::platform::HostPlatform;
use crate::releases::GitHubSettings;
use crate::supervisor::SupervisorOptions;

pub const STATE_DIR_NAME: &str = ".docbase";
pub const DEFAULT_RUNNER: &str = "bun";
pub const DEFAULT_PACKAGE: &str = "docbase";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPaths {
    pub root: PathBuf,
    pub asset_dir: PathBuf,
    pub config_path: PathBuf,
}

impl LaunchPaths {
    /// `<root>/<repo>/` holds the search engine, `<root>/data/config.json` the secret.
    pub fn under(root: &Path, repo: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            asset_dir: root.join(repo),
            config_path: root.join("data").join("config.json"),
        }
    }
}

pub fn default_state_root() -> anyhow::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(STATE_DIR_NAME))
        .ok_or_else(|| anyhow!("could not determine the home directory; pass --home"))
}

#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub paths: LaunchPaths,
    pub host: HostPlatform,
    pub runner: String,
    pub package: String,
    pub self_update: bool,
    pub supervisor: SupervisorOptions,
    pub github: GitHubSettings,
}

impl LaunchSettings {
    pub fn new(root: &Path, host: HostPlatform) -> Self {
        let github = GitHubSettings::default();
        Self {
            paths: LaunchPaths::under(root, &github.repo),
            host,
            runner: DEFAULT_RUNNER.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            self_update: true,
            supervisor: SupervisorOptions::default(),
            github,
        }
    }
}
