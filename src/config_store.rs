use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::LauncherError;
use crate::materialize::{materialize, Materialized};

pub const DEFAULT_SEARCH_HOST: &str = "http://localhost:7700";
pub const API_KEY_LEN: usize = 21;
const API_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
// The key is passed as `--master-key <key>`; a leading '-' parses as a flag.
const API_KEY_LEADING: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub meili_search_config: SearchEngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngineConfig {
    pub host: String,
    pub api_key: String,
}

impl AppConfig {
    pub fn generate() -> Self {
        Self {
            meili_search_config: SearchEngineConfig {
                host: DEFAULT_SEARCH_HOST.to_string(),
                api_key: generate_api_key(),
            },
        }
    }

    pub fn api_key(&self) -> &str {
        &self.meili_search_config.api_key
    }

    pub fn host(&self) -> &str {
        &self.meili_search_config.host
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub state: Materialized,
}

/// URL-safe random token drawn from the thread-local CSPRNG.
pub fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    (0..API_KEY_LEN)
        .map(|i| {
            let pool = if i == 0 {
                API_KEY_LEADING
            } else {
                API_KEY_ALPHABET
            };
            pool[rng.gen_range(0..pool.len())] as char
        })
        .collect()
}

pub fn is_url_safe_token(s: &str) -> bool {
    s.len() >= API_KEY_LEN
        && s.bytes().next().is_some_and(|b| API_KEY_LEADING.contains(&b))
        && s.bytes().all(|b| API_KEY_ALPHABET.contains(&b))
}

pub async fn ensure_config(path: &Path) -> anyhow::Result<LoadedConfig> {
    let state = materialize(path, || async move {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut text = serde_json::to_string_pretty(&AppConfig::generate())?;
        text.push('\n');
        let part = part_path(path);
        tokio::fs::write(&part, text)
            .await
            .with_context(|| format!("failed to write {}", part.display()))?;
        tokio::fs::rename(&part, path)
            .await
            .with_context(|| format!("failed to move config into {}", path.display()))?;
        log::info!("created config with a fresh api key at {}", path.display());
        Ok::<_, anyhow::Error>(())
    })
    .await?;

    let config = load_config(path).await?;
    Ok(LoadedConfig { config, state })
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

pub async fn load_config(path: &Path) -> Result<AppConfig, LauncherError> {
    let parse_err = |message: String| LauncherError::ConfigParse {
        path: path.to_path_buf(),
        message,
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| parse_err(e.to_string()))?;
    let config: AppConfig = serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?;
    if config.api_key().is_empty() {
        return Err(parse_err("meiliSearchConfig.apiKey is empty".to_string()));
    }
    Ok(config)
}
