// Copyright 2026 Pracsite Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use log::debug;
use serde::Deserialize;
use serde::Serialize;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PRACSITE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: PathBuf,
    pub cache_ttl_hours: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_endpoint: Option<String>,
    pub search_api_key_env: String,
    pub youtube_api_base: String,
    pub youtube_api_key_env: String,
    pub max_search_results: usize,
    pub request_timeout_secs: u64,
    pub share_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("pracsite.db"),
            cache_ttl_hours: 24,
            search_endpoint: None,
            search_api_key_env: "PRACSITE_SEARCH_KEY".to_string(),
            youtube_api_base: crate::search::YOUTUBE_API_BASE.to_string(),
            youtube_api_key_env: "YOUTUBE_API_KEY".to_string(),
            max_search_results: 15,
            request_timeout_secs: 15,
            share_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Config {
    pub fn cache_ttl_ms(&self) -> i64 {
        (self.cache_ttl_hours as i64) * 60 * 60 * 1000
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where `pracsite.toml` lives: `$PRACSITE_CONFIG`, else the platform
/// config dir.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(dirs::config_dir()
        .context("Failed to get config directory")?
        .join("pracsite")
        .join("pracsite.toml"))
}

/// Load the config file, or defaults when there is none yet.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    debug!("loading config from {}", path.display());
    read_config(&path)
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut config: Config =
        toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    if config.max_search_results == 0 {
        config.max_search_results = Config::default().max_search_results;
    }
    Ok(config)
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("serialize config")?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))
}

/// A site directory holding an initialized store, plus the loaded config.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("get current dir")?;
        Self::discover_from(&cwd, load_config()?)
    }

    pub fn discover_from(start: &Path, config: Config) -> Result<Self> {
        let root = locate_store(start, &config.store_path)
            .context("store not found; run `pracsite init` first")?;
        Ok(Self { root, config })
    }

    /// An absolute `store_path` replaces the root on join.
    pub fn store_path(&self) -> PathBuf {
        self.root.join(&self.config.store_path)
    }
}

/// Nearest ancestor of `start` (itself included) that holds the store file.
fn locate_store(start: &Path, store_path: &Path) -> Option<PathBuf> {
    if store_path.is_absolute() {
        return store_path
            .is_file()
            .then(|| store_path.parent().unwrap_or(store_path).to_path_buf());
    }
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join(store_path).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn discovery_walks_up_to_the_store() -> Result<()> {
        let dir = tempdir()?;
        let site = dir.path().join("site");
        let nested = site.join("papers").join("2023");
        std::fs::create_dir_all(&nested)?;
        std::fs::write(site.join("pracsite.db"), "")?;

        let workspace = Workspace::discover_from(&nested, Config::default())?;
        assert_eq!(workspace.root, site.canonicalize()?);
        assert_eq!(workspace.store_path(), site.canonicalize()?.join("pracsite.db"));
        Ok(())
    }

    #[test]
    fn discovery_fails_without_a_store() -> Result<()> {
        let dir = tempdir()?;
        std::fs::create_dir(dir.path().join("pracsite.db"))?;
        let err = Workspace::discover_from(dir.path(), Config::default()).unwrap_err();
        assert!(err.to_string().contains("run `pracsite init` first"));
        Ok(())
    }

    #[test]
    fn absolute_store_path_ignores_the_cwd() -> Result<()> {
        let dir = tempdir()?;
        let elsewhere = tempdir()?;
        let db = elsewhere.path().join("shared.db");
        std::fs::write(&db, "")?;
        let config = Config {
            store_path: db.clone(),
            ..Config::default()
        };

        let workspace = Workspace::discover_from(dir.path(), config)?;
        assert_eq!(workspace.store_path(), db);
        Ok(())
    }

    #[test]
    fn written_config_reads_back_and_zero_limit_resets() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("pracsite.toml");
        write_config(
            &path,
            &Config {
                cache_ttl_hours: 6,
                search_endpoint: Some("http://127.0.0.1:9/search".to_string()),
                max_search_results: 0,
                ..Config::default()
            },
        )?;

        let config = read_config(&path)?;
        assert_eq!(config.cache_ttl_ms(), 6 * 60 * 60 * 1000);
        assert_eq!(
            config.search_endpoint.as_deref(),
            Some("http://127.0.0.1:9/search")
        );
        assert_eq!(config.max_search_results, 15);
        Ok(())
    }

    #[test]
    fn partial_config_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("pracsite.toml");
        std::fs::write(&path, "request_timeout_secs = 3\n")?;
        let config = read_config(&path)?;
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.share_base_url, "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn bad_toml_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("pracsite.toml");
        std::fs::write(&path, "cache_ttl_hours = \"soon\"\n")?;
        let err = read_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("pracsite.toml"));
        Ok(())
    }
}
