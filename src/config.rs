use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

use crate::filter::FilterMode;
use crate::github::DEFAULT_HOST;

pub const APP_NAME: &str = "pr-threads";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub host. `--host` and `GH_HOST` take precedence
    pub host: Option<String>,
    /// Initial filter when `--status` is not given
    pub default_status: Option<String>,
    pub log_level: LogLevel,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// false にすると常にプレーンテキストで折り返す
    pub markdown: bool,
    pub theme: String,
    /// 非対話リスト出力の本文幅
    pub list_width: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_owned())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            markdown: true,
            theme: "dark".to_owned(),
            list_width: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Missing file ⇒ defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// 設定ファイルパス: ~/.config/pr-threads/config.toml
    pub fn config_path() -> Option<PathBuf> {
        BaseDirectories::with_prefix(APP_NAME)
            .ok()
            .map(|dirs| dirs.get_config_home().join("config.toml"))
    }

    /// `--host` > `GH_HOST` > config > github.com
    pub fn resolve_host(&self, cli: Option<&str>, env: Option<String>) -> String {
        [cli.map(str::to_owned), env, self.host.clone()]
            .into_iter()
            .flatten()
            .map(|h| h.trim().to_owned())
            .find(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned())
    }

    /// `--status` > config `default_status` > all
    pub fn resolve_status(&self, cli: Option<&str>) -> Result<FilterMode> {
        match (cli, self.default_status.as_deref()) {
            (Some(status), _) => Ok(status.parse::<FilterMode>()?),
            (None, Some(status)) => status
                .parse::<FilterMode>()
                .context("invalid default_status in config file"),
            (None, None) => Ok(FilterMode::All),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.render.markdown);
        assert_eq!(config.render.theme, "dark");
        assert_eq!(config.render.list_width, 120);
        assert_eq!(config.log_level.0, "info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "host = \"ghe.example.com\"\n\n[render]\nmarkdown = false"
        )
        .unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.host.as_deref(), Some("ghe.example.com"));
        assert!(!config.render.markdown);
        assert_eq!(config.render.theme, "dark");
        assert_eq!(config.default_status, None);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "render = 3").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_host_precedence() {
        let config = Config {
            host: Some("config.example.com".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_host(Some("cli.example.com"), Some("env.example.com".to_owned())),
            "cli.example.com"
        );
        assert_eq!(
            config.resolve_host(None, Some("env.example.com".to_owned())),
            "env.example.com"
        );
        assert_eq!(config.resolve_host(Some("  "), None), "config.example.com");
        assert_eq!(Config::default().resolve_host(None, None), DEFAULT_HOST);
    }

    #[test]
    fn test_status_precedence() {
        let config = Config {
            default_status: Some("unresolved".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_status(Some("resolved")).unwrap(),
            FilterMode::Resolved
        );
        assert_eq!(config.resolve_status(None).unwrap(), FilterMode::Unresolved);
        assert_eq!(
            Config::default().resolve_status(None).unwrap(),
            FilterMode::All
        );
        assert!(config.resolve_status(Some("bogus")).is_err());
    }
}
