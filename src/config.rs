use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::radio::SelectionPolicy;

/// config format this build understands
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    #[serde(default)]
    pub api: ApiConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub radio: RadioConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let config: Config =
            toml::from_str(contents).with_context(|| "Failed to parse config TOML")?;
        anyhow::ensure!(
            config.version == CONFIG_VERSION,
            "Unsupported config version {} (expected {CONFIG_VERSION})",
            config.version
        );
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Database {
    InMemory,
    OnDisk { path: PathBuf },
}

pub const DEFAULT_API_BASE: &str = "https://hehe-jet-beta.vercel.app/api";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub search_limit: u32,
    pub recommendation_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 10,
            search_limit: 5,
            recommendation_limit: 5,
        }
    }
}

/// overrides of the radio selection policy
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RadioConfig {
    pub recent_window: Option<usize>,
    pub pool_size: Option<usize>,
}

impl RadioConfig {
    pub fn policy(&self) -> SelectionPolicy {
        let default = SelectionPolicy::default();
        SelectionPolicy::new(
            self.recent_window.unwrap_or(default.recent_window()),
            self.pool_size.unwrap_or(default.pool_size()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[database]
kind = "in_memory"

[http]
bind_addr = "127.0.0.1"
port = 5000
"#;

        let cfg = Config::parse(toml_str)?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.database, Database::InMemory);

        // api and radio fall back to defaults
        assert_eq!(cfg.api.base_url, DEFAULT_API_BASE);
        assert_eq!(cfg.api.recommendation_limit, 5);
        assert_eq!(cfg.radio.policy(), SelectionPolicy::default());

        Ok(())
    }

    #[test]
    fn test_parse_full_config() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[database]
kind = "on_disk"
path = "/tmp/doradeck.db"

[api]
base_url = "http://localhost:3000/api"
timeout_secs = 3

[http]
bind_addr = "0.0.0.0"
port = 8080

[radio]
recent_window = 20
pool_size = 0
"#;

        let cfg = Config::parse(toml_str)?;

        assert_eq!(
            cfg.database,
            Database::OnDisk {
                path: PathBuf::from("/tmp/doradeck.db")
            }
        );
        assert_eq!(cfg.api.base_url, "http://localhost:3000/api");
        assert_eq!(cfg.api.timeout_secs, 3);
        assert_eq!(cfg.api.search_limit, 5);
        assert_eq!(cfg.http.port, 8080);

        let policy = cfg.radio.policy();
        assert_eq!(policy.recent_window(), 20);
        assert_eq!(policy.pool_size(), 1);

        Ok(())
    }

    #[test]
    fn test_unsupported_version_is_an_error() {
        let toml_str = r#"
version = 2

[database]
kind = "in_memory"

[http]
bind_addr = "127.0.0.1"
port = 5000
"#;

        let err = Config::parse(toml_str).unwrap_err();
        assert!(err.to_string().contains("Unsupported config version 2"));
    }

    #[test]
    fn test_zero_recent_window_is_clamped() {
        let radio = RadioConfig {
            recent_window: Some(0),
            pool_size: None,
        };
        assert_eq!(radio.policy().recent_window(), 1);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
