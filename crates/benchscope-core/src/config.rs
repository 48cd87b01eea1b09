//! Dashboard configuration, read from `benchscope.yaml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::query::CachePolicy;

pub const CONFIG_FILE: &str = "benchscope.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashConfig {
    /// Base URL of the evaluation backend, without the `/api` suffix.
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub stale_time_secs: u64,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            stale_time_secs: 300,
            poll_interval_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl DashConfig {
    /// Loads the file if it exists, defaults otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let config: DashConfig = load_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// `explicit` wins; otherwise `benchscope.yaml` in the working directory.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(DashError::Config(format!(
                "config file not found: {}",
                path.display()
            ))),
            Some(path) => Self::load(path),
            None => Self::load(&PathBuf::from(CONFIG_FILE)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DashError::Config(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(DashError::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(DashError::Config("request_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Backend base URL with any trailing slash removed.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            stale_time: Duration::from_secs(self.stale_time_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

pub fn load_yaml<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let val = serde_yaml::from_str(&content)?;
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = DashConfig::load(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(cfg, DashConfig::default());
        assert_eq!(cfg.cache_policy(), CachePolicy::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "api_base_url: http://eval.local:9000/\nport: 9100\n").unwrap();
        let cfg = DashConfig::load(&path).unwrap();
        assert_eq!(cfg.api_base(), "http://eval.local:9000");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.poll_interval_secs, 5);
    }

    #[test]
    fn test_partial_file_stale_time_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "stale_time_secs: 60\n").unwrap();
        let cfg = DashConfig::load(&path).unwrap();
        assert_eq!(
            cfg,
            DashConfig {
                stale_time_secs: 60,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "api_base_url: localhost:8080\n").unwrap();
        assert!(matches!(DashConfig::load(&path), Err(DashError::Config(_))));

        std::fs::write(&path, "poll_interval_secs: 0\n").unwrap();
        assert!(matches!(DashConfig::load(&path), Err(DashError::Config(_))));

        std::fs::write(&path, "port: [1, 2]\n").unwrap();
        assert!(matches!(DashConfig::load(&path), Err(DashError::Yaml(_))));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("custom.yaml");
        assert!(matches!(
            DashConfig::discover(Some(&missing)),
            Err(DashError::Config(_))
        ));
    }
}
