//! Application configuration management.
//!
//! Holds the server location, the routes the auth flow navigates to, and the
//! names and lifetimes of the cookies it manages. Every field has a default
//! matching the server's conventions, so a missing or partial file is fine.
//!
//! Configuration is stored at `~/.config/authglue/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "authglue";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cookie jar file name in cache directory
const COOKIE_JAR_FILE: &str = "cookies.json";

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "AUTHGLUE_BASE_URL";

/// Status code the server uses for "not logged in".
pub const NOT_LOGGED_IN_CODE: i64 = 100_403_003;

/// Lifetime of the profile cookie: 7 days.
pub const USER_INFO_MAX_AGE_SECS: i64 = 604_800;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin relative request URLs are resolved against
    pub base_url: String,
    pub login_page: String,
    pub home_page: String,
    pub login_endpoint: String,
    pub logout_endpoint: String,
    pub user_info_cookie: String,
    pub redirect_cookie: String,
    pub user_info_max_age_secs: i64,
    pub not_logged_in_code: i64,
    /// No timeout unless set; a stalled server stalls the caller.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            login_page: "/login".to_string(),
            home_page: "/".to_string(),
            login_endpoint: "/auth/login".to_string(),
            logout_endpoint: "/auth/logout".to_string(),
            user_info_cookie: "user_info".to_string(),
            redirect_cookie: "redirectUrl".to_string(),
            user_info_max_age_secs: USER_INFO_MAX_AGE_SECS,
            not_logged_in_code: NOT_LOGGED_IN_CODE,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `AUTHGLUE_BASE_URL` if present
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn cookie_jar_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(COOKIE_JAR_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.user_info_cookie, "user_info");
        assert_eq!(config.redirect_cookie, "redirectUrl");
        assert_eq!(config.user_info_max_age_secs, 604800);
        assert_eq!(config.not_logged_in_code, 100403003);
        assert_eq!(config.login_page, "/login");
        assert_eq!(config.logout_endpoint, "/auth/logout");
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "https://blog.example.com", "request_timeout_secs": 5}"#)
            .expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.base_url, "https://blog.example.com");
        assert_eq!(config.request_timeout_secs, Some(5));
        assert_eq!(config.login_page, "/login");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sub").join("config.json");
        let config = Config {
            home_page: "/home".to_string(),
            ..Config::default()
        };
        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("missing.json")).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(Config::load_from(&path).is_err());
    }
}
