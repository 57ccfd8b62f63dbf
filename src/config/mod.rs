//! Application configuration
//!
//! [`Settings`] drive the command line: where relative URLs point, how the
//! HTTP client behaves and which defaults new dialogs get. Values come from
//! built-in defaults, then the first configuration file found, then
//! `MODAL_FRAME_*` environment variables.

pub mod options;

pub use options::{DialogOptions, DialogPatch, InvalidScrollMode, ScrollMode};

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("modal-frame/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OVERLAY_DELAY_MS: u64 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL relative content URLs are joined onto
    pub base_url: Option<String>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Delay before the loading overlay appears, in milliseconds
    pub overlay_delay_ms: u64,

    /// Render transport failures inside frames instead of their overlay
    pub fill_on_error: bool,

    /// Defaults for dialogs opened from the command line
    pub dialog: DialogOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            overlay_delay_ms: DEFAULT_OVERLAY_DELAY_MS,
            fill_on_error: false,
            dialog: DialogOptions::default(),
        }
    }
}

impl Settings {
    /// Initialize settings from the configuration file and the environment
    pub async fn init() -> Result<Self> {
        debug!("Initializing configuration");

        let mut settings = Self::default();

        if let Some(file_settings) = Self::load_from_file().await? {
            settings.merge_with(file_settings);
        }

        settings.load_from_env();
        settings.validate()?;

        Ok(settings)
    }

    /// Candidate configuration files, in priority order
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("./.modal-frame.json"),
            PathBuf::from("./modal-frame.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("modal-frame").join("config.json"));
        }

        paths
    }

    /// First configuration file found, if any
    pub async fn load_from_file() -> Result<Option<Self>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }

        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load settings from `MODAL_FRAME_*` environment variables
    pub fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = var("MODAL_FRAME_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Some(user_agent) = var("MODAL_FRAME_USER_AGENT") {
            self.user_agent = user_agent;
        }

        if let Some(timeout) = var("MODAL_FRAME_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = timeout;
        }

        if let Some(delay) = var("MODAL_FRAME_OVERLAY_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.overlay_delay_ms = delay;
        }

        if let Some(fill) = var("MODAL_FRAME_FILL_ON_ERROR") {
            self.fill_on_error = fill.to_lowercase() == "true";
        }
    }

    /// Merge another configuration into this one
    pub fn merge_with(&mut self, other: Self) {
        let defaults = Self::default();

        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.user_agent != defaults.user_agent && !other.user_agent.is_empty() {
            self.user_agent = other.user_agent;
        }
        if other.timeout_secs != defaults.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
        if other.overlay_delay_ms != defaults.overlay_delay_ms {
            self.overlay_delay_ms = other.overlay_delay_ms;
        }
        if other.fill_on_error {
            self.fill_on_error = true;
        }
        if other.dialog != defaults.dialog {
            self.dialog = other.dialog;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Dialog defaults with the frame-wide settings applied
    pub fn dialog_options(&self) -> DialogOptions {
        let mut options = self.dialog.clone();
        options.overlay_delay_ms = self.overlay_delay_ms;
        options.fill_frame_on_error = options.fill_frame_on_error || self.fill_on_error;
        options
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeoutSecs must be greater than 0"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(anyhow::anyhow!("userAgent must not be empty"));
        }

        if let Some(base_url) = &self.base_url {
            reqwest::Url::parse(base_url).with_context(|| format!("Invalid baseUrl: {base_url}"))?;
        }

        self.dialog
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid dialog defaults: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.user_agent.starts_with("modal-frame/"));
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MODAL_FRAME_BASE_URL", "https://example.com/"),
            ("MODAL_FRAME_TIMEOUT_SECS", "5"),
            ("MODAL_FRAME_OVERLAY_DELAY_MS", "not-a-number"),
            ("MODAL_FRAME_FILL_ON_ERROR", "TRUE"),
        ]);

        let mut settings = Settings::default();
        settings.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(settings.base_url.as_deref(), Some("https://example.com/"));
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.overlay_delay_ms, 100);
        assert!(settings.fill_on_error);
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"baseUrl": "http://localhost:8000/", "overlayDelayMs": 0, "dialog": {{"width": 800}}}}"#
        )
        .unwrap();

        let loaded = Settings::load_from_path(file.path()).await.unwrap();
        let mut settings = Settings::default();
        settings.merge_with(loaded);

        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:8000/"));
        assert_eq!(settings.overlay_delay_ms, 0);
        assert_eq!(settings.dialog.width, 800);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.dialog_options().overlay_delay_ms, 0);
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(Settings::load_from_path(file.path()).await.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            base_url: Some("::nope".to_string()),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
