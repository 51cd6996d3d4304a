use std::path::Path;

use anyhow::{Context, Result, bail};
use jobtailor_core::ReplyFormat;
use serde::{Deserialize, Serialize};

/// Sentinel written into a freshly created config so startup can tell
/// "never configured" apart from a real key.
pub const PLACEHOLDER_KEY: &str = "example_key";

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

/// On-disk configuration (`config.json` under the application root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub reply_format: ReplyFormat,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        Ok(config)
    }

    /// Write a placeholder config for the user to fill in.
    pub fn write_placeholder(path: &Path) -> Result<()> {
        let placeholder = Config {
            api_key: PLACEHOLDER_KEY.to_string(),
            model: default_model(),
            base_url: default_base_url(),
            reply_format: ReplyFormat::default(),
        };
        let json = serde_json::to_string_pretty(&placeholder)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to create config at {}", path.display()))
    }

    /// Reject missing or never-filled-in API keys before any network call.
    pub fn validate_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_key == PLACEHOLDER_KEY {
            bail!("api_key is not set: edit your config.json and add a real key");
        }
        Ok(())
    }
}
