use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use treekit_core::Git;

pub const DEFAULT_CONFIG_NAME: &str = "treekit.config.json";

/// treekit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Author recorded when stamping provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Upper bound on each git query
    #[serde(default = "default_git_timeout_ms")]
    pub git_timeout_ms: u64,

    /// Pretty-print JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_git_timeout_ms() -> u64 {
    2000
}

fn default_pretty() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn git(&self) -> Git {
        Git::new(Duration::from_millis(self.git_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author: None,
            git_timeout_ms: default_git_timeout_ms(),
            pretty: default_pretty(),
        }
    }
}
