// Grader configuration management
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::decode::DecodeStrictness;

/// Tunable grading policy. Every field has a serde default so a partial
/// config file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Wall-clock deadline per execution, in milliseconds.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Names tried (case-insensitively) when the caller supplies no
    /// explicit entry point.
    #[serde(default = "default_entry_point_candidates")]
    pub entry_point_candidates: Vec<String>,
    #[serde(default)]
    pub decode_strictness: DecodeStrictness,
}

fn default_deadline_ms() -> u64 {
    2_000
}

fn default_entry_point_candidates() -> Vec<String> {
    vec![
        "solution".to_string(),
        "solve".to_string(),
        "main".to_string(),
    ]
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            entry_point_candidates: default_entry_point_candidates(),
            decode_strictness: DecodeStrictness::default(),
        }
    }
}

impl GraderConfig {
    /// Load configuration from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Grader config file not found: {}", config_path.display());
        }

        let content =
            fs::read_to_string(config_path).context("Failed to read grader config")?;

        let config: GraderConfig =
            serde_json::from_str(&content).context("Failed to parse grader config")?;

        Ok(config)
    }

    /// Load with default path (config/grader.json)
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new("config/grader.json");
        Self::load(default_path)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
