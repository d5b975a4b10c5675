use crate::result::CommonResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "quiz-editor.config.json";

/// Quiz editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Lower bound shown for newly created scale items
    #[serde(default = "default_scale_min")]
    pub scale_min: i64,

    /// Upper bound shown for newly created scale items
    #[serde(default = "default_scale_max")]
    pub scale_max: i64,

    /// Tries granted by the blank quiz template
    #[serde(default = "default_tries")]
    pub default_tries: u32,

    /// Points granted by the blank quiz template
    #[serde(default = "default_points")]
    pub default_points: u32,

    /// Check references and session state after every mutation
    #[serde(default = "default_true")]
    pub verify_after_mutation: bool,

    /// Buffer size of each direction of the host message channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_scale_min() -> i64 {
    1
}

fn default_scale_max() -> i64 {
    7
}

fn default_tries() -> u32 {
    1
}

fn default_points() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    100
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: &Path) -> CommonResult<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
            default_tries: default_tries(),
            default_points: default_points(),
            verify_after_mutation: default_true(),
            channel_capacity: default_channel_capacity(),
        }
    }
}
