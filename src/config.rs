use std::path::PathBuf;
use std::time::Duration;

use crate::classification::ModelSpec;
use crate::display::{DEFAULT_PRECISION, MergePolicy};

pub const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Models run for every image, in invocation order
    pub models: Vec<ModelSpec>,
    pub merge_policy: MergePolicy,
    /// Decimals shown for each percentage
    pub precision: usize,
    /// How long to wait for a model before showing it as failed
    pub result_timeout: Duration,
    /// External capture command; `None` means no camera is available
    pub camera_command: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelSpec::defaults_in(&default_models_dir()),
            merge_policy: MergePolicy::default(),
            precision: DEFAULT_PRECISION,
            result_timeout: DEFAULT_RESULT_TIMEOUT,
            camera_command: None,
        }
    }
}

impl AppConfig {
    pub fn camera_available(&self) -> bool {
        self.camera_command
            .as_ref()
            .is_some_and(|command| !command.is_empty())
    }
}

/// `~/.cache/otofind`, or `./models` when no home directory is known
pub fn default_models_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".cache/otofind"))
        .unwrap_or_else(|_| PathBuf::from("models"))
}

/// Split a shell-like command line on whitespace
pub fn parse_command(command: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() { None } else { Some(parts) }
}
