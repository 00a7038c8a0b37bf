use crate::config::AppConfig;
use crate::inference::InferenceRunner;

/// State shared by all screens
pub struct AppState {
    pub config: AppConfig,
    /// Set once the models have loaded
    pub runner: Option<InferenceRunner>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            runner: None,
        }
    }
}
