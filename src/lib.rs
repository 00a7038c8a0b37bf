pub mod acquisition;
pub mod classification;
pub mod config;
pub mod display;
pub mod inference;
pub mod models;

pub use acquisition::{AcquiredImage, ImageSource};
pub use classification::{ClassificationModel, LoadError, ModelSet, ModelSpec};
pub use config::AppConfig;
pub use display::{DisplayLine, DisplayState, MergePolicy, ResultFormatter};
pub use inference::{InferenceHandle, InferenceRunner, Submission};
pub use models::{InferenceReport, InferenceRequest, InferenceResult, ModelOutcome, RequestId};

#[cfg(feature = "gui")]
pub mod gui;
