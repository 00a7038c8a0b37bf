mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from otofind for tests
pub use otofind::classification::{AOM_TAG, CSOM_TAG};
pub use otofind::display::{CLASSIFYING_TEXT, ERROR_TEXT};
pub use otofind::{
    ClassificationModel, InferenceReport, InferenceRequest, InferenceRunner, MergePolicy,
    ModelOutcome, ResultFormatter,
};
