use image::DynamicImage;
use image::metadata::Orientation;
use serde::Serialize;

/// Identifies one user action (one capture or selection).
/// Ids are handed out in increasing order by the inference runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded image plus the orientation its source reported.
/// The pixels are still in sensor layout; the runner normalizes them.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub image: DynamicImage,
    pub orientation: Orientation,
}

impl InferenceRequest {
    pub fn new(image: DynamicImage, orientation: Orientation) -> Self {
        Self { image, orientation }
    }

    /// Request for an image that is already upright
    pub fn upright(image: DynamicImage) -> Self {
        Self::new(image, Orientation::NoTransforms)
    }
}

/// One model's confidence for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    pub tag: String,
    pub score: f32,
}

impl InferenceResult {
    pub fn percent(&self) -> f64 {
        self.score as f64 * 100.0
    }
}

/// What a single model invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Score(f32),
    /// The model ran but produced no output value
    NoResult,
    Failed(String),
    /// A newer request was submitted before this model got to run
    Superseded,
}

impl ModelOutcome {
    /// True for outcomes the display treats as a missing result
    pub fn is_missing(&self) -> bool {
        matches!(self, ModelOutcome::NoResult | ModelOutcome::Failed(_))
    }
}

/// A model outcome tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    pub request: RequestId,
    pub tag: String,
    pub outcome: ModelOutcome,
}

impl InferenceReport {
    pub fn result(&self) -> Option<InferenceResult> {
        match self.outcome {
            ModelOutcome::Score(score) => Some(InferenceResult {
                tag: self.tag.clone(),
                score,
            }),
            _ => None,
        }
    }
}
