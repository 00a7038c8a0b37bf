pub mod preprocessing;
pub mod rten_model;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use preprocessing::ModelInput;
use rten_model::RtenModel;

pub const AOM_TAG: &str = "Acute Otitis Media";
pub const CSOM_TAG: &str = "Chronic Suppurative Otitis Media";

/// Default model input size (width, height)
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

/// A pre-trained image model producing a single confidence score.
pub trait ClassificationModel: Send + Sync {
    /// Input size (width, height) the image is center-cropped to
    fn input_size(&self) -> (u32, u32);

    /// Run the model. `Ok(None)` means the model produced no output value.
    fn predict(&self, input: &ModelInput) -> anyhow::Result<Option<f32>>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("no classification models configured")]
    NoModels,
    #[error("model file for '{tag}' not found: {}", path.display())]
    MissingModel { tag: String, path: PathBuf },
    #[error("failed to load model '{tag}' from {}: {reason}", path.display())]
    Invalid {
        tag: String,
        path: PathBuf,
        reason: String,
    },
    #[error("model tag '{0}' is configured more than once")]
    DuplicateTag(String),
    #[error("model loading was interrupted: {0}")]
    Interrupted(String),
}

/// Where to find one model and how to feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub tag: String,
    pub path: PathBuf,
    pub input_size: (u32, u32),
}

impl ModelSpec {
    pub fn new(tag: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            path: path.into(),
            input_size: DEFAULT_INPUT_SIZE,
        }
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    /// The two otitis media models, expected as `aom.rten` and `csom.rten`
    pub fn defaults_in(models_dir: &Path) -> Vec<ModelSpec> {
        vec![
            ModelSpec::new(AOM_TAG, models_dir.join("aom.rten")),
            ModelSpec::new(CSOM_TAG, models_dir.join("csom.rten")),
        ]
    }
}

/// A loaded, uniquely tagged set of models. Cheap to clone.
#[derive(Clone)]
pub struct ModelSet {
    models: Vec<(String, Arc<dyn ClassificationModel>)>,
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelSet {
    /// Load every model file in `specs`, in order.
    pub fn load(specs: &[ModelSpec]) -> Result<Self, LoadError> {
        let mut models: Vec<(String, Arc<dyn ClassificationModel>)> = Vec::new();

        for spec in specs {
            if !spec.path.exists() {
                return Err(LoadError::MissingModel {
                    tag: spec.tag.clone(),
                    path: spec.path.clone(),
                });
            }

            let model = RtenModel::load(&spec.path, spec.input_size).map_err(|e| {
                LoadError::Invalid {
                    tag: spec.tag.clone(),
                    path: spec.path.clone(),
                    reason: e.to_string(),
                }
            })?;
            log::info!("Loaded model '{}' from {}", spec.tag, spec.path.display());

            models.push((spec.tag.clone(), Arc::new(model)));
        }

        Self::from_models(models)
    }

    /// Build a set from already constructed models
    pub fn from_models(
        models: Vec<(String, Arc<dyn ClassificationModel>)>,
    ) -> Result<Self, LoadError> {
        if models.is_empty() {
            return Err(LoadError::NoModels);
        }

        for (i, (tag, _)) in models.iter().enumerate() {
            if models[..i].iter().any(|(other, _)| other == tag) {
                return Err(LoadError::DuplicateTag(tag.clone()));
            }
        }

        Ok(Self { models })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ClassificationModel)> {
        self.models
            .iter()
            .map(|(tag, model)| (tag.as_str(), model.as_ref()))
    }
}
