use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageBuffer, Rgb};
use otofind::classification::preprocessing::ModelInput;
use otofind::{ClassificationModel, ModelSet};
use tempfile::NamedTempFile;

/// Always returns the same score
pub struct FixedScore(pub f32);

impl ClassificationModel for FixedScore {
    fn input_size(&self) -> (u32, u32) {
        (8, 8)
    }

    fn predict(&self, _input: &ModelInput) -> anyhow::Result<Option<f32>> {
        Ok(Some(self.0))
    }
}

/// Runs but produces no output value
pub struct NoOutput;

impl ClassificationModel for NoOutput {
    fn input_size(&self) -> (u32, u32) {
        (8, 8)
    }

    fn predict(&self, _input: &ModelInput) -> anyhow::Result<Option<f32>> {
        Ok(None)
    }
}

/// Fails with a runtime error
pub struct Failing;

impl ClassificationModel for Failing {
    fn input_size(&self) -> (u32, u32) {
        (8, 8)
    }

    fn predict(&self, _input: &ModelInput) -> anyhow::Result<Option<f32>> {
        anyhow::bail!("tensor shape mismatch")
    }
}

pub struct Panicking;

impl ClassificationModel for Panicking {
    fn input_size(&self) -> (u32, u32) {
        (8, 8)
    }

    fn predict(&self, _input: &ModelInput) -> anyhow::Result<Option<f32>> {
        panic!("model blew up")
    }
}

/// Blocks each prediction until the test releases it.
/// Signals on `started` when a prediction begins.
pub struct Gated {
    score: f32,
    release: Mutex<Receiver<()>>,
    started: Mutex<Sender<()>>,
}

pub struct Gate {
    pub release: Sender<()>,
    pub started: Receiver<()>,
}

pub fn gated(score: f32) -> (Gated, Gate) {
    let (release_tx, release_rx) = mpsc::channel();
    let (started_tx, started_rx) = mpsc::channel();
    (
        Gated {
            score,
            release: Mutex::new(release_rx),
            started: Mutex::new(started_tx),
        },
        Gate {
            release: release_tx,
            started: started_rx,
        },
    )
}

impl ClassificationModel for Gated {
    fn input_size(&self) -> (u32, u32) {
        (8, 8)
    }

    fn predict(&self, _input: &ModelInput) -> anyhow::Result<Option<f32>> {
        let _ = self.started.lock().unwrap().send(());
        self.release.lock().unwrap().recv()?;
        Ok(Some(self.score))
    }
}

/// Keeps every input it was given
pub struct Recording {
    size: (u32, u32),
    pub inputs: Arc<Mutex<Vec<ModelInput>>>,
}

impl Recording {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ClassificationModel for Recording {
    fn input_size(&self) -> (u32, u32) {
        self.size
    }

    fn predict(&self, input: &ModelInput) -> anyhow::Result<Option<f32>> {
        self.inputs.lock().unwrap().push(input.clone());
        Ok(Some(0.5))
    }
}

pub fn shared(model: impl ClassificationModel + 'static) -> Arc<dyn ClassificationModel> {
    Arc::new(model)
}

pub fn model_set(models: Vec<(&str, Arc<dyn ClassificationModel>)>) -> ModelSet {
    ModelSet::from_models(
        models
            .into_iter()
            .map(|(tag, model)| (tag.to_string(), model))
            .collect(),
    )
    .expect("Failed to build model set")
}

/// A 64x48 reddish test photo
pub fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 48, |x, y| {
        Rgb([200, (x * 4) as u8, (y * 4) as u8])
    }))
}

/// 40x20 image, left half red and right half blue
pub fn split_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(40, 20, |x, _| {
        if x < 20 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
    }))
}

/// Writes `test_image()` to a temporary PNG file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image_file() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    test_image()
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
