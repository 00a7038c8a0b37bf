use std::path::Path;

use anyhow::Result;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};

use super::ClassificationModel;
use super::preprocessing::ModelInput;

/// Scalar regressor backed by an rten model file.
///
/// The model is expected to take a single `[1, 3, H, W]` float input and to
/// produce a tensor whose first element is the confidence.
pub struct RtenModel {
    model: Model,
    input_size: (u32, u32),
}

impl RtenModel {
    pub fn load(path: &Path, input_size: (u32, u32)) -> Result<Self> {
        let model = Model::load_file(path)?;
        Ok(Self { model, input_size })
    }
}

impl ClassificationModel for RtenModel {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn predict(&self, input: &ModelInput) -> Result<Option<f32>> {
        let tensor = NdTensor::from_data(input.shape(), input.data.clone());
        let output: Tensor<f32> = self.model.run_one(tensor.view().into(), None)?.try_into()?;
        Ok(output.iter().next().copied())
    }
}
