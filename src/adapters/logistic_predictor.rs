//! Baseline predictor: one logistic unit per output slot over the flattened window.
//!
//! Weights start at zero and batches are visited in chronological order, so a
//! run is fully deterministic for a given dataset and set of options. Useful
//! as a reference point for the recurrent predictor.

use crate::adapters::dense_head::{DenseHead, FitData, fit_head};
use crate::domain::error::MovecastError;
use crate::domain::sequence_builder::Dataset;
use crate::ports::predictor_port::{
    CancellationToken, EpochLog, InputShape, Predictor, TrainingLog, TrainingOptions,
};
use ndarray::{Array2, Array3, ArrayView2};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LogisticModel {
    pub shape: InputShape,
    /// Reads `sequence_length × feature_width` flattened inputs.
    pub head: DenseHead,
}

impl LogisticModel {
    fn input_dim(&self) -> usize {
        self.shape.sequence_length * self.shape.feature_width
    }

    fn flatten<'a>(&self, inputs: &'a Array3<f32>) -> Result<ArrayView2<'a, f32>, MovecastError> {
        let (n, len, width) = inputs.dim();
        if len != self.shape.sequence_length || width != self.shape.feature_width {
            return Err(MovecastError::training(format!(
                "input windows are [{len}, {width}], model expects [{}, {}]",
                self.shape.sequence_length, self.shape.feature_width
            )));
        }
        inputs
            .view()
            .into_shape_with_order((n, self.input_dim()))
            .map_err(|e| MovecastError::training(format!("cannot flatten inputs: {e}")))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticPredictor;

impl LogisticPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for LogisticPredictor {
    type Model = LogisticModel;

    fn build(&self, shape: InputShape) -> Result<LogisticModel, MovecastError> {
        let input_dim = shape.sequence_length * shape.feature_width;
        if input_dim == 0 || shape.output_width == 0 {
            return Err(MovecastError::training(format!(
                "degenerate model shape {shape:?}"
            )));
        }
        debug!(input_dim, outputs = shape.output_width, "building logistic model");
        Ok(LogisticModel {
            shape,
            head: DenseHead::zeros(input_dim, shape.output_width),
        })
    }

    fn train(
        &self,
        model: &mut LogisticModel,
        dataset: &Dataset,
        options: &TrainingOptions,
        on_epoch: &mut dyn FnMut(&EpochLog),
        cancel: &CancellationToken,
    ) -> Result<TrainingLog, MovecastError> {
        let x_train = model.flatten(&dataset.x_train)?;
        let x_test = model.flatten(&dataset.x_test)?;
        let data = FitData {
            x_train,
            y_train: dataset.y_train.view(),
            x_test,
            y_test: dataset.y_test.view(),
        };
        fit_head(&mut model.head, data, options, on_epoch, cancel, None)
    }

    fn predict(
        &self,
        model: &LogisticModel,
        inputs: &Array3<f32>,
    ) -> Result<Array2<f32>, MovecastError> {
        let flat = model.flatten(inputs)?;
        Ok(model.head.forward(&flat))
    }
}
