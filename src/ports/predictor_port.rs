//! Model training and prediction port.

use crate::domain::error::MovecastError;
use crate::domain::sequence_builder::Dataset;
use ndarray::{Array2, Array3};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shape of one model input window and its output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub sequence_length: usize,
    pub feature_width: usize,
    pub output_width: usize,
}

impl InputShape {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            sequence_length: dataset.sequence_length,
            feature_width: dataset.feature_width(),
            output_width: dataset.target_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochLog {
    /// 1-based epoch number.
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    /// `None` when the test split is empty.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingLog {
    pub epochs: Vec<EpochLog>,
    pub cancelled: bool,
}

impl TrainingLog {
    pub fn last(&self) -> Option<&EpochLog> {
        self.epochs.last()
    }
}

/// Cooperative cancellation flag, checked by trainers between epochs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub trait Predictor {
    type Model;

    fn build(&self, shape: InputShape) -> Result<Self::Model, MovecastError>;

    /// Train on `dataset.x_train`/`y_train`, validating on the test split.
    /// `on_epoch` fires after every completed epoch.
    fn train(
        &self,
        model: &mut Self::Model,
        dataset: &Dataset,
        options: &TrainingOptions,
        on_epoch: &mut dyn FnMut(&EpochLog),
        cancel: &CancellationToken,
    ) -> Result<TrainingLog, MovecastError>;

    /// Up-probabilities shaped `[inputs, output_width]`.
    fn predict(&self, model: &Self::Model, inputs: &Array3<f32>) -> Result<Array2<f32>, MovecastError>;
}
