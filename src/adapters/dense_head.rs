//! Dense sigmoid output layer and the epoch loop that fits it.
//!
//! Both predictors reduce a window to a feature row (flattened inputs or a
//! final hidden state) and fit one of these heads on binary cross-entropy.

use crate::domain::accuracy::is_up;
use crate::domain::error::MovecastError;
use crate::ports::predictor_port::{CancellationToken, EpochLog, TrainingLog, TrainingOptions};
use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

const LOSS_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct DenseHead {
    /// `[input_width, output_width]`
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

impl DenseHead {
    pub fn zeros(input_width: usize, output_width: usize) -> Self {
        Self {
            weights: Array2::zeros((input_width, output_width)),
            bias: Array1::zeros(output_width),
        }
    }

    pub fn input_width(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_width(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward(&self, features: &ArrayView2<f32>) -> Array2<f32> {
        let mut logits = features.dot(&self.weights);
        logits += &self.bias;
        logits.mapv_inplace(sigmoid);
        logits
    }

    fn step(&mut self, features: &ArrayView2<f32>, targets: &ArrayView2<f32>, lr: f32) {
        let mut grad = self.forward(features);
        grad -= targets;
        grad /= features.nrows() as f32;

        let dw = features.t().dot(&grad);
        self.weights.scaled_add(-lr, &dw);
        self.bias.scaled_add(-lr, &grad.sum_axis(Axis(0)));
    }
}

/// Inverted dropout on head inputs during training.
#[derive(Debug, Clone)]
pub struct Dropout {
    rate: f32,
    rng: StdRng,
}

impl Dropout {
    pub fn new(rate: f32, seed: u64) -> Self {
        Self {
            rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn apply(&mut self, features: &ArrayView2<f32>) -> Array2<f32> {
        let rate = self.rate;
        let keep = 1.0 - rate;
        let mask = Array2::random_using(features.dim(), Uniform::new(0.0f32, 1.0), &mut self.rng)
            .mapv(|u| if u < rate { 0.0 } else { 1.0 / keep });
        features * &mask
    }
}

/// Head inputs and targets for both splits.
pub struct FitData<'a> {
    pub x_train: ArrayView2<'a, f32>,
    pub y_train: ArrayView2<'a, f32>,
    pub x_test: ArrayView2<'a, f32>,
    pub y_test: ArrayView2<'a, f32>,
}

/// Mini-batch gradient descent over the training rows in chronological order.
/// Scores both splits after every epoch and stops early when `cancel` is set.
pub fn fit_head(
    head: &mut DenseHead,
    data: FitData<'_>,
    options: &TrainingOptions,
    on_epoch: &mut dyn FnMut(&EpochLog),
    cancel: &CancellationToken,
    mut dropout: Option<Dropout>,
) -> Result<TrainingLog, MovecastError> {
    let n = data.x_train.nrows();
    if n == 0 {
        return Err(MovecastError::training("no training windows"));
    }
    if options.batch_size == 0 {
        return Err(MovecastError::training("batch_size must be at least 1"));
    }
    for targets in [&data.y_train, &data.y_test] {
        if targets.ncols() != head.output_width() {
            return Err(MovecastError::training(format!(
                "targets have width {}, model outputs {}",
                targets.ncols(),
                head.output_width()
            )));
        }
    }
    for features in [&data.x_train, &data.x_test] {
        if features.ncols() != head.input_width() {
            return Err(MovecastError::training(format!(
                "features have width {}, head expects {}",
                features.ncols(),
                head.input_width()
            )));
        }
    }

    let lr = options.learning_rate as f32;
    let mut log = TrainingLog::default();
    for epoch in 1..=options.epochs {
        if cancel.is_cancelled() {
            info!(completed = log.epochs.len(), "training cancelled");
            log.cancelled = true;
            break;
        }

        for start in (0..n).step_by(options.batch_size) {
            let end = (start + options.batch_size).min(n);
            let xb = data.x_train.slice(s![start..end, ..]);
            let yb = data.y_train.slice(s![start..end, ..]);
            match dropout.as_mut() {
                Some(d) => head.step(&d.apply(&xb).view(), &yb, lr),
                None => head.step(&xb, &yb, lr),
            }
        }

        let (loss, accuracy) = score(&head.forward(&data.x_train).view(), &data.y_train);
        if !loss.is_finite() {
            return Err(MovecastError::training(format!(
                "loss diverged at epoch {epoch}"
            )));
        }
        let (val_loss, val_accuracy) = if data.x_test.nrows() > 0 {
            let (l, a) = score(&head.forward(&data.x_test).view(), &data.y_test);
            (Some(l), Some(a))
        } else {
            (None, None)
        };

        let entry = EpochLog {
            epoch,
            loss,
            accuracy,
            val_loss,
            val_accuracy,
        };
        debug!(epoch, loss, accuracy, "epoch complete");
        on_epoch(&entry);
        log.epochs.push(entry);
    }
    Ok(log)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Mean binary cross-entropy and thresholded accuracy over every slot.
fn score(probabilities: &ArrayView2<f32>, targets: &ArrayView2<f32>) -> (f64, f64) {
    let total = probabilities.len();
    if total == 0 {
        return (0.0, 0.0);
    }
    let mut loss = 0.0f64;
    let mut correct = 0usize;
    for (&p, &t) in probabilities.iter().zip(targets.iter()) {
        let p = p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
        loss -= f64::from(t * p.ln() + (1.0 - t) * (1.0 - p).ln());
        if is_up(p) == (t > 0.5) {
            correct += 1;
        }
    }
    (loss / total as f64, correct as f64 / total as f64)
}
