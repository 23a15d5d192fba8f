//! Recurrent predictor: a GRU encoder over each window feeding a dense sigmoid head.
//!
//! The recurrent weights are drawn once from a seeded uniform distribution and
//! stay fixed. Training fits the head on the final hidden state, with dropout
//! on that state, so a given seed and dataset always yield the same model.

use crate::adapters::dense_head::{DenseHead, Dropout, FitData, fit_head, sigmoid};
use crate::domain::error::MovecastError;
use crate::domain::sequence_builder::Dataset;
use crate::ports::predictor_port::{
    CancellationToken, EpochLog, InputShape, Predictor, TrainingLog, TrainingOptions,
};
use ndarray::{Array1, Array2, Array3, ArrayView1, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

pub const DEFAULT_HIDDEN_SIZE: usize = 32;
pub const DEFAULT_DROPOUT: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct GruCell {
    w_iz: Array2<f32>,
    w_hz: Array2<f32>,
    b_z: Array1<f32>,
    w_ir: Array2<f32>,
    w_hr: Array2<f32>,
    b_r: Array1<f32>,
    w_in: Array2<f32>,
    w_hn: Array2<f32>,
    b_n: Array1<f32>,
}

impl GruCell {
    fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f32).sqrt();
        Self {
            w_iz: uniform((hidden_size, input_size), limit, rng),
            w_hz: uniform((hidden_size, hidden_size), limit, rng),
            b_z: Array1::zeros(hidden_size),
            w_ir: uniform((hidden_size, input_size), limit, rng),
            w_hr: uniform((hidden_size, hidden_size), limit, rng),
            b_r: Array1::zeros(hidden_size),
            w_in: uniform((hidden_size, input_size), limit, rng),
            w_hn: uniform((hidden_size, hidden_size), limit, rng),
            b_n: Array1::zeros(hidden_size),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.b_z.len()
    }

    /// One time step: `h' = (1 - z) ⊙ n + z ⊙ h`.
    fn forward(&self, x: ArrayView1<f32>, h: &Array1<f32>) -> Array1<f32> {
        let z = (self.w_iz.dot(&x) + self.w_hz.dot(h) + &self.b_z).mapv(sigmoid);
        let r = (self.w_ir.dot(&x) + self.w_hr.dot(h) + &self.b_r).mapv(sigmoid);
        let n = (self.w_in.dot(&x) + self.w_hn.dot(&(&r * h)) + &self.b_n).mapv(f32::tanh);
        &n + &(&z * &(h - &n))
    }
}

fn uniform(shape: (usize, usize), limit: f32, rng: &mut StdRng) -> Array2<f32> {
    Array2::random_using(shape, Uniform::new(-limit, limit), rng)
}

#[derive(Debug, Clone)]
pub struct GruModel {
    pub shape: InputShape,
    pub cell: GruCell,
    /// Reads the final hidden state.
    pub head: DenseHead,
}

impl GruModel {
    /// Run every window through the cell and keep the last hidden state.
    pub fn encode(&self, inputs: &Array3<f32>) -> Result<Array2<f32>, MovecastError> {
        let (n, len, width) = inputs.dim();
        if len != self.shape.sequence_length || width != self.shape.feature_width {
            return Err(MovecastError::training(format!(
                "input windows are [{len}, {width}], model expects [{}, {}]",
                self.shape.sequence_length, self.shape.feature_width
            )));
        }

        let mut encoded = Array2::zeros((n, self.cell.hidden_size()));
        for b in 0..n {
            let mut h = Array1::zeros(self.cell.hidden_size());
            for t in 0..len {
                h = self.cell.forward(inputs.slice(s![b, t, ..]), &h);
            }
            encoded.row_mut(b).assign(&h);
        }
        Ok(encoded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GruPredictor {
    pub hidden_size: usize,
    /// Fraction of hidden units dropped per training batch, in `[0, 1)`.
    pub dropout: f64,
    pub seed: u64,
}

impl Default for GruPredictor {
    fn default() -> Self {
        Self {
            hidden_size: DEFAULT_HIDDEN_SIZE,
            dropout: DEFAULT_DROPOUT,
            seed: DEFAULT_SEED,
        }
    }
}

impl GruPredictor {
    pub fn new(hidden_size: usize, dropout: f64, seed: u64) -> Self {
        Self {
            hidden_size,
            dropout,
            seed,
        }
    }
}

impl Predictor for GruPredictor {
    type Model = GruModel;

    fn build(&self, shape: InputShape) -> Result<GruModel, MovecastError> {
        if shape.sequence_length == 0 || shape.feature_width == 0 || shape.output_width == 0 {
            return Err(MovecastError::training(format!(
                "degenerate model shape {shape:?}"
            )));
        }
        if self.hidden_size == 0 {
            return Err(MovecastError::training("hidden_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(MovecastError::training(format!(
                "dropout {} outside [0, 1)",
                self.dropout
            )));
        }

        debug!(
            hidden = self.hidden_size,
            outputs = shape.output_width,
            seed = self.seed,
            "building GRU model"
        );
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(GruModel {
            shape,
            cell: GruCell::new(shape.feature_width, self.hidden_size, &mut rng),
            head: DenseHead::zeros(self.hidden_size, shape.output_width),
        })
    }

    fn train(
        &self,
        model: &mut GruModel,
        dataset: &Dataset,
        options: &TrainingOptions,
        on_epoch: &mut dyn FnMut(&EpochLog),
        cancel: &CancellationToken,
    ) -> Result<TrainingLog, MovecastError> {
        let h_train = model.encode(&dataset.x_train)?;
        let h_test = model.encode(&dataset.x_test)?;
        let dropout =
            (self.dropout > 0.0).then(|| Dropout::new(self.dropout as f32, self.seed.wrapping_add(1)));
        let data = FitData {
            x_train: h_train.view(),
            y_train: dataset.y_train.view(),
            x_test: h_test.view(),
            y_test: dataset.y_test.view(),
        };
        fit_head(&mut model.head, data, options, on_epoch, cancel, dropout)
    }

    fn predict(&self, model: &GruModel, inputs: &Array3<f32>) -> Result<Array2<f32>, MovecastError> {
        let encoded = model.encode(inputs)?;
        Ok(model.head.forward(&encoded.view()))
    }
}
