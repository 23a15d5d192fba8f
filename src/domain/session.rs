//! Active dataset/model ownership.
//!
//! A [`Controller`] holds at most one [`Session`]. Loading a new dataset
//! disposes the previous session first, so buffers and model weights from an
//! earlier run never coexist with the next one.

use crate::domain::accuracy::{self, AccuracyReport};
use crate::domain::error::MovecastError;
use crate::domain::price_row::PriceRow;
use crate::domain::sequence_builder::{self, Dataset, SequenceConfig};
use crate::ports::predictor_port::{
    CancellationToken, EpochLog, InputShape, Predictor, TrainingLog, TrainingOptions,
};
use tracing::{debug, info};

/// One dataset plus whatever has been trained and evaluated on it.
#[derive(Debug)]
pub struct Session<M> {
    dataset: Dataset,
    model: Option<M>,
    training_log: Option<TrainingLog>,
    report: Option<AccuracyReport>,
}

impl<M> Session<M> {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            model: None,
            training_log: None,
            report: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn training_log(&self) -> Option<&TrainingLog> {
        self.training_log.as_ref()
    }

    pub fn report(&self) -> Option<&AccuracyReport> {
        self.report.as_ref()
    }

    /// Build a fresh model, train it, then score it on the test split.
    /// A previous model on this session is dropped before the new one is built.
    pub fn train<P>(
        &mut self,
        predictor: &P,
        options: &TrainingOptions,
        on_epoch: &mut dyn FnMut(&EpochLog),
        cancel: &CancellationToken,
    ) -> Result<&AccuracyReport, MovecastError>
    where
        P: Predictor<Model = M>,
    {
        self.model = None;
        self.training_log = None;
        self.report = None;

        let mut model = predictor.build(InputShape::of(&self.dataset))?;
        let log = predictor.train(&mut model, &self.dataset, options, on_epoch, cancel)?;
        let predictions = predictor.predict(&model, &self.dataset.x_test)?;
        let report = accuracy::evaluate(
            &predictions,
            &self.dataset.y_test,
            &self.dataset.symbols,
        );
        info!(
            epochs = log.epochs.len(),
            cancelled = log.cancelled,
            overall = report.overall,
            "training finished"
        );

        self.model = Some(model);
        self.training_log = Some(log);
        Ok(self.report.insert(report))
    }
}

/// Owner of the single active session.
#[derive(Debug)]
pub struct Controller<M> {
    session: Option<Session<M>>,
}

impl<M> Default for Controller<M> {
    fn default() -> Self {
        Self { session: None }
    }
}

impl<M> Controller<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active session with one built from `rows`.
    ///
    /// The previous session is released before the new dataset is built, even
    /// when building fails.
    pub fn load(
        &mut self,
        rows: &[PriceRow],
        config: &SequenceConfig,
    ) -> Result<&mut Session<M>, MovecastError> {
        self.dispose();
        let dataset = sequence_builder::build(rows, config)?;
        Ok(self.session.insert(Session::new(dataset)))
    }

    pub fn session(&self) -> Option<&Session<M>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<M>> {
        self.session.as_mut()
    }

    pub fn dispose(&mut self) {
        if let Some(old) = self.session.take() {
            debug!(
                train = old.dataset.train_len(),
                test = old.dataset.test_len(),
                "disposing session"
            );
        }
    }
}
