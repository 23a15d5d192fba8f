//! Per-symbol directional accuracy of up/down predictions.

use crate::domain::layout;
use ndarray::Array2;
use std::collections::BTreeMap;

pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolAccuracy {
    pub symbol: String,
    pub accuracy: f64,
    /// Accuracy for day offsets 1..=horizon, in order.
    pub by_offset: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccuracyReport {
    pub symbols: Vec<SymbolAccuracy>,
    pub overall: f64,
    pub samples: usize,
}

impl AccuracyReport {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn by_symbol(&self) -> BTreeMap<String, f64> {
        self.symbols
            .iter()
            .map(|s| (s.symbol.clone(), s.accuracy))
            .collect()
    }
}

/// Accuracy per symbol over all samples and day offsets.
///
/// Malformed input (row-count mismatch, wrong width, no samples, no symbols)
/// yields an empty map.
pub fn compute_accuracy(
    predictions: &Array2<f32>,
    targets: &Array2<f32>,
    symbols: &[String],
) -> BTreeMap<String, f64> {
    evaluate(predictions, targets, symbols).by_symbol()
}

/// Full breakdown: per symbol, per day offset, and overall.
pub fn evaluate(
    predictions: &Array2<f32>,
    targets: &Array2<f32>,
    symbols: &[String],
) -> AccuracyReport {
    let num_symbols = symbols.len();
    let samples = predictions.nrows();
    if num_symbols == 0
        || samples == 0
        || targets.nrows() != samples
        || predictions.ncols() != targets.ncols()
        || predictions.ncols() % num_symbols != 0
    {
        return AccuracyReport::default();
    }
    let horizon = predictions.ncols() / num_symbols;
    if horizon == 0 {
        return AccuracyReport::default();
    }

    let mut correct_total = 0usize;
    let per_symbol = symbols
        .iter()
        .enumerate()
        .map(|(s, symbol)| {
            let by_offset: Vec<usize> = (1..=horizon)
                .map(|offset| {
                    let idx = layout::target_index(s, offset, num_symbols);
                    predictions
                        .column(idx)
                        .iter()
                        .zip(targets.column(idx).iter())
                        .filter(|&(&p, &t)| is_up(p) == (t > DECISION_THRESHOLD))
                        .count()
                })
                .collect();
            let correct: usize = by_offset.iter().sum();
            correct_total += correct;
            SymbolAccuracy {
                symbol: symbol.clone(),
                accuracy: correct as f64 / (samples * horizon) as f64,
                by_offset: by_offset
                    .into_iter()
                    .map(|c| c as f64 / samples as f64)
                    .collect(),
            }
        })
        .collect();

    AccuracyReport {
        symbols: per_symbol,
        overall: correct_total as f64 / (samples * horizon * num_symbols) as f64,
        samples,
    }
}

/// Threshold a probability into an up (true) / down (false) call.
pub fn is_up(probability: f32) -> bool {
    probability > DECISION_THRESHOLD
}
