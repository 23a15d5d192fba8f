//! Sliding-window sequence construction and chronological train/test split.
//!
//! Rows are pivoted into a [`Panel`], normalized per symbol, and cut into
//! windows of `sequence_length` days. Each window is labelled with up/down
//! bits for the following `prediction_horizon` days, measured against the
//! close on the day right after the window.

use crate::domain::error::MovecastError;
use crate::domain::layout;
use crate::domain::panel::Panel;
use crate::domain::price_row::PriceRow;
use ndarray::{Array2, Array3};
use tracing::{debug, info};

pub const DEFAULT_SEQUENCE_LENGTH: usize = 12;
pub const DEFAULT_PREDICTION_HORIZON: usize = 3;
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceConfig {
    pub sequence_length: usize,
    pub prediction_horizon: usize,
    pub train_fraction: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            prediction_horizon: DEFAULT_PREDICTION_HORIZON,
            train_fraction: DEFAULT_TRAIN_FRACTION,
        }
    }
}

impl SequenceConfig {
    /// Reject shapes that cannot produce a window or a split.
    pub fn validate(&self) -> Result<(), MovecastError> {
        let invalid = |key: &str, reason: &str| MovecastError::ConfigInvalid {
            section: "sequence".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if self.sequence_length == 0 {
            return Err(invalid("sequence_length", "sequence_length must be at least 1"));
        }
        if self.prediction_horizon == 0 {
            return Err(invalid(
                "prediction_horizon",
                "prediction_horizon must be at least 1",
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(invalid(
                "train_fraction",
                "train_fraction must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Number of windows a panel with `date_count` dates yields.
    pub fn window_count(&self, date_count: usize) -> usize {
        date_count.saturating_sub(self.sequence_length + self.prediction_horizon)
    }

    /// Number of windows that go to the training split.
    pub fn train_count(&self, window_count: usize) -> usize {
        (window_count as f64 * self.train_fraction).floor() as usize
    }
}

/// Dates a window covers: input days plus the label days after them.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpan {
    pub first_input: String,
    pub last_input: String,
    pub last_target: String,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    /// `[train, sequence_length, 2 × symbols]`
    pub x_train: Array3<f32>,
    /// `[train, horizon × symbols]`
    pub y_train: Array2<f32>,
    pub x_test: Array3<f32>,
    pub y_test: Array2<f32>,
    pub symbols: Vec<String>,
    pub sequence_length: usize,
    pub prediction_horizon: usize,
    pub train_windows: Vec<WindowSpan>,
    pub test_windows: Vec<WindowSpan>,
}

impl Dataset {
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn feature_width(&self) -> usize {
        layout::feature_width(self.symbols.len())
    }

    pub fn target_width(&self) -> usize {
        layout::target_width(self.symbols.len(), self.prediction_horizon)
    }

    pub fn train_len(&self) -> usize {
        self.x_train.shape()[0]
    }

    pub fn test_len(&self) -> usize {
        self.x_test.shape()[0]
    }
}

struct Window {
    inputs: Vec<Vec<f32>>,
    targets: Vec<f32>,
    span: WindowSpan,
}

/// Build the train/test dataset from parsed rows.
pub fn build(rows: &[PriceRow], config: &SequenceConfig) -> Result<Dataset, MovecastError> {
    config.validate()?;
    if rows.is_empty() {
        return Err(MovecastError::data("no valid rows to build sequences from"));
    }

    let panel = Panel::pivot(rows);
    if panel.symbol_count() == 0 {
        return Err(MovecastError::data("no symbols found in rows"));
    }
    debug!(
        dates = panel.date_count(),
        symbols = panel.symbol_count(),
        "pivoted rows"
    );

    let stats = panel.stats();
    let normalized = panel.normalize(&stats);

    let windows = collect_windows(&normalized, config);
    if windows.is_empty() {
        return Err(MovecastError::data(format!(
            "no sequences: {} dates available, need more than {}",
            normalized.date_count(),
            config.sequence_length + config.prediction_horizon
        )));
    }

    let split = config.train_count(windows.len());
    let (train, test) = windows.split_at(split);
    info!(
        windows = windows.len(),
        train = train.len(),
        test = test.len(),
        symbols = normalized.symbol_count(),
        "built sequences"
    );

    let feature_width = layout::feature_width(normalized.symbol_count());
    let target_width = layout::target_width(normalized.symbol_count(), config.prediction_horizon);
    let (x_train, y_train) = pack(train, config.sequence_length, feature_width, target_width)?;
    let (x_test, y_test) = pack(test, config.sequence_length, feature_width, target_width)?;

    Ok(Dataset {
        x_train,
        y_train,
        x_test,
        y_test,
        symbols: normalized.symbols.clone(),
        sequence_length: config.sequence_length,
        prediction_horizon: config.prediction_horizon,
        train_windows: train.iter().map(|w| w.span.clone()).collect(),
        test_windows: test.iter().map(|w| w.span.clone()).collect(),
    })
}

fn collect_windows(panel: &Panel, config: &SequenceConfig) -> Vec<Window> {
    let len = config.sequence_length;
    let horizon = config.prediction_horizon;
    let num_symbols = panel.symbol_count();
    let target_width = layout::target_width(num_symbols, horizon);

    let mut windows = Vec::with_capacity(config.window_count(panel.date_count()));
    for start in 0..config.window_count(panel.date_count()) {
        let inputs: Vec<Vec<f32>> = (start..start + len)
            .map(|d| feature_vector(panel, d))
            .collect();

        let base = start + len;
        let mut targets = vec![0.0f32; target_width];
        for offset in 1..=horizon {
            for s in 0..num_symbols {
                let up = match (panel.get(base, s), panel.get(base + offset, s)) {
                    (Some(now), Some(future)) => future.close > now.close,
                    _ => false,
                };
                if up {
                    targets[layout::target_index(s, offset, num_symbols)] = 1.0;
                }
            }
        }

        if inputs.len() != len || targets.len() != target_width {
            debug!(start, "dropping structurally incomplete window");
            continue;
        }

        windows.push(Window {
            inputs,
            targets,
            span: WindowSpan {
                first_input: panel.dates[start].clone(),
                last_input: panel.dates[base - 1].clone(),
                last_target: panel.dates[base + horizon].clone(),
            },
        });
    }
    windows
}

fn feature_vector(panel: &Panel, date: usize) -> Vec<f32> {
    let mut features = vec![0.0f32; layout::feature_width(panel.symbol_count())];
    for s in 0..panel.symbol_count() {
        if let Some(cell) = panel.get(date, s) {
            features[layout::open_index(s)] = cell.open as f32;
            features[layout::close_index(s)] = cell.close as f32;
        }
    }
    features
}

fn pack(
    windows: &[Window],
    sequence_length: usize,
    feature_width: usize,
    target_width: usize,
) -> Result<(Array3<f32>, Array2<f32>), MovecastError> {
    let inputs: Vec<f32> = windows
        .iter()
        .flat_map(|w| w.inputs.iter().flatten().copied())
        .collect();
    let targets: Vec<f32> = windows
        .iter()
        .flat_map(|w| w.targets.iter().copied())
        .collect();

    let x = Array3::from_shape_vec((windows.len(), sequence_length, feature_width), inputs)
        .map_err(|e| MovecastError::data(format!("input shape mismatch: {e}")))?;
    let y = Array2::from_shape_vec((windows.len(), target_width), targets)
        .map_err(|e| MovecastError::data(format!("target shape mismatch: {e}")))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(i: usize) -> String {
        format!("2024-01-{:02}", i + 1)
    }

    fn rising_rows(symbol: &str, days: usize) -> Vec<PriceRow> {
        (0..days)
            .map(|i| PriceRow::new(day(i), symbol, 10.0 + i as f64, 11.0 + i as f64))
            .collect()
    }

    #[test]
    fn default_config_values() {
        let config = SequenceConfig::default();
        assert_eq!(config.sequence_length, 12);
        assert_eq!(config.prediction_horizon, 3);
        assert_relative_eq!(config.train_fraction, 0.8);
    }

    #[test]
    fn window_count_matches_dates_minus_length_and_horizon() {
        let config = SequenceConfig::default();
        assert_eq!(config.window_count(0), 0);
        assert_eq!(config.window_count(15), 0);
        assert_eq!(config.window_count(16), 1);
        assert_eq!(config.window_count(30), 15);
    }

    #[test]
    fn empty_rows_is_data_error() {
        let err = build(&[], &SequenceConfig::default()).unwrap_err();
        assert!(matches!(err, MovecastError::Data { .. }));
    }

    #[test]
    fn too_few_dates_is_data_error() {
        let rows = rising_rows("AAPL", 15);
        let err = build(&rows, &SequenceConfig::default()).unwrap_err();
        assert!(matches!(err, MovecastError::Data { .. }));
    }

    #[test]
    fn shapes_follow_symbols_and_horizon() {
        let mut rows = rising_rows("AAPL", 30);
        rows.extend(rising_rows("MSFT", 30));
        let ds = build(&rows, &SequenceConfig::default()).unwrap();

        // 30 - 12 - 3 = 15 windows, floor(15 * 0.8) = 12 train
        assert_eq!(ds.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(ds.x_train.shape(), &[12, 12, 4]);
        assert_eq!(ds.y_train.shape(), &[12, 6]);
        assert_eq!(ds.x_test.shape(), &[3, 12, 4]);
        assert_eq!(ds.y_test.shape(), &[3, 6]);
        assert_eq!(ds.feature_width(), 4);
        assert_eq!(ds.target_width(), 6);
    }

    #[test]
    fn rising_prices_label_every_slot_up() {
        let ds = build(&rising_rows("AAPL", 20), &SequenceConfig::default()).unwrap();
        assert!(ds.y_train.iter().all(|&v| v == 1.0));
        assert!(ds.y_test.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn target_bits_compare_against_day_after_window() {
        let closes = [10.0, 10.0, 12.0, 8.0];
        let rows: Vec<PriceRow> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceRow::new(day(i), "AAPL", c, c))
            .collect();
        let config = SequenceConfig {
            sequence_length: 1,
            prediction_horizon: 2,
            train_fraction: 0.8,
        };
        let ds = build(&rows, &config).unwrap();

        // One window; floor(1 * 0.8) = 0 train.
        assert_eq!(ds.train_len(), 0);
        assert_eq!(ds.test_len(), 1);
        assert_eq!(ds.y_test.row(0).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn missing_cells_zero_fill_inputs_and_targets() {
        let mut rows = rising_rows("AAPL", 16);
        // MSFT only trades on the first day.
        rows.push(PriceRow::new(day(0), "MSFT", 50.0, 60.0));
        let ds = build(&rows, &SequenceConfig::default()).unwrap();

        let x = if ds.train_len() > 0 { &ds.x_train } else { &ds.x_test };
        let y = if ds.train_len() > 0 { &ds.y_train } else { &ds.y_test };
        // day 1 has no MSFT cell
        assert_eq!(x[[0, 1, layout::open_index(1)]], 0.0);
        assert_eq!(x[[0, 1, layout::close_index(1)]], 0.0);
        for offset in 1..=3 {
            assert_eq!(y[[0, layout::target_index(1, offset, 2)]], 0.0);
            assert_eq!(y[[0, layout::target_index(0, offset, 2)]], 1.0);
        }
    }

    #[test]
    fn inputs_are_normalized() {
        let ds = build(&rising_rows("AAPL", 20), &SequenceConfig::default()).unwrap();
        assert_relative_eq!(ds.x_train[[0, 0, 0]], 0.0);
        for &v in ds.x_train.iter().chain(ds.x_test.iter()) {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn split_is_chronological() {
        let ds = build(&rising_rows("AAPL", 40), &SequenceConfig::default()).unwrap();
        let last_train = ds.train_windows.last().unwrap();
        for w in &ds.test_windows {
            assert!(w.first_input > last_train.first_input);
        }
        assert_eq!(ds.train_windows[0].first_input, "2024-01-01");
        assert_eq!(ds.train_windows[0].last_input, "2024-01-12");
        assert_eq!(ds.train_windows[0].last_target, "2024-01-16");
    }

    fn invalid_key(result: Result<Dataset, MovecastError>) -> String {
        match result {
            Err(MovecastError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn zero_sequence_length_is_rejected() {
        let config = SequenceConfig {
            sequence_length: 0,
            ..SequenceConfig::default()
        };
        let result = build(&rising_rows("AAPL", 20), &config);
        assert_eq!(invalid_key(result), "sequence_length");
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let config = SequenceConfig {
            prediction_horizon: 0,
            ..SequenceConfig::default()
        };
        let result = build(&rising_rows("AAPL", 20), &config);
        assert_eq!(invalid_key(result), "prediction_horizon");
    }

    #[test]
    fn train_fraction_outside_unit_interval_is_rejected() {
        for fraction in [0.0, 1.0, 1.5, -0.25, f64::NAN] {
            let config = SequenceConfig {
                train_fraction: fraction,
                ..SequenceConfig::default()
            };
            let result = build(&rising_rows("AAPL", 40), &config);
            assert_eq!(invalid_key(result), "train_fraction");
        }
    }
}
