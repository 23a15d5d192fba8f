#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use movecast::domain::error::MovecastError;
pub use movecast::domain::price_row::PriceRow;
use movecast::ports::data_port::DataPort;

pub struct MockDataPort {
    pub rows: Vec<PriceRow>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            error: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<PriceRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_rows(&self) -> Result<Vec<PriceRow>, MovecastError> {
        if let Some(reason) = &self.error {
            return Err(MovecastError::format(reason.clone()));
        }
        Ok(self.rows.clone())
    }
}

pub fn day(start: &str, offset: usize) -> String {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (start + Duration::days(offset as i64))
        .format("%Y-%m-%d")
        .to_string()
}

/// `count` consecutive days of prices moving by `step` per day.
pub fn generate_rows(
    symbol: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<PriceRow> {
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            PriceRow::new(day(start_date, i), symbol, close - step / 2.0, close)
        })
        .collect()
}

/// Render rows as CSV text with the default header.
pub fn to_csv(rows: &[PriceRow]) -> String {
    let mut text = String::from("Date,Symbol,Open,Close\n");
    for r in rows {
        text.push_str(&format!("{},{},{},{}\n", r.date, r.symbol, r.open, r.close));
    }
    text
}
