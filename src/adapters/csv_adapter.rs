//! CSV price file adapter.
//!
//! Expects a header row naming at least the date, symbol, open and close
//! columns. Data lines with the wrong field count or unparseable prices are
//! skipped with a warning; structural problems with the file as a whole are
//! reported as [`MovecastError::Format`].

use crate::domain::error::MovecastError;
use crate::domain::price_row::PriceRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Header names of the four required columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: String,
    pub symbol: String,
    pub open: String,
    pub close: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            symbol: "Symbol".into(),
            open: "Open".into(),
            close: "Close".into(),
        }
    }
}

impl ColumnMap {
    /// Column names from the `[columns]` section, falling back to defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: String| {
            config
                .get_string("columns", key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };
        Self {
            date: get("date", defaults.date),
            symbol: get("symbol", defaults.symbol),
            open: get("open", defaults.open),
            close: get("close", defaults.close),
        }
    }
}

struct ColumnIndex {
    date: usize,
    symbol: usize,
    open: usize,
    close: usize,
}

impl ColumnIndex {
    fn resolve(header: &StringRecord, columns: &ColumnMap) -> Result<Self, MovecastError> {
        let names: Vec<&str> = header.iter().map(clean_field).collect();
        let find = |name: &str| names.iter().position(|n| *n == name);

        let (Some(date), Some(symbol), Some(open), Some(close)) = (
            find(columns.date.as_str()),
            find(columns.symbol.as_str()),
            find(columns.open.as_str()),
            find(columns.close.as_str()),
        ) else {
            let missing: Vec<&str> = [&columns.date, &columns.symbol, &columns.open, &columns.close]
                .into_iter()
                .map(String::as_str)
                .filter(|name| find(*name).is_none())
                .collect();
            return Err(MovecastError::format(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        };
        Ok(Self {
            date,
            symbol,
            open,
            close,
        })
    }
}

/// Parse CSV text into price rows, preserving input order.
pub fn parse(text: &str, columns: &ColumnMap) -> Result<Vec<PriceRow>, MovecastError> {
    let line_count = text.lines().filter(|l| !l.trim().is_empty()).count();
    if line_count < 2 {
        return Err(MovecastError::format(
            "CSV needs a header and at least one data line",
        ));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = rdr
        .headers()
        .map_err(|e| MovecastError::format(format!("unreadable header: {e}")))?
        .clone();
    let index = ColumnIndex::resolve(&header, columns)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping unreadable line: {e}");
                skipped += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.iter().all(|f| clean_field(f).is_empty()) {
            continue;
        }
        if record.len() != header.len() {
            warn!(
                line,
                "skipping line: {} fields, header has {}",
                record.len(),
                header.len()
            );
            skipped += 1;
            continue;
        }

        let field = |i: usize| clean_field(record.get(i).unwrap_or_default());
        let (date, symbol) = (field(index.date), field(index.symbol));
        if date.is_empty() || symbol.is_empty() {
            warn!(line, "skipping line: empty date or symbol");
            skipped += 1;
            continue;
        }
        let (Some(open), Some(close)) = (parse_price(field(index.open)), parse_price(field(index.close)))
        else {
            warn!(
                line,
                "skipping line: non-numeric price (open {:?}, close {:?})",
                field(index.open),
                field(index.close)
            );
            skipped += 1;
            continue;
        };

        rows.push(PriceRow::new(date, symbol, open, close));
    }

    if let Some(row) = rows.iter().find(|r| !r.has_iso_date()) {
        warn!(
            date = %row.date,
            "dates are not YYYY-MM-DD; lexicographic order may not be chronological"
        );
    }
    debug!(rows = rows.len(), skipped, "parsed CSV");
    Ok(rows)
}

fn clean_field(field: &str) -> &str {
    field.trim_matches(|c: char| c == '"' || c.is_whitespace())
}

fn parse_price(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub struct CsvAdapter {
    path: PathBuf,
    columns: ColumnMap,
}

impl CsvAdapter {
    pub fn new(path: PathBuf, columns: ColumnMap) -> Self {
        Self { path, columns }
    }
}

impl DataPort for CsvAdapter {
    fn load_rows(&self) -> Result<Vec<PriceRow>, MovecastError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            MovecastError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", self.path.display(), e),
            ))
        })?;
        parse(&content, &self.columns)
    }
}
