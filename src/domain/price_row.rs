//! Daily price row for one symbol.

use chrono::NaiveDate;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    /// Calendar date; must sort chronologically as a string (ISO 8601).
    pub date: String,
    pub symbol: String,
    pub open: f64,
    pub close: f64,
}

impl PriceRow {
    pub fn new(date: impl Into<String>, symbol: impl Into<String>, open: f64, close: f64) -> Self {
        Self {
            date: date.into(),
            symbol: symbol.into(),
            open,
            close,
        }
    }

    /// True when the date is `YYYY-MM-DD`, so lexicographic order is chronological.
    pub fn has_iso_date(&self) -> bool {
        NaiveDate::parse_from_str(&self.date, ISO_DATE_FORMAT).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates_are_recognised() {
        assert!(PriceRow::new("2024-01-15", "AAPL", 1.0, 2.0).has_iso_date());
        assert!(!PriceRow::new("15/01/2024", "AAPL", 1.0, 2.0).has_iso_date());
        assert!(!PriceRow::new("2024-13-01", "AAPL", 1.0, 2.0).has_iso_date());
    }
}
