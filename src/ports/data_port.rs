//! Price data source port.

use crate::domain::error::MovecastError;
use crate::domain::price_row::PriceRow;

pub trait DataPort {
    /// All valid rows from the source, in source order.
    fn load_rows(&self) -> Result<Vec<PriceRow>, MovecastError>;
}
