//! Date × symbol price panel.

use crate::domain::normalization::MinMaxStats;
use crate::domain::price_row::PriceRow;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceCell {
    pub open: f64,
    pub close: f64,
}

/// Dense grid of optional cells, rows are dates and columns are symbols,
/// both sorted ascending.
#[derive(Debug, Clone)]
pub struct Panel {
    pub dates: Vec<String>,
    pub symbols: Vec<String>,
    cells: Vec<Option<PriceCell>>,
}

impl Panel {
    /// Pivot rows by (date, symbol). For duplicate keys the last row wins.
    pub fn pivot(rows: &[PriceRow]) -> Self {
        let dates: Vec<String> = rows
            .iter()
            .map(|r| r.date.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let symbols: Vec<String> = rows
            .iter()
            .map(|r| r.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let date_index: HashMap<&str, usize> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| (d.as_str(), i))
            .collect();
        let symbol_index: HashMap<&str, usize> = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut cells = vec![None; dates.len() * symbols.len()];
        for row in rows {
            let d = date_index[row.date.as_str()];
            let s = symbol_index[row.symbol.as_str()];
            cells[d * symbols.len() + s] = Some(PriceCell {
                open: row.open,
                close: row.close,
            });
        }

        Self {
            dates,
            symbols,
            cells,
        }
    }

    pub fn date_count(&self) -> usize {
        self.dates.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn get(&self, date: usize, symbol: usize) -> Option<PriceCell> {
        if date >= self.dates.len() || symbol >= self.symbols.len() {
            return None;
        }
        self.cells[date * self.symbols.len() + symbol]
    }

    /// Stats per symbol, in symbol order, over dates where the symbol has data.
    pub fn stats(&self) -> Vec<MinMaxStats> {
        (0..self.symbol_count())
            .map(|s| {
                MinMaxStats::from_observations(
                    (0..self.date_count())
                        .filter_map(|d| self.get(d, s))
                        .map(|c| (c.open, c.close)),
                )
            })
            .collect()
    }

    /// Min-max scale every present cell with its symbol's stats; absent cells stay absent.
    pub fn normalize(&self, stats: &[MinMaxStats]) -> Self {
        let width = self.symbol_count();
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.map(|c| {
                    let st = stats.get(i % width).copied().unwrap_or_default();
                    PriceCell {
                        open: st.scale_open(c.open),
                        close: st.scale_close(c.close),
                    }
                })
            })
            .collect();
        Self {
            dates: self.dates.clone(),
            symbols: self.symbols.clone(),
            cells,
        }
    }
}
