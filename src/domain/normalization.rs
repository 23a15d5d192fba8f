//! Per-symbol min-max normalization.

/// Observed open/close ranges for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxStats {
    pub open_min: f64,
    pub open_max: f64,
    pub close_min: f64,
    pub close_max: f64,
}

impl Default for MinMaxStats {
    /// Degenerate `[0, 1]` range used for symbols with no observations.
    fn default() -> Self {
        Self {
            open_min: 0.0,
            open_max: 1.0,
            close_min: 0.0,
            close_max: 1.0,
        }
    }
}

impl MinMaxStats {
    /// Ranges over the given `(open, close)` pairs; defaults when empty.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = observations.into_iter();
        let Some((open, close)) = iter.next() else {
            return Self::default();
        };
        let mut stats = Self {
            open_min: open,
            open_max: open,
            close_min: close,
            close_max: close,
        };
        for (open, close) in iter {
            stats.open_min = stats.open_min.min(open);
            stats.open_max = stats.open_max.max(open);
            stats.close_min = stats.close_min.min(close);
            stats.close_max = stats.close_max.max(close);
        }
        stats
    }

    pub fn scale_open(&self, value: f64) -> f64 {
        min_max_scale(value, self.open_min, self.open_max)
    }

    pub fn scale_close(&self, value: f64) -> f64 {
        min_max_scale(value, self.close_min, self.close_max)
    }
}

/// `(v - min) / (max - min)`, with a zero range treated as 1.
pub fn min_max_scale(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    let range = if range == 0.0 { 1.0 } else { range };
    (value - min) / range
}
