//! Flat index layout shared by the sequence builder and the accuracy evaluator.
//!
//! Feature vectors interleave `(open, close)` per symbol in sorted-symbol order.
//! Target vectors are grouped by day offset: all symbols for offset 1, then all
//! symbols for offset 2, and so on.

/// Width of one feature vector.
pub fn feature_width(num_symbols: usize) -> usize {
    2 * num_symbols
}

/// Index of a symbol's normalized open inside a feature vector.
pub fn open_index(symbol: usize) -> usize {
    2 * symbol
}

/// Index of a symbol's normalized close inside a feature vector.
pub fn close_index(symbol: usize) -> usize {
    2 * symbol + 1
}

/// Width of one target vector.
pub fn target_width(num_symbols: usize, horizon: usize) -> usize {
    horizon * num_symbols
}

/// Slot of the up/down bit for `symbol` at `offset` days ahead (1-based).
pub fn target_index(symbol: usize, offset: usize, num_symbols: usize) -> usize {
    debug_assert!(offset >= 1, "day offsets are 1-based");
    symbol + (offset - 1) * num_symbols
}
