//! Configuration errors

use crate::Symbol;

/// Errors raised while building or loading a machine variant.
///
/// Precondition violations inside the live engine (drawing from an empty
/// pool, reading a cell outside the grid) panic instead; these are the
/// failures a host can check for before the first spin.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Weight table is empty")]
    EmptyWeightTable,

    #[error("Total weight {total} exceeds {max}")]
    WeightTooLarge { total: u64, max: u32 },

    #[error("Grid must have at least one reel and one row")]
    EmptyGrid,

    #[error("Grid {reels}x{rows} exceeds capacity {max_reels}x{max_rows}")]
    GridTooLarge {
        reels: usize,
        rows: usize,
        max_reels: usize,
        max_rows: usize,
    },

    #[error("Reel {reel} has {len} rows, expected {expected}")]
    RaggedGrid {
        reel: usize,
        len: usize,
        expected: usize,
    },

    #[error("Payout table has {len} entries but symbol {symbol} can be drawn")]
    PayoutTableTooShort { symbol: Symbol, len: usize },

    #[error("Invalid payout table: {0}")]
    InvalidPayout(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for fallible configuration work.
pub type Result<T> = std::result::Result<T, SlotError>;
