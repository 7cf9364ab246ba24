//! Weighted symbol tables

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Symbol;
use crate::error::{Result, SlotError};

/// Largest total weight a table may hold; the pool stores one slot per unit
pub const MAX_TOTAL_WEIGHT: u32 = 1 << 20;

/// One `(symbol, weight)` pair of a weight table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Symbol id
    pub symbol: Symbol,
    /// Number of pool slots the symbol occupies
    pub weight: u32,
}

/// Weighted symbol table
///
/// Draws are uniform over the expanded pool: a symbol added with weight `w`
/// occupies `w` of the `N` total slots, so it comes up with probability
/// `w / N`. Serialized as the ordered entry list, never as the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeightEntry>", into = "Vec<WeightEntry>")]
pub struct WeightTable {
    entries: Vec<WeightEntry>,
    pool: Vec<Symbol>,
}

impl WeightTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(symbol, weight)` pairs, in order
    pub fn from_entries(entries: impl IntoIterator<Item = (Symbol, u32)>) -> Self {
        let mut table = Self::new();
        for (symbol, weight) in entries {
            table.add(symbol, weight);
        }
        table
    }

    /// Append `weight` copies of `symbol` to the pool. Weight 0 is a no-op.
    ///
    /// The pool grows by `weight` slots; keep the total under
    /// [`MAX_TOTAL_WEIGHT`] or [`WeightTable::validate`] rejects the table.
    pub fn add(&mut self, symbol: Symbol, weight: u32) {
        if weight == 0 {
            return;
        }
        self.entries.push(WeightEntry { symbol, weight });
        self.pool.extend(std::iter::repeat_n(symbol, weight as usize));
    }

    /// Draw one symbol.
    ///
    /// # Panics
    ///
    /// Panics if the table is empty. Check with [`WeightTable::validate`]
    /// before the first draw.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        self.pool[rng.random_range(0..self.pool.len())]
    }

    /// Fail if nothing can be drawn or the pool is oversized
    pub fn validate(&self) -> Result<()> {
        if self.pool.is_empty() {
            return Err(SlotError::EmptyWeightTable);
        }
        check_total(self.pool.len() as u64)
    }

    /// Total weight `N`
    pub fn total_weight(&self) -> u32 {
        self.pool.len() as u32
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Probability of drawing `symbol`
    pub fn probability(&self, symbol: Symbol) -> f64 {
        if self.pool.is_empty() {
            return 0.0;
        }
        let weight: u32 = self
            .entries
            .iter()
            .filter(|e| e.symbol == symbol)
            .map(|e| e.weight)
            .sum();
        weight as f64 / self.pool.len() as f64
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    /// Distinct symbols in insertion order
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !symbols.contains(&entry.symbol) {
                symbols.push(entry.symbol);
            }
        }
        symbols
    }

    /// Highest symbol id that can be drawn
    pub fn max_symbol(&self) -> Option<Symbol> {
        self.entries.iter().map(|e| e.symbol).max()
    }
}

fn check_total(total: u64) -> Result<()> {
    if total > MAX_TOTAL_WEIGHT as u64 {
        return Err(SlotError::WeightTooLarge {
            total,
            max: MAX_TOTAL_WEIGHT,
        });
    }
    Ok(())
}

impl TryFrom<Vec<WeightEntry>> for WeightTable {
    type Error = SlotError;

    /// Checks the total before expanding anything
    fn try_from(entries: Vec<WeightEntry>) -> Result<Self> {
        check_total(entries.iter().map(|e| e.weight as u64).sum())?;
        Ok(Self::from_entries(
            entries.into_iter().map(|e| (e.symbol, e.weight)),
        ))
    }
}

impl From<WeightTable> for Vec<WeightEntry> {
    fn from(table: WeightTable) -> Self {
        table.entries
    }
}
