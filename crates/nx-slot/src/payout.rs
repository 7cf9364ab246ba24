//! Paytable evaluation
//!
//! Three rules cover every machine:
//! - `SingleCell`: the one visible symbol pays its multiplier
//! - `LineMatch`: row 0 pays only when every reel shows the same symbol
//! - `ScatterCount`: every symbol showing at least `threshold` times
//!   anywhere pays its multiplier; qualifying symbols are summed
//!
//! Payouts are `multiplier × stake`, truncated toward zero.

use serde::{Deserialize, Serialize};

use crate::buffer::{MAX_REELS, MAX_ROWS, ReelBuffer};
use crate::error::{Result, SlotError};
use crate::weights::WeightTable;
use crate::{Money, Symbol};

/// How a settled buffer is turned into a payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoutRule {
    /// Pay the symbol at (0, 0)
    SingleCell,
    /// Pay when every reel shows the same symbol on row 0
    LineMatch,
    /// Pay each symbol appearing at least `threshold` times in the grid
    ScatterCount { threshold: u8 },
}

/// One paying symbol in a breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolWin {
    pub symbol: Symbol,
    /// Cells that contributed
    pub count: u8,
    pub amount: Money,
}

/// Itemized evaluation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinBreakdown {
    pub wins: Vec<SymbolWin>,
    pub total: Money,
}

impl WinBreakdown {
    /// Did anything pay?
    pub fn is_win(&self) -> bool {
        self.total > 0
    }
}

/// Payout rule plus per-symbol multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayTable {
    pub rule: PayoutRule,
    /// Multiplier per symbol id (index = symbol)
    pub multipliers: Vec<f64>,
}

impl PayTable {
    /// Create a paytable
    pub fn new(rule: PayoutRule, multipliers: Vec<f64>) -> Self {
        Self { rule, multipliers }
    }

    /// Multiplier for `symbol` (0 past the end of the table)
    pub fn multiplier(&self, symbol: Symbol) -> f64 {
        self.multipliers.get(symbol as usize).copied().unwrap_or(0.0)
    }

    /// Money paid for `symbol` at `stake`
    pub fn pay(&self, symbol: Symbol, stake: Money) -> Money {
        (self.multiplier(symbol) * stake as f64) as Money
    }

    /// Payout for a settled buffer. Pure and allocation-free.
    pub fn evaluate(&self, buffer: &ReelBuffer, stake: Money) -> Money {
        match self.rule {
            PayoutRule::SingleCell => self.pay(buffer.at(0, 0), stake),
            PayoutRule::LineMatch => match line_symbol(buffer) {
                Some(symbol) => self.pay(symbol, stake),
                None => 0,
            },
            PayoutRule::ScatterCount { threshold } => {
                let mut total = 0;
                for_each_run(buffer, |symbol, count| {
                    if count >= threshold {
                        total += self.pay(symbol, stake);
                    }
                });
                total
            }
        }
    }

    /// Like [`PayTable::evaluate`], itemized per paying symbol
    pub fn evaluate_detailed(&self, buffer: &ReelBuffer, stake: Money) -> WinBreakdown {
        let mut wins = Vec::new();
        match self.rule {
            PayoutRule::SingleCell => {
                let symbol = buffer.at(0, 0);
                wins.push(SymbolWin {
                    symbol,
                    count: 1,
                    amount: self.pay(symbol, stake),
                });
            }
            PayoutRule::LineMatch => {
                if let Some(symbol) = line_symbol(buffer) {
                    wins.push(SymbolWin {
                        symbol,
                        count: buffer.reels() as u8,
                        amount: self.pay(symbol, stake),
                    });
                }
            }
            PayoutRule::ScatterCount { threshold } => {
                for_each_run(buffer, |symbol, count| {
                    if count >= threshold {
                        wins.push(SymbolWin {
                            symbol,
                            count,
                            amount: self.pay(symbol, stake),
                        });
                    }
                });
            }
        }

        wins.retain(|w| w.amount > 0);
        let total = wins.iter().map(|w| w.amount).sum();
        WinBreakdown { wins, total }
    }

    /// Check the table against the symbols `weights` can produce and the
    /// grid it will evaluate
    pub fn validate(&self, weights: &WeightTable, reels: usize, rows: usize) -> Result<()> {
        if let Some(max) = weights.max_symbol() {
            if max as usize >= self.multipliers.len() {
                return Err(SlotError::PayoutTableTooShort {
                    symbol: max,
                    len: self.multipliers.len(),
                });
            }
        }

        if let Some((symbol, m)) = self
            .multipliers
            .iter()
            .enumerate()
            .find(|(_, m)| !(m.is_finite() && **m >= 0.0))
        {
            return Err(SlotError::InvalidPayout(format!(
                "multiplier for symbol {symbol} must be finite and non-negative, got {m}"
            )));
        }

        if let PayoutRule::ScatterCount { threshold } = self.rule {
            if threshold == 0 || threshold as usize > reels * rows {
                return Err(SlotError::InvalidPayout(format!(
                    "scatter threshold {threshold} must be within 1..={}",
                    reels * rows
                )));
            }
        }

        Ok(())
    }
}

/// Row-0 symbol if every reel shows it
fn line_symbol(buffer: &ReelBuffer) -> Option<Symbol> {
    let mut row = buffer.row(0);
    let first = row.next()?;
    row.all(|s| s == first).then_some(first)
}

/// Call `f(symbol, count)` once per distinct visible symbol, ascending
fn for_each_run(buffer: &ReelBuffer, mut f: impl FnMut(Symbol, u8)) {
    let mut cells = [0 as Symbol; MAX_REELS * MAX_ROWS];
    let mut len = 0;
    for symbol in buffer.symbols() {
        cells[len] = symbol;
        len += 1;
    }
    let cells = &mut cells[..len];
    cells.sort_unstable();

    for run in cells.chunk_by(|a, b| a == b) {
        f(run[0], run.len() as u8);
    }
}
