//! In-memory money ledger

use nx_slot::{Money, MoneyDelta, Position};
use serde::Serialize;

/// One applied delta
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub amount: Money,
    pub origin: Position,
    /// Balance after the delta
    pub balance: Money,
}

/// Player balance plus the history of every change
#[derive(Debug, Clone)]
pub struct Ledger {
    balance: Money,
    lowest: Money,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(starting: Money) -> Self {
        Self {
            balance: starting,
            lowest: starting,
            entries: Vec::new(),
        }
    }

    /// Apply a delta and return the new balance. Zero deltas are dropped.
    pub fn apply(&mut self, delta: MoneyDelta) -> Money {
        if delta.is_zero() {
            return self.balance;
        }
        self.balance = self.balance.saturating_add(delta.amount);
        self.lowest = self.lowest.min(self.balance);
        self.entries.push(LedgerEntry {
            amount: delta.amount,
            origin: delta.origin,
            balance: self.balance,
        });
        self.balance
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn lowest(&self) -> Money {
        self.lowest
    }

    pub fn can_afford(&self, cost: Money) -> bool {
        self.balance >= cost
    }

    pub fn is_solvent(&self) -> bool {
        self.balance >= 0
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Sum of all credits
    pub fn credited(&self) -> Money {
        self.entries.iter().map(|e| e.amount).filter(|&a| a > 0).sum()
    }

    /// Sum of all debits, as a positive amount
    pub fn debited(&self) -> Money {
        -self.entries.iter().map(|e| e.amount).filter(|&a| a < 0).sum::<Money>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_tracks_balance_and_history() {
        let mut ledger = Ledger::new(1500);
        let at = Position::new(1.0, 2.0);

        assert_eq!(ledger.apply(MoneyDelta::debit(10, at)), 1490);
        assert_eq!(ledger.apply(MoneyDelta::credit(0, at)), 1490);
        assert_eq!(ledger.apply(MoneyDelta::credit(200, at)), 1690);

        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.entries()[0].balance, 1490);
        assert_eq!(ledger.credited(), 200);
        assert_eq!(ledger.debited(), 10);
        assert_eq!(ledger.lowest(), 1490);
    }

    #[test]
    fn test_solvency() {
        let mut ledger = Ledger::new(5);
        assert!(ledger.can_afford(5));
        assert!(!ledger.can_afford(6));

        ledger.apply(MoneyDelta::debit(10, Position::default()));
        assert!(!ledger.is_solvent());
        assert_eq!(ledger.lowest(), -5);
    }
}
