//! Machine events and host input

use serde::{Deserialize, Serialize};

use crate::Money;

/// Screen position (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Signed change to the player's balance, with where to show it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneyDelta {
    pub amount: Money,
    pub origin: Position,
}

impl MoneyDelta {
    /// Money taken from the player
    pub fn debit(amount: Money, origin: Position) -> Self {
        Self {
            amount: -amount,
            origin,
        }
    }

    /// Money paid to the player
    pub fn credit(amount: Money, origin: Position) -> Self {
        Self { amount, origin }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

/// Sound the host should play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    SpinStart,
    Tick,
    ReelStop,
    Anticipation,
    Win,
    Lose,
}

/// Outcome of a machine tick, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// A spin began; carries the stake debit
    SpinStarted(MoneyDelta),
    ReelStarted { reel: usize },
    ReelStopped { reel: usize },
    /// A near miss extended the spin; `reel` is the one to highlight
    AnticipationStarted { reel: usize },
    /// Every reel settled; `payout` may be 0
    AllStopped { payout: Money },
    /// Payout credit (emitted for losses too, with amount 0)
    Payout(MoneyDelta),
    Sound(SoundCue),
}

impl MachineEvent {
    /// Ledger change carried by this event, if any
    pub fn money(&self) -> Option<MoneyDelta> {
        match self {
            Self::SpinStarted(delta) | Self::Payout(delta) => Some(*delta),
            _ => None,
        }
    }
}

/// Per-frame input from the host
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame
    pub dt: f64,
    /// Player is hovering or clicking the machine; pauses auto-spin
    pub interacting: bool,
    /// Where money feedback should appear
    pub origin: Position,
}

impl FrameInput {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }
}
