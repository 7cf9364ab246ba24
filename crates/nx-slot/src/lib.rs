//! # nx-slot - Reel engine for 9X Gambler slot machines
//!
//! Drives the reels of every machine on the floor: weighted symbol draws,
//! per-reel staggered spin animation, payout evaluation and Monte-Carlo
//! calibration of each machine variant.
//!
//! ## Features
//!
//! - **Weighted Symbols**: expanded-pool draws with exact `w / N` odds
//! - **Spin State Machine**: staggered launch, cascading stops, anticipation extensions
//! - **Payout Rules**: single-cell, line-match and scatter-count evaluation
//! - **EV Calibration**: deterministic, parallel RTP / win-chance estimation
//! - **Upgrades**: speed, auto-spin and stake doubling applied in place
//!
//! ## Architecture
//!
//! ```text
//! Machine
//!     │
//!     ├── Variant (shared, immutable)
//!     │     ├── GridSpec (reels × rows)
//!     │     ├── WeightTable (symbol odds)
//!     │     ├── PayTable (rule + multipliers)
//!     │     └── EvStats (calibrated once)
//!     ├── MachineTuning (stake, SpinTiming, auto-spin)
//!     ├── SpinSession ──tick──> SpinEvent
//!     └── ReelBuffer (settled symbols)
//!           │
//!           v
//!     tick(FrameInput) → Vec<MachineEvent> → host ledger / sound / draw
//! ```
//!
//! Nothing in this crate owns global state. The host passes the frame delta,
//! the random source and screen positions in, and reacts to the returned events.

pub mod buffer;
pub mod config;
pub mod error;
pub mod ev;
pub mod event;
pub mod layout;
pub mod machine;
pub mod payout;
pub mod spin;
pub mod timing;
pub mod upgrade;
pub mod weights;

pub use buffer::*;
pub use config::*;
pub use error::*;
pub use ev::*;
pub use event::*;
pub use layout::*;
pub use machine::*;
pub use payout::*;
pub use spin::*;
pub use timing::*;
pub use upgrade::*;
pub use weights::*;

/// Signed money amount; debits are negative.
pub type Money = i64;

/// Symbol id, indexes a variant's payout and texture tables.
pub type Symbol = u16;
