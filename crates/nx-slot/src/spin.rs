//! Reel spin state machine
//!
//! A spin runs over many frames. Each reel launches after its stagger delay,
//! scrolls at the configured speed, shifts a freshly drawn symbol in for
//! every row scrolled, and stops once it has completed its share of the
//! session distance. Stops cascade left to right because every reel needs
//! `per_reel_distance` more iterations than its left neighbour.
//!
//! ```text
//! reel:     Idle ──launch──> Spinning ──target reached──> Stopped
//! session:  NotSpinning ──start──> Spinning ──all reels stopped──> AllStopped
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Symbol;
use crate::buffer::{MAX_REELS, ReelBuffer};
use crate::timing::{SpinTiming, reel_target};
use crate::weights::WeightTable;

/// Lifecycle of one reel within a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReelPhase {
    /// Waiting for its stagger delay
    #[default]
    Idle,
    /// Scrolling
    Spinning,
    /// Reached its target; never resumes within this spin
    Stopped,
}

/// Lifecycle of the whole spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No spin has run yet
    #[default]
    NotSpinning,
    /// At least one reel is still moving
    Spinning,
    /// Last spin finished; ready for the next one
    AllStopped,
}

/// Something that happened during a tick, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinEvent {
    /// Reel left `Idle`
    ReelStarted { reel: usize },
    /// Tick sound cue interval elapsed
    Tick,
    /// Reel reached its target
    ReelStopped { reel: usize },
    /// Stop hook extended the session distance right after `reel` stopped
    DistanceExtended { reel: usize, extra: u32 },
    /// Every reel is stopped; the buffer is settled
    AllStopped,
}

#[derive(Debug, Clone, Copy, Default)]
struct ReelState {
    phase: ReelPhase,
    offset: f64,
    iterations: u32,
    upcoming: Symbol,
}

/// Per-machine spin session
#[derive(Debug, Clone)]
pub struct SpinSession {
    reels: usize,
    state: SessionState,
    elapsed: f64,
    since_tick: f64,
    distance: u32,
    per_reel_distance: u32,
    slots: [ReelState; MAX_REELS],
}

impl SpinSession {
    /// Create an idle session for `reels` reels
    pub fn new(reels: usize) -> Self {
        Self {
            reels: reels.min(MAX_REELS),
            state: SessionState::NotSpinning,
            elapsed: 0.0,
            since_tick: 0.0,
            distance: 0,
            per_reel_distance: 0,
            slots: [ReelState::default(); MAX_REELS],
        }
    }

    /// Begin a spin. Returns `false` and changes nothing if one is already
    /// in flight; spins cannot be queued or interrupted.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        timing: &SpinTiming,
        weights: &WeightTable,
        rng: &mut R,
    ) -> bool {
        if self.is_spinning() {
            return false;
        }

        for slot in &mut self.slots[..self.reels] {
            *slot = ReelState {
                phase: ReelPhase::Idle,
                offset: 0.0,
                iterations: 0,
                upcoming: weights.generate(rng),
            };
        }

        self.distance = timing.base_distance;
        self.per_reel_distance = timing.per_reel_distance;
        self.elapsed = 0.0;
        self.since_tick = 0.0;
        self.state = SessionState::Spinning;
        true
    }

    /// Grow the session distance by `extra` iterations. Only reels still in
    /// flight are affected; stopped reels stay stopped. No-op when idle.
    pub fn extend(&mut self, extra: u32) {
        if self.is_spinning() {
            self.distance = self.distance.saturating_add(extra);
        }
    }

    /// Advance by `dt` seconds without a stop hook
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        timing: &SpinTiming,
        buffer: &mut ReelBuffer,
        weights: &WeightTable,
        rng: &mut R,
    ) -> Vec<SpinEvent> {
        self.tick_with(dt, timing, buffer, weights, rng, |_, _| 0)
    }

    /// Advance by `dt` seconds.
    ///
    /// `on_reel_stop(reel, buffer)` runs synchronously the moment a reel
    /// stops, before any reel to its right is processed; a non-zero return
    /// extends the session distance (anticipation).
    pub fn tick_with<R, F>(
        &mut self,
        dt: f64,
        timing: &SpinTiming,
        buffer: &mut ReelBuffer,
        weights: &WeightTable,
        rng: &mut R,
        mut on_reel_stop: F,
    ) -> Vec<SpinEvent>
    where
        R: Rng + ?Sized,
        F: FnMut(usize, &ReelBuffer) -> u32,
    {
        let mut events = Vec::new();
        if !self.is_spinning() {
            return events;
        }

        self.elapsed += dt;

        if timing.tick_interval > 0.0 {
            self.since_tick += dt;
            if self.since_tick >= timing.tick_interval {
                self.since_tick %= timing.tick_interval;
                events.push(SpinEvent::Tick);
            }
        }

        let mut done = true;
        for reel in 0..self.reels {
            let target = self.target_for(reel);
            let slot = &mut self.slots[reel];

            match slot.phase {
                ReelPhase::Stopped => continue,
                ReelPhase::Idle => {
                    if self.elapsed < timing.launch_delay(reel) {
                        done = false;
                        continue;
                    }
                    slot.phase = ReelPhase::Spinning;
                    events.push(SpinEvent::ReelStarted { reel });
                }
                ReelPhase::Spinning => {}
            }

            if slot.iterations < target {
                slot.offset += timing.speed * dt;
                while slot.offset > timing.row_height && slot.iterations < target {
                    buffer.advance(reel, slot.upcoming);
                    slot.upcoming = weights.generate(rng);
                    slot.offset -= timing.row_height;
                    slot.iterations += 1;
                }
            }

            if slot.iterations >= target {
                slot.phase = ReelPhase::Stopped;
                slot.offset = 0.0;
                events.push(SpinEvent::ReelStopped { reel });

                let extra = on_reel_stop(reel, buffer);
                if extra > 0 {
                    self.distance = self.distance.saturating_add(extra);
                    events.push(SpinEvent::DistanceExtended { reel, extra });
                }
            } else {
                done = false;
            }
        }

        if done {
            self.state = SessionState::AllStopped;
            events.push(SpinEvent::AllStopped);
        }

        events
    }

    /// Session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Is a spin in flight?
    pub fn is_spinning(&self) -> bool {
        self.state == SessionState::Spinning
    }

    /// Number of reels
    pub fn reels(&self) -> usize {
        self.reels
    }

    /// Seconds since the spin started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Current session distance (reel 0's target)
    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// Iterations reel `reel` must complete this spin
    pub fn target_for(&self, reel: usize) -> u32 {
        reel_target(self.distance, self.per_reel_distance, reel)
    }

    /// Phase of one reel
    pub fn reel_phase(&self, reel: usize) -> ReelPhase {
        self.slots[reel].phase
    }

    /// Fractional row progress of one reel (pixels)
    pub fn offset(&self, reel: usize) -> f64 {
        self.slots[reel].offset
    }

    /// Shift iterations one reel has completed this spin
    pub fn iterations(&self, reel: usize) -> u32 {
        self.slots[reel].iterations
    }

    /// Symbol waiting above row 0 of one reel
    pub fn upcoming(&self, reel: usize) -> Symbol {
        self.slots[reel].upcoming
    }
}
