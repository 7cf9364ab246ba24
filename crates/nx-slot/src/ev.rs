//! Monte-Carlo EV calibration
//!
//! Each trial is a static sample: a freshly drawn buffer evaluated against
//! the paytable. Spin timing and anticipation play no part.
//!
//! Trials are split into fixed-size chunks and every chunk draws from its
//! own ChaCha stream (`seed`, `stream = chunk index`), so a seed gives the
//! same statistics whether chunks run sequentially or across threads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;
use crate::buffer::ReelBuffer;
use crate::config::VariantConfig;
use crate::error::Result;
use crate::payout::{PayTable, PayoutRule};
use crate::weights::WeightTable;

/// Trials per calibration run
pub const DEFAULT_TRIALS: u64 = 100_000;

/// Trials per RNG stream
const CHUNK_TRIALS: u64 = 4096;

/// Calibration result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvStats {
    /// Mean payout per spin
    pub expected_value: f64,
    /// Share of trials that paid anything
    pub win_probability: f64,
    pub trials: u64,
    /// Stake the payouts were computed at
    pub stake: Money,
}

impl EvStats {
    /// Return to player (payout per unit stake)
    pub fn rtp(&self) -> f64 {
        if self.stake == 0 {
            return 0.0;
        }
        self.expected_value / self.stake as f64
    }

    /// Mean net result per spin (payout minus stake)
    pub fn house_edge_per_spin(&self) -> f64 {
        self.stake as f64 - self.expected_value
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: i128,
    wins: u64,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            wins: self.wins + other.wins,
        }
    }
}

/// Calibration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvCalibrator {
    pub trials: u64,
    pub seed: u64,
    /// Spread chunks across the rayon pool
    pub parallel: bool,
}

impl Default for EvCalibrator {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: 0x9e37_79b9_7f4a_7c15,
            parallel: true,
        }
    }
}

impl EvCalibrator {
    /// Calibrator with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Validate `config` and sample it
    pub fn calculate(&self, config: &VariantConfig) -> Result<EvStats> {
        config.validate()?;
        let template = ReelBuffer::new(config.grid)?;
        Ok(self.sample(&template, &config.weights, &config.paytable, config.stake))
    }

    /// Sample buffers shaped like `template`.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty.
    pub fn sample(
        &self,
        template: &ReelBuffer,
        weights: &WeightTable,
        paytable: &PayTable,
        stake: Money,
    ) -> EvStats {
        if self.trials == 0 {
            return EvStats {
                expected_value: 0.0,
                win_probability: 0.0,
                trials: 0,
                stake,
            };
        }

        let chunks = self.trials.div_ceil(CHUNK_TRIALS);
        let run_chunk = |chunk: u64| {
            let start = chunk * CHUNK_TRIALS;
            let len = CHUNK_TRIALS.min(self.trials - start);
            self.run_chunk(chunk, len, *template, weights, paytable, stake)
        };

        let tally = if self.parallel {
            (0..chunks)
                .into_par_iter()
                .map(run_chunk)
                .reduce(Tally::default, Tally::merge)
        } else {
            (0..chunks).map(run_chunk).fold(Tally::default(), Tally::merge)
        };

        EvStats {
            expected_value: tally.total as f64 / self.trials as f64,
            win_probability: tally.wins as f64 / self.trials as f64,
            trials: self.trials,
            stake,
        }
    }

    fn run_chunk(
        &self,
        chunk: u64,
        len: u64,
        mut buffer: ReelBuffer,
        weights: &WeightTable,
        paytable: &PayTable,
        stake: Money,
    ) -> Tally {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(chunk);

        let mut tally = Tally::default();
        for _ in 0..len {
            buffer.refill(weights, &mut rng);
            let payout = paytable.evaluate(&buffer, stake);
            tally.total += payout as i128;
            if payout != 0 {
                tally.wins += 1;
            }
        }
        tally
    }
}

/// Calibrate with the default settings
pub fn calculate_ev(config: &VariantConfig) -> Result<EvStats> {
    EvCalibrator::default().calculate(config)
}

/// Calibrate several variants at once, in parallel
pub fn calibrate_all(
    configs: &[VariantConfig],
    calibrator: &EvCalibrator,
) -> Vec<Result<EvStats>> {
    configs
        .par_iter()
        .map(|config| calibrator.calculate(config))
        .collect()
}

/// Exact expected payout, where a closed form exists.
///
/// Single-cell and line-match depend only on independent row-0 draws;
/// scatter counts need the full multinomial and return `None`.
pub fn exact_ev(config: &VariantConfig) -> Option<f64> {
    let reels = config.grid.reels as i32;
    let stake = config.stake;
    let table = &config.paytable;
    let weights = &config.weights;

    let ev = match table.rule {
        PayoutRule::SingleCell => weights
            .symbols()
            .into_iter()
            .map(|s| weights.probability(s) * table.pay(s, stake) as f64)
            .sum(),
        PayoutRule::LineMatch => weights
            .symbols()
            .into_iter()
            .map(|s| weights.probability(s).powi(reels) * table.pay(s, stake) as f64)
            .sum(),
        PayoutRule::ScatterCount { .. } => return None,
    };
    Some(ev)
}
