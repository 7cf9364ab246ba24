//! Machine variant configuration

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::Money;
use crate::buffer::{MAX_REELS, MAX_ROWS, ReelBuffer};
use crate::error::{Result, SlotError};
use crate::ev::{EvCalibrator, EvStats};
use crate::payout::PayTable;
use crate::timing::SpinTiming;
use crate::upgrade::UpgradeConfig;
use crate::weights::WeightTable;

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    pub fn new(reels: u8, rows: u8) -> Self {
        Self { reels, rows }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }

    /// Reject empty grids and grids past buffer capacity
    pub fn validate(&self) -> Result<()> {
        if self.reels == 0 || self.rows == 0 {
            return Err(SlotError::EmptyGrid);
        }
        if self.reels as usize > MAX_REELS || self.rows as usize > MAX_ROWS {
            return Err(SlotError::GridTooLarge {
                reels: self.reels as usize,
                rows: self.rows as usize,
                max_reels: MAX_REELS,
                max_rows: MAX_ROWS,
            });
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(3, 1)
    }
}

/// Near-miss stop extension
///
/// When `trigger_reel` stops and row 0 of every reel up to and including it
/// shows the same symbol, the remaining reels spin `extra_distance` more
/// iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnticipationRule {
    pub trigger_reel: u8,
    pub extra_distance: u32,
}

impl AnticipationRule {
    /// Extra iterations to grant after `stopped_reel` stops (0 = none)
    pub fn extension(&self, stopped_reel: usize, buffer: &ReelBuffer) -> u32 {
        let trigger = self.trigger_reel as usize;
        if stopped_reel != trigger || trigger >= buffer.reels() {
            return 0;
        }
        let first = buffer.at(0, 0);
        if buffer.row(0).take(trigger + 1).all(|s| s == first) {
            self.extra_distance
        } else {
            0
        }
    }

    /// Reel that benefits from the extension
    pub fn anticipated_reel(&self) -> usize {
        self.trigger_reel as usize + 1
    }
}

/// Complete definition of a machine variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Name for reference
    pub name: String,

    pub grid: GridSpec,

    pub timing: SpinTiming,

    pub weights: WeightTable,

    pub paytable: PayTable,

    /// Initial stake per spin
    pub stake: Money,

    #[serde(default)]
    pub anticipation: Option<AnticipationRule>,

    #[serde(default)]
    pub upgrades: UpgradeConfig,
}

impl VariantConfig {
    /// Check everything the engine assumes before the first spin
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.timing.validate()?;
        self.weights.validate()?;
        self.paytable.validate(
            &self.weights,
            self.grid.reels as usize,
            self.grid.rows as usize,
        )?;
        self.upgrades.validate()?;

        if self.stake <= 0 {
            return Err(SlotError::InvalidValue(format!(
                "stake must be positive, got {}",
                self.stake
            )));
        }

        if let Some(rule) = &self.anticipation {
            if rule.anticipated_reel() >= self.grid.reels as usize {
                return Err(SlotError::InvalidValue(format!(
                    "anticipation trigger reel {} leaves no reel to extend on a {}-reel grid",
                    rule.trigger_reel, self.grid.reels
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SlotError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(yaml).map_err(|e| SlotError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Err(SlotError::Parse(format!(
                "unrecognized config extension: {}",
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SlotError::Parse(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).map_err(|e| SlotError::Parse(e.to_string()))
    }
}

/// Validated, shared variant definition
///
/// Machines of the same variant share one `Arc<Variant>`; its EV is
/// calibrated at most once, on first request.
#[derive(Debug)]
pub struct Variant {
    config: VariantConfig,
    blank: ReelBuffer,
    ev: OnceLock<EvStats>,
}

impl Variant {
    pub fn new(config: VariantConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let blank = ReelBuffer::new(config.grid)?;
        Ok(Arc::new(Self {
            config,
            blank,
            ev: OnceLock::new(),
        }))
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Empty buffer sized to the variant's grid
    pub fn blank_buffer(&self) -> ReelBuffer {
        self.blank
    }

    /// EV statistics with the default calibrator
    pub fn ev(&self) -> EvStats {
        self.ev_with(&EvCalibrator::default())
    }

    /// EV statistics; `calibrator` is only used by the first call
    pub fn ev_with(&self, calibrator: &EvCalibrator) -> EvStats {
        *self.ev.get_or_init(|| {
            let config = &self.config;
            let stats =
                calibrator.sample(&self.blank, &config.weights, &config.paytable, config.stake);
            log::info!(
                "Calibrated {} (RTP {:.2}%, win chance {:.2}%)",
                self.config.name,
                stats.rtp() * 100.0,
                stats.win_probability * 100.0
            );
            stats
        })
    }

    /// Cached statistics, if calibration already ran
    pub fn cached_ev(&self) -> Option<EvStats> {
        self.ev.get().copied()
    }
}

/// Built-in machine variants
pub mod presets {
    use super::*;
    use crate::payout::PayoutRule;

    /// One reel, one row; the visible symbol pays
    pub fn m1x1() -> VariantConfig {
        VariantConfig {
            name: "m1x1".into(),
            grid: GridSpec::new(1, 1),
            timing: SpinTiming {
                speed: 1000.0,
                row_height: 63.0,
                stagger: 0.0,
                base_distance: 20,
                per_reel_distance: 0,
                tick_interval: 0.1,
            },
            weights: WeightTable::from_entries([(0, 23), (1, 7), (2, 5), (3, 3), (4, 2)]),
            paytable: PayTable::new(PayoutRule::SingleCell, vec![0.0, 3.0, 7.0, 15.0, 20.0]),
            stake: 10,
            anticipation: None,
            upgrades: UpgradeConfig::default(),
        }
    }

    /// Three reels, one line; a match on reels 0 and 1 extends the spin
    pub fn m3x1() -> VariantConfig {
        VariantConfig {
            name: "m3x1".into(),
            grid: GridSpec::new(3, 1),
            timing: SpinTiming {
                speed: 800.0,
                row_height: 63.0,
                stagger: 0.2,
                base_distance: 20,
                per_reel_distance: 4,
                tick_interval: 0.12,
            },
            weights: WeightTable::from_entries([(0, 10), (1, 5), (2, 3), (3, 1)]),
            paytable: PayTable::new(
                PayoutRule::LineMatch,
                vec![20.0, 100.0, 200.0, 5000.0],
            ),
            stake: 10,
            anticipation: Some(AnticipationRule {
                trigger_reel: 1,
                extra_distance: 20,
            }),
            upgrades: UpgradeConfig {
                base_costs: [150, 300, 500],
                ..UpgradeConfig::default()
            },
        }
    }

    /// Five reels, three rows; five of a kind anywhere pays
    pub fn m5x3() -> VariantConfig {
        VariantConfig {
            name: "m5x3".into(),
            grid: GridSpec::new(5, 3),
            timing: SpinTiming {
                speed: 1200.0,
                row_height: 40.0,
                stagger: 0.1,
                base_distance: 15,
                per_reel_distance: 3,
                tick_interval: 0.08,
            },
            weights: WeightTable::from_entries([(0, 9), (1, 8), (2, 6), (3, 4), (4, 2)]),
            paytable: PayTable::new(
                PayoutRule::ScatterCount { threshold: 5 },
                vec![0.5, 1.0, 2.5, 8.0, 40.0],
            ),
            stake: 25,
            anticipation: None,
            upgrades: UpgradeConfig {
                base_costs: [400, 800, 1200],
                ..UpgradeConfig::default()
            },
        }
    }

    /// Every built-in variant
    pub fn all() -> Vec<VariantConfig> {
        vec![m1x1(), m3x1(), m5x3()]
    }

    /// Look up a built-in variant by name
    pub fn by_name(name: &str) -> Result<VariantConfig> {
        match name {
            "m1x1" => Ok(m1x1()),
            "m3x1" => Ok(m3x1()),
            "m5x3" => Ok(m5x3()),
            other => Err(SlotError::UnknownVariant(other.to_string())),
        }
    }
}
