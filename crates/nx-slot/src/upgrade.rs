//! Machine upgrades and auto-spin

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Money;
use crate::error::{Result, SlotError};
use crate::timing::divide_with_floor;

/// Upgrade purchasable from the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Faster scroll, shorter stagger and tick interval
    Speed,
    /// Spin automatically while idle
    AutoClick,
    /// Double the stake (and the payouts)
    DoubleStake,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [Self::Speed, Self::AutoClick, Self::DoubleStake];

    pub fn index(&self) -> usize {
        match self {
            Self::Speed => 0,
            Self::AutoClick => 1,
            Self::DoubleStake => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::AutoClick => "auto_click",
            Self::DoubleStake => "double_stake",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpgradeKind {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "speed" => Ok(Self::Speed),
            "auto_click" | "auto" => Ok(Self::AutoClick),
            "double_stake" | "stake" => Ok(Self::DoubleStake),
            _ => Err(SlotError::UnknownUpgrade(s.to_string())),
        }
    }
}

/// Upgrade tuning for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Multiplier applied per speed / auto-click upgrade
    pub speed_factor: f64,
    pub min_stagger: f64,
    pub min_tick_interval: f64,
    /// Auto-spin cooldown on the first auto-click upgrade (seconds)
    pub auto_spin_cooldown: f64,
    pub min_auto_spin_cooldown: f64,
    /// Base cost per kind, indexed by [`UpgradeKind::index`]
    pub base_costs: [Money; 3],
    /// Upgrades the shop allows per machine
    pub max_upgrades: u32,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            speed_factor: 1.5,
            min_stagger: 0.02,
            min_tick_interval: 0.03,
            auto_spin_cooldown: 2.0,
            min_auto_spin_cooldown: 0.25,
            base_costs: [100, 200, 300],
            max_upgrades: 10,
        }
    }
}

impl UpgradeConfig {
    /// Cost of the next `kind` upgrade after `level` purchases of it
    pub fn cost(&self, kind: UpgradeKind, level: u32) -> Money {
        let base = self.base_costs[kind.index()];
        base.saturating_mul(2_i64.checked_pow(level).unwrap_or(Money::MAX))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.speed_factor.is_finite() && self.speed_factor >= 1.0) {
            return Err(SlotError::InvalidValue(format!(
                "upgrade speed factor must be at least 1, got {}",
                self.speed_factor
            )));
        }
        if !(self.auto_spin_cooldown.is_finite() && self.auto_spin_cooldown > 0.0) {
            return Err(SlotError::InvalidValue(format!(
                "auto-spin cooldown must be positive, got {}",
                self.auto_spin_cooldown
            )));
        }
        if self.base_costs.iter().any(|&c| c < 0) {
            return Err(SlotError::InvalidValue(
                "upgrade costs must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Purchases per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpgradeLevels {
    levels: [u32; 3],
}

impl UpgradeLevels {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels[kind.index()]
    }

    pub fn total(&self) -> u32 {
        self.levels.iter().sum()
    }

    pub(crate) fn bump(&mut self, kind: UpgradeKind) {
        self.levels[kind.index()] += 1;
    }
}

/// Idle auto-spin timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoSpin {
    pub cooldown: f64,
    timer: f64,
}

impl AutoSpin {
    pub fn new(cooldown: f64) -> Self {
        Self {
            cooldown,
            timer: 0.0,
        }
    }

    /// Advance the timer. Returns `true` when a spin should start.
    ///
    /// The timer only runs while `ready` (idle and not interacting) and
    /// restarts from zero whenever it is not.
    pub fn tick(&mut self, dt: f64, ready: bool) -> bool {
        if !ready {
            self.timer = 0.0;
            return false;
        }
        self.timer += dt;
        if self.timer >= self.cooldown {
            self.timer = 0.0;
            return true;
        }
        false
    }

    /// Drop progress toward the next spin
    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    /// Shorten the cooldown by `factor`, not below `floor`
    pub fn accelerate(&mut self, factor: f64, floor: f64) {
        self.cooldown = divide_with_floor(self.cooldown, factor, floor);
    }

    /// Seconds accumulated toward the next spin
    pub fn progress(&self) -> f64 {
        self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("speed".parse::<UpgradeKind>().unwrap(), UpgradeKind::Speed);
        assert_eq!("auto-click".parse::<UpgradeKind>().unwrap(), UpgradeKind::AutoClick);
        assert_eq!(
            "DOUBLE_STAKE".parse::<UpgradeKind>().unwrap(),
            UpgradeKind::DoubleStake
        );
        assert!(matches!(
            "turbo".parse::<UpgradeKind>(),
            Err(SlotError::UnknownUpgrade(_))
        ));
        for kind in UpgradeKind::ALL {
            assert_eq!(kind.to_string().parse::<UpgradeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_cost_doubles_per_level() {
        let config = UpgradeConfig::default();
        assert_eq!(config.cost(UpgradeKind::Speed, 0), 100);
        assert_eq!(config.cost(UpgradeKind::Speed, 3), 800);
        assert_eq!(config.cost(UpgradeKind::DoubleStake, 1), 600);
        assert_eq!(config.cost(UpgradeKind::Speed, 200), Money::MAX);
    }

    #[test]
    fn test_auto_spin_waits_for_cooldown() {
        let mut auto = AutoSpin::new(1.0);
        assert!(!auto.tick(0.5, true));
        assert!(!auto.tick(0.4, true));
        assert!(auto.tick(0.2, true));
        assert_eq!(auto.progress(), 0.0);
    }

    #[test]
    fn test_auto_spin_resets_when_busy() {
        let mut auto = AutoSpin::new(1.0);
        assert!(!auto.tick(0.9, true));
        assert!(!auto.tick(0.9, false));
        assert!(!auto.tick(0.9, true));
        assert!(auto.tick(0.2, true));
    }

    #[test]
    fn test_auto_spin_accelerate_floor() {
        let mut auto = AutoSpin::new(0.5);
        auto.accelerate(4.0, 0.25);
        assert_eq!(auto.cooldown, 0.25);
        auto.accelerate(4.0, 0.25);
        assert_eq!(auto.cooldown, 0.25);
    }

    #[test]
    fn test_validate() {
        assert!(UpgradeConfig::default().validate().is_ok());
        let slower = UpgradeConfig {
            speed_factor: 0.5,
            ..UpgradeConfig::default()
        };
        assert!(slower.validate().is_err());
    }
}
