//! Reel timing parameters

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Animation and stop-distance settings for one machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinTiming {
    /// Scroll speed (pixels per second)
    pub speed: f64,

    /// Height of one row (pixels); one shift-in per row scrolled
    pub row_height: f64,

    /// Launch delay between successive reels (seconds)
    pub stagger: f64,

    /// Shift iterations reel 0 completes before stopping
    pub base_distance: u32,

    /// Extra iterations for each reel to the right
    pub per_reel_distance: u32,

    /// Seconds between tick sound cues while spinning (0 = silent)
    #[serde(default)]
    pub tick_interval: f64,
}

impl SpinTiming {
    /// Classic timing (300 px/s, 0.1 s stagger, 10 + 3/reel iterations)
    pub fn classic() -> Self {
        Self {
            speed: 300.0,
            row_height: 40.0,
            stagger: 0.1,
            base_distance: 10,
            per_reel_distance: 3,
            tick_interval: 0.12,
        }
    }

    /// Iterations reel `reel` needs for a session distance of `distance`
    pub fn target_for(&self, distance: u32, reel: usize) -> u32 {
        reel_target(distance, self.per_reel_distance, reel)
    }

    /// Seconds before reel `reel` launches
    pub fn launch_delay(&self, reel: usize) -> f64 {
        self.stagger * reel as f64
    }

    /// Rough wall-clock length of a spin without anticipation
    pub fn nominal_duration(&self, reels: usize) -> f64 {
        let last = reels.saturating_sub(1);
        let rows = self.target_for(self.base_distance, last) as f64;
        self.launch_delay(last) + rows * self.row_height / self.speed
    }

    /// Speed up by `factor`: speed multiplied, stagger and tick interval
    /// divided, neither dropping below its floor.
    pub fn accelerated(&self, factor: f64, min_stagger: f64, min_tick_interval: f64) -> Self {
        Self {
            speed: self.speed * factor,
            stagger: divide_with_floor(self.stagger, factor, min_stagger),
            tick_interval: divide_with_floor(self.tick_interval, factor, min_tick_interval),
            ..*self
        }
    }

    /// Reject settings the state machine cannot run
    pub fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "row height must be positive, got {}",
                self.row_height
            )));
        }
        if !(self.stagger.is_finite() && self.stagger >= 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "stagger must be non-negative, got {}",
                self.stagger
            )));
        }
        if !(self.tick_interval.is_finite() && self.tick_interval >= 0.0) {
            return Err(SlotError::InvalidTiming(format!(
                "tick interval must be non-negative, got {}",
                self.tick_interval
            )));
        }
        Ok(())
    }
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self::classic()
    }
}

/// Iterations a reel must complete: `distance + per_reel_distance × reel`,
/// saturating at `u32::MAX`
pub fn reel_target(distance: u32, per_reel_distance: u32, reel: usize) -> u32 {
    let reel = u32::try_from(reel).unwrap_or(u32::MAX);
    distance.saturating_add(per_reel_distance.saturating_mul(reel))
}

/// Divide `value` by `factor` without going under `floor`. Values already
/// at or below the floor are left alone.
pub fn divide_with_floor(value: f64, factor: f64, floor: f64) -> f64 {
    if value <= floor {
        value
    } else {
        (value / factor).max(floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_reel_targets_cascade() {
        let timing = SpinTiming {
            base_distance: 20,
            per_reel_distance: 4,
            ..SpinTiming::classic()
        };
        assert_eq!(timing.target_for(20, 0), 20);
        assert_eq!(timing.target_for(20, 1), 24);
        assert_eq!(timing.target_for(20, 2), 28);
        // Extended session distance carries over to every reel
        assert_eq!(timing.target_for(40, 2), 48);
    }

    #[test]
    fn test_targets_saturate() {
        assert_eq!(reel_target(u32::MAX, 4, 2), u32::MAX);
        assert_eq!(reel_target(20, u32::MAX, 1), u32::MAX);
        assert_eq!(reel_target(u32::MAX - 10, 4, 2), u32::MAX - 2);
        assert_eq!(reel_target(20, 4, 0), 20);
    }

    #[test]
    fn test_accelerated_respects_floors() {
        let timing = SpinTiming {
            speed: 800.0,
            stagger: 0.2,
            tick_interval: 0.1,
            ..SpinTiming::classic()
        };

        let faster = timing.accelerated(2.0, 0.15, 0.02);
        assert_eq!(faster.speed, 1600.0);
        assert_eq!(faster.stagger, 0.15);
        assert_eq!(faster.tick_interval, 0.05);

        let fastest = faster.accelerated(2.0, 0.15, 0.02);
        assert_eq!(fastest.stagger, 0.15);
        assert_eq!(fastest.tick_interval, 0.025);
    }

    #[test]
    fn test_floor_never_raises_small_values() {
        assert_eq!(divide_with_floor(0.0, 1.5, 0.02), 0.0);
        assert_eq!(divide_with_floor(0.01, 1.5, 0.02), 0.01);
        assert_eq!(divide_with_floor(0.3, 1.5, 0.02), 0.3 / 1.5);
    }

    #[test]
    fn test_validate() {
        assert!(SpinTiming::classic().validate().is_ok());

        let stalled = SpinTiming {
            speed: 0.0,
            ..SpinTiming::classic()
        };
        assert!(matches!(stalled.validate(), Err(SlotError::InvalidTiming(_))));

        let reversed = SpinTiming {
            stagger: -0.1,
            ..SpinTiming::classic()
        };
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn test_nominal_duration_grows_with_reels() {
        let timing = SpinTiming::classic();
        assert!(timing.nominal_duration(3) > timing.nominal_duration(1));
    }
}
