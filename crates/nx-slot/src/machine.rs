//! Machine facade
//!
//! Owns one spin session and one settled buffer for a shared [`Variant`].
//! The host calls [`Machine::tick`] every frame and reacts to the returned
//! [`MachineEvent`]s; the machine never touches the ledger, audio or
//! renderer itself.

use std::sync::Arc;

use rand::Rng;

use crate::Money;
use crate::buffer::ReelBuffer;
use crate::config::Variant;
use crate::error::Result;
use crate::event::{FrameInput, MachineEvent, MoneyDelta, Position, SoundCue};
use crate::layout::{ReelLayout, Rect, SlotRenderer};
use crate::spin::{ReelPhase, SpinEvent, SpinSession};
use crate::timing::SpinTiming;
use crate::upgrade::{AutoSpin, UpgradeKind, UpgradeLevels};

/// Per-instance values that upgrades change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineTuning {
    pub stake: Money,
    pub timing: SpinTiming,
    /// `None` until the first auto-click upgrade
    pub auto_spin: Option<AutoSpin>,
}

/// One slot machine on the floor
#[derive(Debug, Clone)]
pub struct Machine {
    variant: Arc<Variant>,
    tuning: MachineTuning,
    session: SpinSession,
    buffer: ReelBuffer,
    levels: UpgradeLevels,
    anticipating: bool,
    spins: u64,
    last_payout: Option<Money>,
}

impl Machine {
    /// Create a machine with a freshly drawn buffer
    pub fn new<R: Rng + ?Sized>(variant: Arc<Variant>, rng: &mut R) -> Result<Self> {
        let config = variant.config();
        let buffer = ReelBuffer::generate(config.grid, &config.weights, rng)?;
        let tuning = MachineTuning {
            stake: config.stake,
            timing: config.timing,
            auto_spin: None,
        };
        Ok(Self {
            session: SpinSession::new(buffer.reels()),
            variant,
            tuning,
            buffer,
            levels: UpgradeLevels::default(),
            anticipating: false,
            spins: 0,
            last_payout: None,
        })
    }

    /// Start a spin. Returns the stake debit, or `None` if a spin is
    /// already in flight.
    pub fn spin<R: Rng + ?Sized>(&mut self, origin: Position, rng: &mut R) -> Option<MoneyDelta> {
        let weights = &self.variant.config().weights;
        if !self.session.start(&self.tuning.timing, weights, rng) {
            return None;
        }
        self.anticipating = false;
        if let Some(auto) = self.tuning.auto_spin.as_mut() {
            auto.reset();
        }
        self.spins += 1;
        log::debug!(
            "{}: spin {} at stake {}",
            self.variant.name(),
            self.spins,
            self.tuning.stake
        );
        Some(MoneyDelta::debit(self.tuning.stake, origin))
    }

    /// Advance one frame
    pub fn tick<R: Rng + ?Sized>(&mut self, input: FrameInput, rng: &mut R) -> Vec<MachineEvent> {
        let mut events = Vec::new();

        if !self.session.is_spinning() {
            let ready = !input.interacting;
            let fire = match &mut self.tuning.auto_spin {
                Some(auto) => auto.tick(input.dt, ready),
                None => false,
            };
            if fire {
                if let Some(delta) = self.spin(input.origin, rng) {
                    events.push(MachineEvent::SpinStarted(delta));
                    events.push(MachineEvent::Sound(SoundCue::SpinStart));
                }
            }
            return events;
        }

        let config = self.variant.config();
        let rule = config.anticipation;
        let spin_events = self.session.tick_with(
            input.dt,
            &self.tuning.timing,
            &mut self.buffer,
            &config.weights,
            rng,
            |reel, buffer| rule.map_or(0, |r| r.extension(reel, buffer)),
        );

        for event in spin_events {
            match event {
                SpinEvent::ReelStarted { reel } => {
                    events.push(MachineEvent::ReelStarted { reel });
                }
                SpinEvent::Tick => events.push(MachineEvent::Sound(SoundCue::Tick)),
                SpinEvent::ReelStopped { reel } => {
                    events.push(MachineEvent::ReelStopped { reel });
                    events.push(MachineEvent::Sound(SoundCue::ReelStop));
                }
                SpinEvent::DistanceExtended { reel, extra } => {
                    self.anticipating = true;
                    log::debug!("{}: anticipation after reel {reel} (+{extra})", config.name);
                    events.push(MachineEvent::AnticipationStarted { reel: reel + 1 });
                    events.push(MachineEvent::Sound(SoundCue::Anticipation));
                }
                SpinEvent::AllStopped => {
                    self.anticipating = false;
                    let payout = config.paytable.evaluate(&self.buffer, self.tuning.stake);
                    self.last_payout = Some(payout);
                    log::debug!(
                        "{}: settled {:?}, payout {payout}",
                        config.name,
                        self.buffer.to_grid()
                    );

                    events.push(MachineEvent::AllStopped { payout });
                    events.push(MachineEvent::Payout(MoneyDelta::credit(payout, input.origin)));
                    let cue = if payout > 0 {
                        SoundCue::Win
                    } else {
                        SoundCue::Lose
                    };
                    events.push(MachineEvent::Sound(cue));
                }
            }
        }

        events
    }

    /// Apply one upgrade. The shop checks cost and [`Machine::upgrades_remaining`].
    pub fn upgrade(&mut self, kind: UpgradeKind) {
        let upgrades = &self.variant.config().upgrades;
        let tuning = &mut self.tuning;
        match kind {
            UpgradeKind::Speed => {
                tuning.timing = tuning.timing.accelerated(
                    upgrades.speed_factor,
                    upgrades.min_stagger,
                    upgrades.min_tick_interval,
                );
            }
            UpgradeKind::AutoClick => {
                if let Some(auto) = tuning.auto_spin.as_mut() {
                    auto.accelerate(upgrades.speed_factor, upgrades.min_auto_spin_cooldown);
                } else {
                    tuning.auto_spin = Some(AutoSpin::new(upgrades.auto_spin_cooldown));
                }
            }
            UpgradeKind::DoubleStake => tuning.stake = tuning.stake.saturating_mul(2),
        }
        self.levels.bump(kind);
        log::info!(
            "{}: {kind} upgrade (level {})",
            self.variant.name(),
            self.levels.level(kind)
        );
    }

    /// Price of the next `kind` upgrade
    pub fn upgrade_cost(&self, kind: UpgradeKind) -> Money {
        self.variant
            .config()
            .upgrades
            .cost(kind, self.levels.level(kind))
    }

    /// Apply an upgrade and return its cost as a debit
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind, origin: Position) -> MoneyDelta {
        let cost = self.upgrade_cost(kind);
        self.upgrade(kind);
        MoneyDelta::debit(cost, origin)
    }

    /// Upgrades left before the shop's per-machine cap
    pub fn upgrades_remaining(&self) -> u32 {
        self.variant
            .config()
            .upgrades
            .max_upgrades
            .saturating_sub(self.levels.total())
    }

    /// Draw the reels inside `rect`
    pub fn draw<D: SlotRenderer>(&self, rect: Rect, renderer: &mut D) {
        let layout = ReelLayout::new(rect, self.buffer.reels(), self.buffer.rows());
        let highlighted = self
            .variant
            .config()
            .anticipation
            .filter(|_| self.anticipating)
            .map(|rule| rule.anticipated_reel());

        renderer.begin_clip(rect);
        for reel in 0..layout.reels {
            if highlighted == Some(reel) && self.session.reel_phase(reel) != ReelPhase::Stopped {
                renderer.highlight_reel(layout.reel_rect(reel));
            }

            let offset = self.session.offset(reel) as f32;
            for row in -1..layout.rows as i32 {
                let symbol = if row < 0 {
                    self.session.upcoming(reel)
                } else {
                    self.buffer.at(reel, row as usize)
                };
                renderer.draw_tile(symbol, layout.tile_position(reel, row, offset));
            }
        }
        renderer.end_clip();
    }

    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    pub fn stake(&self) -> Money {
        self.tuning.stake
    }

    pub fn tuning(&self) -> &MachineTuning {
        &self.tuning
    }

    pub fn levels(&self) -> UpgradeLevels {
        self.levels
    }

    /// Settled (or in-flight) symbols
    pub fn buffer(&self) -> &ReelBuffer {
        &self.buffer
    }

    pub fn session(&self) -> &SpinSession {
        &self.session
    }

    pub fn is_spinning(&self) -> bool {
        self.session.is_spinning()
    }

    pub fn is_anticipating(&self) -> bool {
        self.anticipating
    }

    /// Spins started so far
    pub fn spins(&self) -> u64 {
        self.spins
    }

    /// Payout of the most recent finished spin
    pub fn last_payout(&self) -> Option<Money> {
        self.last_payout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use crate::config::{AnticipationRule, VariantConfig, presets};
    use crate::weights::WeightTable;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DT: f64 = 1.0 / 60.0;

    fn machine_with(weights: WeightTable, preset: fn() -> VariantConfig) -> (Machine, StdRng) {
        let mut config = preset();
        config.weights = weights;
        let variant = Variant::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let machine = Machine::new(variant, &mut rng).unwrap();
        (machine, rng)
    }

    fn run_spin(machine: &mut Machine, rng: &mut StdRng) -> Vec<MachineEvent> {
        let mut events = Vec::new();
        for _ in 0..100_000 {
            let frame = machine.tick(FrameInput::new(DT), rng);
            let done = frame
                .iter()
                .any(|e| matches!(e, MachineEvent::AllStopped { .. }));
            events.extend(frame);
            if done {
                break;
            }
        }
        events
    }

    fn payouts(events: &[MachineEvent]) -> Vec<Money> {
        events
            .iter()
            .filter_map(|e| match e {
                MachineEvent::Payout(delta) => Some(delta.amount),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_forced_jackpot_pays_and_anticipates() {
        let (mut machine, mut rng) = machine_with(WeightTable::from_entries([(3, 1)]), presets::m3x1);

        let debit = machine.spin(Position::default(), &mut rng).unwrap();
        assert_eq!(debit.amount, -10);

        let events = run_spin(&mut machine, &mut rng);
        assert!(events.contains(&MachineEvent::AnticipationStarted { reel: 2 }));
        assert!(events.contains(&MachineEvent::Sound(SoundCue::Anticipation)));
        assert!(events.contains(&MachineEvent::AllStopped { payout: 50_000 }));
        assert!(events.contains(&MachineEvent::Sound(SoundCue::Win)));
        assert_eq!(payouts(&events), vec![50_000]);

        let session = machine.session();
        assert_eq!(session.iterations(0), 20);
        assert_eq!(session.iterations(1), 24);
        assert_eq!(session.iterations(2), 20 + 8 + 20);
        assert!(!machine.is_anticipating());
        assert_eq!(machine.last_payout(), Some(50_000));
    }

    #[test]
    fn test_unbounded_anticipation_keeps_later_reels_spinning() {
        let mut config = presets::m3x1();
        config.weights = WeightTable::from_entries([(2, 1)]);
        config.anticipation = config.anticipation.map(|rule| AnticipationRule {
            extra_distance: u32::MAX,
            ..rule
        });
        let config = VariantConfig::from_json(&config.to_json().unwrap()).unwrap();

        let variant = Variant::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut machine = Machine::new(variant, &mut rng).unwrap();
        machine.spin(Position::default(), &mut rng).unwrap();

        while !machine.is_anticipating() {
            machine.tick(FrameInput::new(DT), &mut rng);
        }
        for _ in 0..600 {
            let events = machine.tick(FrameInput::new(DT), &mut rng);
            assert!(!events.iter().any(|e| matches!(e, MachineEvent::AllStopped { .. })));
        }

        let session = machine.session();
        assert_eq!(session.target_for(2), u32::MAX);
        assert_eq!(session.reel_phase(2), ReelPhase::Spinning);
        assert!(machine.is_spinning());
    }

    #[test]
    fn test_losing_spin_reports_zero_payout() {
        let (mut machine, mut rng) = machine_with(WeightTable::from_entries([(0, 1)]), presets::m1x1);
        machine.spin(Position::default(), &mut rng).unwrap();

        let events = run_spin(&mut machine, &mut rng);
        assert_eq!(payouts(&events), vec![0]);
        assert!(events.contains(&MachineEvent::Sound(SoundCue::Lose)));
        assert!(!events.iter().any(|e| matches!(e, MachineEvent::AnticipationStarted { .. })));
    }

    #[test]
    fn test_reentrant_spin_is_ignored() {
        let variant = Variant::new(presets::m3x1()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut machine = Machine::new(variant, &mut rng).unwrap();

        assert!(machine.spin(Position::default(), &mut rng).is_some());
        machine.tick(FrameInput::new(DT), &mut rng);
        assert!(machine.spin(Position::default(), &mut rng).is_none());
        assert_eq!(machine.spins(), 1);

        run_spin(&mut machine, &mut rng);
        assert!(machine.spin(Position::default(), &mut rng).is_some());
    }

    #[test]
    fn test_payout_matches_settled_buffer() {
        let variant = Variant::new(presets::m5x3()).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let mut machine = Machine::new(variant.clone(), &mut rng).unwrap();

        for _ in 0..20 {
            machine.spin(Position::default(), &mut rng).unwrap();
            let events = run_spin(&mut machine, &mut rng);
            let expected = variant
                .config()
                .paytable
                .evaluate(machine.buffer(), machine.stake());
            assert_eq!(payouts(&events), vec![expected]);
        }
    }

    #[test]
    fn test_stop_events_follow_reel_order() {
        let variant = Variant::new(presets::m5x3()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut machine = Machine::new(variant, &mut rng).unwrap();
        machine.spin(Position::default(), &mut rng).unwrap();

        let stops: Vec<usize> = run_spin(&mut machine, &mut rng)
            .into_iter()
            .filter_map(|e| match e {
                MachineEvent::ReelStopped { reel } => Some(reel),
                _ => None,
            })
            .collect();
        assert_eq!(stops, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_double_stake_doubles_debit_and_payout() {
        let (mut machine, mut rng) = machine_with(WeightTable::from_entries([(4, 1)]), presets::m1x1);
        machine.upgrade(UpgradeKind::DoubleStake);
        assert_eq!(machine.stake(), 20);

        let debit = machine.spin(Position::default(), &mut rng).unwrap();
        assert_eq!(debit.amount, -20);
        let events = run_spin(&mut machine, &mut rng);
        assert_eq!(payouts(&events), vec![400]);
    }

    #[test]
    fn test_speed_upgrade_respects_floors() {
        let variant = Variant::new(presets::m3x1()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut machine = Machine::new(variant, &mut rng).unwrap();

        for _ in 0..10 {
            machine.upgrade(UpgradeKind::Speed);
        }
        let timing = machine.tuning().timing;
        assert!(timing.speed > 800.0 * 50.0);
        assert_eq!(timing.stagger, 0.02);
        assert_eq!(timing.tick_interval, 0.03);
        assert_eq!(machine.levels().level(UpgradeKind::Speed), 10);
        assert_eq!(machine.upgrades_remaining(), 0);
    }

    #[test]
    fn test_purchase_upgrade_charges_escalating_cost() {
        let variant = Variant::new(presets::m1x1()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut machine = Machine::new(variant, &mut rng).unwrap();
        let origin = Position::new(3.0, 4.0);

        assert_eq!(machine.purchase_upgrade(UpgradeKind::Speed, origin).amount, -100);
        assert_eq!(machine.purchase_upgrade(UpgradeKind::Speed, origin).amount, -200);
        assert_eq!(machine.upgrade_cost(UpgradeKind::Speed), 400);
        assert_eq!(machine.upgrade_cost(UpgradeKind::AutoClick), 200);
        assert_eq!(machine.upgrades_remaining(), 8);
    }

    #[test]
    fn test_auto_spin_only_when_idle_and_untouched() {
        let variant = Variant::new(presets::m1x1()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut machine = Machine::new(variant, &mut rng).unwrap();

        // No auto-click yet: idle frames do nothing
        assert!(machine.tick(FrameInput::new(5.0), &mut rng).is_empty());

        machine.upgrade(UpgradeKind::AutoClick);
        let busy = FrameInput {
            dt: 5.0,
            interacting: true,
            ..FrameInput::default()
        };
        assert!(machine.tick(busy, &mut rng).is_empty());
        assert!(!machine.is_spinning());

        assert!(machine.tick(FrameInput::new(1.0), &mut rng).is_empty());
        let events = machine.tick(FrameInput::new(1.0), &mut rng);
        assert_eq!(
            events,
            vec![
                MachineEvent::SpinStarted(MoneyDelta::debit(10, Position::default())),
                MachineEvent::Sound(SoundCue::SpinStart),
            ]
        );
        assert!(machine.is_spinning());

        // Second auto-click shortens the cooldown
        machine.upgrade(UpgradeKind::AutoClick);
        let auto = machine.tuning().auto_spin.unwrap();
        assert_eq!(auto.cooldown, 2.0 / 1.5);
    }

    #[test]
    fn test_manual_spin_restarts_auto_cooldown() {
        let variant = Variant::new(presets::m1x1()).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let mut machine = Machine::new(variant, &mut rng).unwrap();
        machine.upgrade(UpgradeKind::AutoClick);

        // Most of the 2 s cooldown elapses, then the player clicks
        assert!(machine.tick(FrameInput::new(1.9), &mut rng).is_empty());
        machine.spin(Position::default(), &mut rng).unwrap();
        assert_eq!(machine.tuning().auto_spin.unwrap().progress(), 0.0);
        run_spin(&mut machine, &mut rng);

        // Counting starts again from idle
        assert!(machine.tick(FrameInput::new(0.5), &mut rng).is_empty());
        assert!(machine.tick(FrameInput::new(1.0), &mut rng).is_empty());
        let events = machine.tick(FrameInput::new(0.6), &mut rng);
        assert!(events.contains(&MachineEvent::Sound(SoundCue::SpinStart)));
        assert_eq!(machine.spins(), 2);
    }

    #[derive(Default)]
    struct Recorder {
        tiles: Vec<(Symbol, Position)>,
        highlights: Vec<Rect>,
        clips: u32,
    }

    impl SlotRenderer for Recorder {
        fn draw_tile(&mut self, symbol: Symbol, pos: Position) {
            self.tiles.push((symbol, pos));
        }

        fn highlight_reel(&mut self, rect: Rect) {
            self.highlights.push(rect);
        }

        fn begin_clip(&mut self, _rect: Rect) {
            self.clips += 1;
        }
    }

    #[test]
    fn test_draw_emits_upcoming_and_visible_rows() {
        let variant = Variant::new(presets::m5x3()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let machine = Machine::new(variant, &mut rng).unwrap();

        let rect = ReelLayout::default_window(Position::default());
        let mut recorder = Recorder::default();
        machine.draw(rect, &mut recorder);

        assert_eq!(recorder.clips, 1);
        assert_eq!(recorder.tiles.len(), 5 * 4);
        assert!(recorder.highlights.is_empty());
        // Row 0 of reel 0 is the second tile drawn
        assert_eq!(recorder.tiles[1].0, machine.buffer().at(0, 0));
    }

    #[test]
    fn test_draw_highlights_anticipated_reel() {
        let (mut machine, mut rng) = machine_with(WeightTable::from_entries([(2, 1)]), presets::m3x1);
        machine.spin(Position::default(), &mut rng).unwrap();

        while !machine.is_anticipating() {
            machine.tick(FrameInput::new(DT), &mut rng);
        }

        let rect = ReelLayout::default_window(Position::default());
        let mut recorder = Recorder::default();
        machine.draw(rect, &mut recorder);

        let layout = ReelLayout::new(rect, 3, 1);
        assert_eq!(recorder.highlights, vec![layout.reel_rect(2)]);
    }
}
