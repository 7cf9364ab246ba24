//! Headless frame-loop session
//!
//! Drives one machine at a fixed frame rate against an in-memory ledger,
//! clicking it on a schedule the way a player would, and reports what the
//! bankroll went through.

use std::sync::Arc;

use anyhow::{Result, bail};
use nx_slot::{
    FrameInput, Machine, MachineEvent, Money, MoneyDelta, Position, UpgradeKind, Variant,
};
use rand::Rng;
use serde::Serialize;

use crate::ledger::Ledger;

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Simulated play time (seconds)
    pub seconds: f64,
    pub fps: u32,
    /// Starting balance
    pub money: Money,
    /// Seconds between manual clicks while idle; `None` never clicks
    pub manual_every: Option<f64>,
    /// Upgrades bought before the first spin, in order
    pub upgrades: Vec<UpgradeKind>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seconds: 600.0,
            fps: 60,
            money: 1500,
            manual_every: Some(0.5),
            upgrades: Vec::new(),
        }
    }
}

/// What happened during a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub variant: String,
    pub seconds: f64,
    pub spins: u64,
    pub wagered: Money,
    pub won: Money,
    pub upgrade_spend: Money,
    /// Won / wagered
    pub realized_rtp: f64,
    pub biggest_win: Money,
    pub anticipations: u64,
    pub final_balance: Money,
    pub lowest_balance: Money,
    /// Play time before the balance first went negative
    pub time_solvent: f64,
}

/// Play `variant` for `config.seconds`
pub fn run_session<R: Rng + ?Sized>(
    variant: Arc<Variant>,
    config: &SessionConfig,
    rng: &mut R,
) -> Result<SessionReport> {
    if config.fps == 0 {
        bail!("fps must be positive");
    }
    if !(config.seconds.is_finite() && config.seconds >= 0.0) {
        bail!("session length must be non-negative, got {}", config.seconds);
    }

    let mut machine = Machine::new(variant.clone(), rng)?;
    let mut ledger = Ledger::new(config.money);
    let origin = Position::default();

    let mut upgrade_spend: Money = 0;
    for &kind in &config.upgrades {
        let cost = machine.upgrade_cost(kind);
        if machine.upgrades_remaining() == 0 || !ledger.can_afford(cost) {
            log::warn!("Skipping {kind} upgrade (cost {cost}, balance {})", ledger.balance());
            continue;
        }
        ledger.apply(machine.purchase_upgrade(kind, origin));
        upgrade_spend += cost;
    }

    let auto = machine.tuning().auto_spin.is_some();
    if config.manual_every.is_none() && !auto {
        log::warn!("No manual clicks and no auto-click upgrade: the machine will never spin");
    }

    let dt = 1.0 / config.fps as f64;
    let frames = (config.seconds * config.fps as f64).round() as u64;

    let mut wagered: Money = 0;
    let mut won: Money = 0;
    let mut biggest_win: Money = 0;
    let mut anticipations = 0;
    let mut since_click = 0.0;
    let mut time_solvent = None;
    let mut clock = 0.0;

    let mut record = |delta: MoneyDelta, ledger: &mut Ledger| {
        if delta.amount < 0 {
            wagered -= delta.amount;
        } else {
            won += delta.amount;
            biggest_win = biggest_win.max(delta.amount);
        }
        ledger.apply(delta);
    };

    for _ in 0..frames {
        if let Some(interval) = config.manual_every {
            since_click += dt;
            if since_click >= interval
                && !machine.is_spinning()
                && ledger.can_afford(machine.stake())
            {
                since_click = 0.0;
                if let Some(delta) = machine.spin(origin, rng) {
                    record(delta, &mut ledger);
                }
            }
        }

        let input = FrameInput {
            dt,
            interacting: false,
            origin,
        };
        for event in machine.tick(input, rng) {
            match event {
                MachineEvent::SpinStarted(delta) | MachineEvent::Payout(delta) => {
                    record(delta, &mut ledger)
                }
                MachineEvent::AnticipationStarted { .. } => anticipations += 1,
                _ => {}
            }
        }

        clock += dt;
        if time_solvent.is_none() && !ledger.is_solvent() {
            time_solvent = Some(clock);
            log::info!("Went broke after {:.1}s", clock);
        }
    }

    let report = SessionReport {
        variant: variant.name().to_string(),
        seconds: clock,
        spins: machine.spins(),
        wagered,
        won,
        upgrade_spend,
        realized_rtp: if wagered > 0 {
            won as f64 / wagered as f64
        } else {
            0.0
        },
        biggest_win,
        anticipations,
        final_balance: ledger.balance(),
        lowest_balance: ledger.lowest(),
        time_solvent: time_solvent.unwrap_or(clock),
    };
    Ok(report)
}
