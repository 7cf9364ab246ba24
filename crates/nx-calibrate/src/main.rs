//! 9X Gambler machine tool
//!
//! Usage:
//!   nx-calibrate list                          - List built-in variants
//!   nx-calibrate calibrate [-v m3x1]           - Estimate RTP and win chance
//!   nx-calibrate dump -v m5x3 --format yaml    - Write a variant config
//!   nx-calibrate simulate -v m3x1 --seconds 600 - Play a headless session

mod ledger;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nx_slot::{
    DEFAULT_TRIALS, EvCalibrator, EvStats, Money, UpgradeKind, Variant, VariantConfig, exact_ev,
    presets,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::session::{SessionConfig, run_session};

#[derive(Parser)]
#[command(name = "nx-calibrate", about = "9X Gambler machine calibration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in variants
    List,
    /// Estimate RTP and win chance
    Calibrate {
        /// Built-in variant (repeatable; default: all)
        #[arg(short, long)]
        variant: Vec<String>,
        /// Variant config file (.json / .yaml)
        #[arg(short, long, conflicts_with = "variant")]
        config: Option<PathBuf>,
        /// Trials per variant
        #[arg(short, long, default_value_t = DEFAULT_TRIALS)]
        trials: u64,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Run on one thread
        #[arg(long)]
        sequential: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write a variant config
    Dump {
        /// Built-in variant
        #[arg(short, long)]
        variant: String,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Play a headless session against an in-memory ledger
    Simulate {
        /// Built-in variant
        #[arg(short, long, default_value = "m3x1")]
        variant: String,
        /// Variant config file, overrides --variant
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Simulated play time
        #[arg(long, default_value_t = 600.0)]
        seconds: f64,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Starting balance
        #[arg(long, default_value_t = 1500)]
        money: Money,
        /// Upgrade to buy before playing (repeatable)
        #[arg(short, long)]
        upgrade: Vec<UpgradeKind>,
        /// Seconds between manual clicks
        #[arg(long, default_value_t = 0.5)]
        manual_every: f64,
        /// Never click; rely on auto-click
        #[arg(long)]
        no_manual: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Serialize)]
struct CalibrationRow {
    variant: String,
    #[serde(flatten)]
    stats: EvStats,
    rtp: f64,
    exact_ev: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_variants(),
        Commands::Calibrate {
            variant,
            config,
            trials,
            seed,
            sequential,
            json,
        } => {
            let configs = match config {
                Some(path) => vec![load_config(&path)?],
                None if variant.is_empty() => presets::all(),
                None => variant
                    .iter()
                    .map(|name| presets::by_name(name))
                    .collect::<nx_slot::Result<_>>()?,
            };
            let calibrator = EvCalibrator {
                trials,
                seed: seed.unwrap_or_else(rand::random),
                parallel: !sequential,
            };
            calibrate(&configs, &calibrator, json)
        }
        Commands::Dump {
            variant,
            format,
            out,
        } => dump(&variant, format, out.as_deref()),
        Commands::Simulate {
            variant,
            config,
            seconds,
            fps,
            seed,
            money,
            upgrade,
            manual_every,
            no_manual,
            json,
        } => {
            let variant_config = match config {
                Some(path) => load_config(&path)?,
                None => presets::by_name(&variant)?,
            };
            let session = SessionConfig {
                seconds,
                fps,
                money,
                manual_every: (!no_manual).then_some(manual_every),
                upgrades: upgrade,
            };
            simulate(variant_config, &session, seed, json)
        }
    }
}

fn load_config(path: &Path) -> Result<VariantConfig> {
    VariantConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn list_variants() -> Result<()> {
    for config in presets::all() {
        println!(
            "{:<6} {}x{}  {:?}  stake {}",
            config.name, config.grid.reels, config.grid.rows, config.paytable.rule, config.stake
        );
    }
    Ok(())
}

fn calibrate(configs: &[VariantConfig], calibrator: &EvCalibrator, json: bool) -> Result<()> {
    log::info!(
        "Calibrating {} variant(s), {} trials, seed {}",
        configs.len(),
        calibrator.trials,
        calibrator.seed
    );

    let results = nx_slot::calibrate_all(configs, calibrator);
    let mut rows = Vec::with_capacity(configs.len());
    for (config, result) in configs.iter().zip(results) {
        let stats = result.with_context(|| format!("Failed to calibrate {}", config.name))?;
        rows.push(CalibrationRow {
            variant: config.name.clone(),
            stats,
            rtp: stats.rtp(),
            exact_ev: exact_ev(config),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<8} {:>10} {:>10} {:>9} {:>10}",
        "variant", "EV", "exact", "RTP", "win"
    );
    for row in &rows {
        let exact = row
            .exact_ev
            .map(|e| format!("{e:.3}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>10.3} {:>10} {:>8.2}% {:>9.2}%",
            row.variant,
            row.stats.expected_value,
            exact,
            row.rtp * 100.0,
            row.stats.win_probability * 100.0
        );
    }
    Ok(())
}

fn dump(variant: &str, format: Format, out: Option<&Path>) -> Result<()> {
    let config = presets::by_name(variant)?;
    let text = match format {
        Format::Json => config.to_json()?,
        Format::Yaml => config.to_yaml()?,
    };

    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} to {}", variant, path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn simulate(config: VariantConfig, session: &SessionConfig, seed: Option<u64>, json: bool) -> Result<()> {
    let variant = Variant::new(config)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let report = run_session(variant.clone(), session, &mut rng)
        .with_context(|| format!("Session on {} failed", variant.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let ev = variant.ev();
    println!("Variant:            {}", report.variant);
    println!("Spins:              {}", report.spins);
    println!("Wagered / won:      {} / {}", report.wagered, report.won);
    println!("Upgrade spend:      {}", report.upgrade_spend);
    println!(
        "RTP realized:       {:.2}% (calibrated {:.2}%)",
        report.realized_rtp * 100.0,
        ev.rtp() * 100.0
    );
    println!("Biggest win:        {}", report.biggest_win);
    println!("Anticipations:      {}", report.anticipations);
    println!(
        "Balance:            {} (lowest {})",
        report.final_balance, report.lowest_balance
    );
    let solvent = report.time_solvent;
    println!(
        "Time spent Solvent: {}:{:02}",
        (solvent / 60.0) as u64,
        solvent.floor() as u64 % 60
    );
    Ok(())
}
