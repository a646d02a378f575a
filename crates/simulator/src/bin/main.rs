//! packetsim CLI
//!
//! Run the reference network scenarios from the command line.
//!
//! # Example
//!
//! ```bash
//! # Point-to-point link plus a LAN of three extra hosts
//! packetsim csma-lan --n-csma 3
//!
//! # Mobile WLAN with per-packet logging, fixed seed, JSON report
//! packetsim --seed 42 --json wlan --n-wifi 8 --tracing
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use packetsim_simulator::{scenarios, CsmaLanConfig, ScenarioReport, WlanConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// packetsim
///
/// Deterministic packet-level simulation of small IPv4/UDP networks.
/// Reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "packetsim")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    scenario: Scenario,

    /// Log echo application activity
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    verbose: bool,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the report as JSON instead of a text summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// Point-to-point link feeding a shared LAN
    CsmaLan {
        /// Number of extra LAN nodes besides the router (0 is raised to 1)
        #[arg(long, default_value = "5")]
        n_csma: u32,
    },

    /// Access point and mobile stations on one radio channel
    Wlan {
        /// Number of stations
        #[arg(long, default_value = "6")]
        n_wifi: u32,

        /// Log every packet transmit, receive and drop
        #[arg(long)]
        tracing: bool,
    },
}

fn log_filter(args: &Args) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let mut directives =
        String::from("warn,packetsim_simulator=info,packetsim_simulation::mobility=info");
    if args.verbose {
        directives.push_str(",packetsim_apps=info");
    }
    if matches!(args.scenario, Scenario::Wlan { tracing: true, .. }) {
        directives.push_str(",packetsim_simulation::trace=debug");
    }
    EnvFilter::new(directives)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&args))
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);

    let report = match args.scenario {
        Scenario::CsmaLan { n_csma } => {
            info!(n_csma, seed, "Starting csma-lan scenario");
            scenarios::csma_lan::run(&CsmaLanConfig::new(n_csma).with_seed(seed))
                .context("csma-lan scenario failed")?
        }
        Scenario::Wlan { n_wifi, tracing } => {
            info!(n_wifi, tracing, seed, "Starting wlan scenario");
            let config = WlanConfig::new(n_wifi)
                .with_tracing(tracing)
                .with_seed(seed);
            scenarios::wlan::run(&config).context("wlan scenario failed")?
        }
    };

    emit(&report, args.json)
}

fn emit(report: &ScenarioReport, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{out}");
    } else {
        report.print_summary();
    }
    Ok(())
}
