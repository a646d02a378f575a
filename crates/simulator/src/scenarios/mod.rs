//! Reference topologies.
//!
//! Each scenario builds a [`Simulator`], installs the echo applications
//! at their fixed times, runs to completion and tears down, returning a
//! [`ScenarioReport`].

pub mod csma_lan;
pub mod wlan;

use crate::{RttSummary, ScenarioError, ScenarioReport};
use packetsim_simulation::trace::PacketLog;
use packetsim_simulation::Simulator;
use tracing::info;

/// Run `sim` to the end and collect everything it produced.
fn finish(
    scenario: &'static str,
    seed: u64,
    mut sim: Simulator,
    capture: PacketLog,
) -> Result<ScenarioReport, ScenarioError> {
    let stats = sim.run()?;
    let applications = sim.application_reports();
    let rtt = RttSummary::from_reports(&applications)?;
    let teardown = sim.destroy();

    info!(
        scenario,
        seed,
        final_time = ?teardown.final_time,
        events = stats.events_processed,
        delivery_rate = stats.delivery_rate(),
        "Scenario complete"
    );

    Ok(ScenarioReport {
        scenario,
        seed,
        stats,
        applications,
        rtt,
        capture: capture.records(),
        teardown,
    })
}
