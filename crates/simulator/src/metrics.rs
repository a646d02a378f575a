//! Scenario results and round-trip statistics.

use crate::ScenarioError;
use hdrhistogram::Histogram;
use packetsim_simulation::trace::{TraceKind, TraceRecord};
use packetsim_simulation::{ApplicationReport, SimulationStats, TeardownReport};
use serde::Serialize;
use std::time::Duration;

/// Application name reported by the echo client.
const ECHO_CLIENT: &str = "UdpEchoClient";

/// Round-trip latency distribution across every echo client in a run.
///
/// Recorded in microseconds, three significant figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RttSummary {
    /// Number of round trips recorded.
    pub samples: u64,
    /// Fastest round trip.
    pub min: Duration,
    /// Median round trip.
    pub p50: Duration,
    /// 90th percentile.
    pub p90: Duration,
    /// 99th percentile.
    pub p99: Duration,
    /// Slowest round trip.
    pub max: Duration,
    /// Arithmetic mean.
    pub mean: Duration,
}

impl RttSummary {
    /// Build a summary from raw samples. `None` if there are none.
    pub fn from_samples(samples: &[Duration]) -> Result<Option<Self>, ScenarioError> {
        if samples.is_empty() {
            return Ok(None);
        }
        let mut histogram =
            Histogram::<u64>::new(3).map_err(|e| ScenarioError::Histogram(e.to_string()))?;
        for rtt in samples {
            let micros = u64::try_from(rtt.as_micros()).unwrap_or(u64::MAX);
            histogram
                .record(micros)
                .map_err(|e| ScenarioError::Histogram(e.to_string()))?;
        }
        Ok(Some(Self {
            samples: histogram.len(),
            min: Duration::from_micros(histogram.min()),
            p50: Duration::from_micros(histogram.value_at_quantile(0.50)),
            p90: Duration::from_micros(histogram.value_at_quantile(0.90)),
            p99: Duration::from_micros(histogram.value_at_quantile(0.99)),
            max: Duration::from_micros(histogram.max()),
            mean: Duration::from_micros(histogram.mean() as u64),
        }))
    }

    /// Collect the round trips measured by every echo client.
    ///
    /// Clients match each reply to its request by sequence number, so a
    /// lost request leaves the later samples untouched.
    pub fn from_reports(reports: &[ApplicationReport]) -> Result<Option<Self>, ScenarioError> {
        let samples: Vec<Duration> = reports
            .iter()
            .filter(|r| r.name == ECHO_CLIENT)
            .flat_map(|r| r.round_trips.iter().copied())
            .collect();
        Self::from_samples(&samples)
    }
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name as given on the command line.
    pub scenario: &'static str,
    /// Seed the run was derived from.
    pub seed: u64,
    /// Counters at the moment the run stopped.
    pub stats: SimulationStats,
    /// One entry per installed application, in install order.
    pub applications: Vec<ApplicationReport>,
    /// Echo round-trip distribution. `None` if no reply came back.
    pub rtt: Option<RttSummary>,
    /// Packet records from the capture points.
    pub capture: Vec<TraceRecord>,
    /// Final clock and object counts from teardown.
    pub teardown: TeardownReport,
}

impl ScenarioReport {
    /// Echo replies that made it back to a client.
    pub fn echoes_received(&self) -> u64 {
        self.applications
            .iter()
            .filter(|r| r.name == ECHO_CLIENT)
            .map(|r| r.received)
            .sum()
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n--- {} (seed {}) ---", self.scenario, self.seed);
        println!("Simulated time:   {:?}", self.teardown.final_time);
        println!("Events processed: {}", self.stats.events_processed);
        println!("Events discarded: {}", self.teardown.events_discarded);
        println!(
            "Topology:         {} nodes, {} devices, {} channels",
            self.teardown.nodes, self.teardown.devices, self.teardown.channels
        );

        println!();
        println!("Packets:");
        println!("  Sent:       {}", self.stats.packets_sent);
        println!("  Received:   {}", self.stats.packets_received);
        println!("  Forwarded:  {}", self.stats.packets_forwarded);
        println!("  Dropped:    {}", self.stats.packets_dropped());
        println!("Frames:");
        println!("  Sent:       {}", self.stats.frames_transmitted);
        println!("  Delivered:  {}", self.stats.frames_delivered);
        println!("  Deferred:   {}", self.stats.frames_deferred);
        println!("  Dropped:    {}", self.stats.frames_dropped());

        println!();
        println!("Applications:");
        for app in &self.applications {
            println!(
                "  {:<14} on {:<8} port {:<6} sent {:<3} received {}",
                app.name,
                app.node.to_string(),
                app.port.map_or_else(|| "-".to_string(), |p| p.to_string()),
                app.sent,
                app.received
            );
        }

        match &self.rtt {
            Some(rtt) => {
                println!();
                println!("Round trip ({} samples):", rtt.samples);
                println!("  P50:  {:?}", rtt.p50);
                println!("  P90:  {:?}", rtt.p90);
                println!("  P99:  {:?}", rtt.p99);
                println!("  Max:  {:?}", rtt.max);
                println!("  Avg:  {:?}", rtt.mean);
                println!("  Min:  {:?}", rtt.min);
            }
            None => println!("\nNo echo replies recorded."),
        }

        if !self.capture.is_empty() {
            println!();
            println!("Capture ({} records):", self.capture.len());
            for record in &self.capture {
                let kind = match record.kind {
                    TraceKind::Transmit => "tx".to_string(),
                    TraceKind::Receive => "rx".to_string(),
                    TraceKind::Drop(reason) => format!("drop({})", reason.as_str()),
                };
                let device = record
                    .device
                    .map_or_else(|| "-".to_string(), |d| d.to_string());
                println!(
                    "  {:>14.6}s {:<16} {} {} {} > {} len {}",
                    record.time.as_secs_f64(),
                    kind,
                    record.node,
                    device,
                    record.src,
                    record.dst,
                    record.payload_size
                );
            }
        }
    }
}
