//! Reference network scenarios built on the packet simulator.
//!
//! Two fixed topologies are provided, each reproducible from a seed:
//!
//! - [`scenarios::csma_lan`]: a point-to-point link in front of a shared
//!   LAN, with traffic forwarded across the router between them.
//! - [`scenarios::wlan`]: mobile stations and an access point on one
//!   radio channel.
//!
//! Each run returns a [`ScenarioReport`] carrying simulation statistics,
//! per-application activity, round-trip percentiles and the packet
//! capture.
//!
//! # Example
//!
//! ```no_run
//! use packetsim_simulator::{scenarios, CsmaLanConfig};
//!
//! let report = scenarios::csma_lan::run(&CsmaLanConfig::new(3).with_seed(42))?;
//! report.print_summary();
//! # Ok::<(), packetsim_simulator::ScenarioError>(())
//! ```

mod config;
mod error;
mod metrics;
pub mod scenarios;

pub use config::{CsmaLanConfig, WlanConfig};
pub use error::ScenarioError;
pub use metrics::{RttSummary, ScenarioReport};
