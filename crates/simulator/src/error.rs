//! Scenario errors.

use packetsim_apps::ConfigError;
use packetsim_simulation::SimulationError;
use thiserror::Error;

/// Errors raised while building or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The requested station count does not fit the layout.
    #[error("n_wifi must be between {min} and {max}, got {requested}")]
    StationCount {
        /// Requested stations.
        requested: u32,
        /// Fewest stations the traffic pattern needs.
        min: u32,
        /// Most stations the grid fits inside the walk bounds.
        max: u32,
    },

    /// An application rejected its configuration.
    #[error("application config: {0}")]
    Application(#[from] ConfigError),

    /// The simulator rejected the topology or failed while running.
    #[error("simulation: {0}")]
    Simulation(#[from] SimulationError),

    /// The RTT histogram could not be built.
    #[error("histogram: {0}")]
    Histogram(String),
}
