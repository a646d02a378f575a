//! Configuration types for the reference scenarios.

use crate::ScenarioError;

/// Parameters of the point-to-point + LAN scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsmaLanConfig {
    /// Extra nodes on the shared LAN besides the router.
    pub n_csma: u32,

    /// Random seed for deterministic simulation.
    pub seed: u64,
}

impl CsmaLanConfig {
    /// Create a configuration with `n_csma` extra LAN nodes.
    ///
    /// Zero is raised to one so the LAN always has a server node.
    pub fn new(n_csma: u32) -> Self {
        Self {
            n_csma: n_csma.max(1),
            seed: 12345,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for CsmaLanConfig {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Parameters of the infrastructure WLAN scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WlanConfig {
    /// Mobile stations besides the access point.
    pub n_wifi: u32,

    /// Emit a log line per packet event.
    pub tracing: bool,

    /// Random seed for deterministic simulation.
    pub seed: u64,
}

impl WlanConfig {
    /// Most stations whose grid start positions stay inside the walk bounds.
    pub const MAX_STATIONS: u32 = 18;

    /// Clients run on stations 4 and 5.
    pub const MIN_STATIONS: u32 = 6;

    /// Create a configuration with `n_wifi` stations.
    pub fn new(n_wifi: u32) -> Self {
        Self {
            n_wifi,
            tracing: false,
            seed: 12345,
        }
    }

    /// Enable per-packet logging.
    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the station count.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(Self::MIN_STATIONS..=Self::MAX_STATIONS).contains(&self.n_wifi) {
            return Err(ScenarioError::StationCount {
                requested: self.n_wifi,
                min: Self::MIN_STATIONS,
                max: Self::MAX_STATIONS,
            });
        }
        Ok(())
    }
}

impl Default for WlanConfig {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_csma_nodes_coerced() {
        assert_eq!(CsmaLanConfig::new(0).n_csma, 1);
        assert_eq!(CsmaLanConfig::default().n_csma, 5);
    }

    #[test]
    fn test_station_bounds() {
        assert!(WlanConfig::new(18).validate().is_ok());
        assert!(matches!(
            WlanConfig::new(19).validate(),
            Err(ScenarioError::StationCount { requested: 19, .. })
        ));
        assert!(WlanConfig::new(5).validate().is_err());
    }
}
