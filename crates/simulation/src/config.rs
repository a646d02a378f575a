//! Configuration types for the simulator and its channels.

use crate::SimulationError;
use packetsim_types::DataRate;
use std::time::Duration;

/// Configuration for a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// Seed for every random process (mobility). Same seed, same run.
    pub seed: u64,

    /// Global horizon. When set, an explicit stop event is scheduled at
    /// this time when the run starts.
    pub stop_time: Option<Duration>,

    /// Maximum frames waiting in each device's outbound queue.
    /// Frames arriving at a full queue are dropped.
    pub device_queue_capacity: usize,
}

impl SimulatorConfig {
    /// Create a new simulator configuration.
    pub fn new() -> Self {
        Self {
            seed: 12345,
            stop_time: None,
            device_queue_capacity: 100,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the global stop time.
    pub fn with_stop_time(mut self, stop_time: Duration) -> Self {
        self.stop_time = Some(stop_time);
        self
    }

    /// Set the per-device queue capacity.
    pub fn with_device_queue_capacity(mut self, capacity: usize) -> Self {
        self.device_queue_capacity = capacity;
        self
    }

    /// Check the config for values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.device_queue_capacity == 0 {
            return Err(SimulationError::InvalidConfig(
                "device queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-to-point link parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointToPointConfig {
    /// Transmit rate of each endpoint.
    pub data_rate: DataRate,

    /// One-way propagation delay.
    pub delay: Duration,
}

impl Default for PointToPointConfig {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_mbps(5),
            delay: Duration::from_millis(2),
        }
    }
}

impl PointToPointConfig {
    /// Set the data rate.
    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    /// Set the propagation delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Check the config for values the channel cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        validate_rate(self.data_rate, "point-to-point")
    }
}

/// Shared-medium (CSMA bus) parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CsmaConfig {
    /// Medium rate shared by every attached device.
    pub data_rate: DataRate,

    /// Propagation delay across the bus.
    pub delay: Duration,
}

impl Default for CsmaConfig {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_mbps(100),
            delay: Duration::from_nanos(6_560),
        }
    }
}

impl CsmaConfig {
    /// Set the data rate.
    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    /// Set the propagation delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Check the config for values the channel cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        validate_rate(self.data_rate, "shared-medium")
    }
}

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Wireless channel parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WirelessConfig {
    /// PHY rate.
    pub data_rate: DataRate,

    /// Maximum distance, in metres, at which a frame is received.
    pub range_m: f64,

    /// Frames whose wire size exceeds this many bytes are preceded by an
    /// RTS/CTS exchange. `Some(0)` protects every frame; `None` disables it.
    pub rts_cts_threshold: Option<u32>,

    /// Signal propagation speed in m/s.
    pub propagation_speed: f64,
}

impl Default for WirelessConfig {
    fn default() -> Self {
        Self {
            data_rate: DataRate::from_mbps(54),
            range_m: 250.0,
            rts_cts_threshold: None,
            propagation_speed: SPEED_OF_LIGHT,
        }
    }
}

impl WirelessConfig {
    /// Set the PHY rate.
    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    /// Set the reception range.
    pub fn with_range(mut self, range_m: f64) -> Self {
        self.range_m = range_m;
        self
    }

    /// Set the RTS/CTS threshold.
    pub fn with_rts_cts_threshold(mut self, threshold: Option<u32>) -> Self {
        self.rts_cts_threshold = threshold;
        self
    }

    /// Check the config for values the channel cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        validate_rate(self.data_rate, "wireless")?;
        if !self.range_m.is_finite() || self.range_m <= 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "wireless range must be positive and finite, got {}",
                self.range_m
            )));
        }
        if !self.propagation_speed.is_finite() || self.propagation_speed <= 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "propagation speed must be positive and finite, got {}",
                self.propagation_speed
            )));
        }
        Ok(())
    }
}

fn validate_rate(rate: DataRate, channel: &str) -> Result<(), SimulationError> {
    if rate.is_zero() {
        return Err(SimulationError::InvalidConfig(format!(
            "{channel} data rate must be non-zero"
        )));
    }
    Ok(())
}
