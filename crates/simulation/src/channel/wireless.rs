//! Shared radio medium.

use super::{Delivery, PositionOracle, Transmission};
use crate::WirelessConfig;
use packetsim_types::{DeviceId, Position};
use std::time::Duration;
use tracing::trace;

/// Short interframe space.
const SIFS: Duration = Duration::from_micros(10);

/// RTS control frame size in bytes.
const RTS_BYTES: u64 = 20;

/// CTS control frame size in bytes.
const CTS_BYTES: u64 = 14;

/// A radio channel shared by every attached device.
///
/// Contention follows the same deferral rule as the CSMA bus. On top of
/// that, the arrival time at each receiver depends on its distance from the
/// sender, and receivers beyond `range_m` do not hear the frame. Positions
/// come from a [`PositionOracle`] at transmit time; a device without a
/// known position is treated as co-located with the sender.
#[derive(Debug)]
pub struct WirelessChannel {
    config: WirelessConfig,

    /// Attached devices, in attach order.
    devices: Vec<DeviceId>,

    /// When the current transmission has reached every receiver.
    busy_until: Duration,
}

impl WirelessChannel {
    /// 802.11 MAC header (24) + LLC/SNAP (8) + FCS (4).
    pub const LINK_OVERHEAD: u32 = 36;

    /// Create an empty radio channel.
    pub fn new(config: WirelessConfig) -> Self {
        Self {
            config,
            devices: Vec::new(),
            busy_until: Duration::ZERO,
        }
    }

    /// Channel parameters.
    pub fn config(&self) -> &WirelessConfig {
        &self.config
    }

    /// Attached devices.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub(crate) fn attach(&mut self, device: DeviceId) {
        self.devices.push(device);
    }

    /// Earliest time any device may start transmitting.
    pub fn ready_at(&self) -> Duration {
        self.busy_until
    }

    /// Time spent on the RTS/CTS exchange before a data frame of `bytes`.
    pub fn handshake_time(&self, bytes: u64) -> Duration {
        match self.config.rts_cts_threshold {
            Some(threshold) if bytes > u64::from(threshold) => {
                let rate = self.config.data_rate;
                rate.transmission_time(RTS_BYTES) + rate.transmission_time(CTS_BYTES) + SIFS * 2
            }
            _ => Duration::ZERO,
        }
    }

    fn propagation_delay(&self, from: Option<Position>, to: Option<Position>) -> Option<Duration> {
        let distance = match (from, to) {
            (Some(a), Some(b)) => a.distance_to(&b),
            _ => 0.0,
        };
        if distance > self.config.range_m {
            return None;
        }
        Some(Duration::from_secs_f64(distance / self.config.propagation_speed))
    }

    /// Send `bytes` from `from` to every attached device in range.
    pub fn transmit(
        &mut self,
        now: Duration,
        from: DeviceId,
        bytes: u64,
        positions: &mut dyn PositionOracle,
    ) -> Transmission {
        let started_at = now.max(self.busy_until);
        let data_start = started_at.saturating_add(self.handshake_time(bytes));
        let ends_at = data_start.saturating_add(self.config.data_rate.transmission_time(bytes));

        let origin = positions.position(from, started_at);
        let mut deliveries = Vec::with_capacity(self.devices.len().saturating_sub(1));
        let mut out_of_range = Vec::new();
        let mut last_arrival = ends_at;

        for &device in self.devices.iter().filter(|&&d| d != from) {
            let target = positions.position(device, started_at);
            match self.propagation_delay(origin, target) {
                Some(delay) => {
                    let at = ends_at.saturating_add(delay);
                    last_arrival = last_arrival.max(at);
                    deliveries.push(Delivery { device, at });
                }
                None => {
                    trace!(from = %from, to = %device, "Receiver out of range");
                    out_of_range.push(device);
                }
            }
        }

        self.busy_until = last_arrival;

        Transmission {
            started_at,
            ends_at,
            deliveries,
            out_of_range,
        }
    }
}
