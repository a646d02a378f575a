//! Shared half-duplex bus.

use super::{Delivery, Transmission};
use crate::CsmaConfig;
use packetsim_types::DeviceId;
use std::time::Duration;

/// A bus shared by any number of devices.
///
/// Only one transmission occupies the medium at a time. The medium stays
/// busy until the last bit has propagated across the bus, i.e. for
/// serialization plus delay. Devices that find it busy defer (see the
/// module docs of [`channel`](super)).
#[derive(Debug)]
pub struct CsmaChannel {
    config: CsmaConfig,

    /// Attached devices, in attach order.
    devices: Vec<DeviceId>,

    /// When the current transmission has fully propagated.
    busy_until: Duration,
}

impl CsmaChannel {
    /// Ethernet header (14) plus FCS (4).
    pub const LINK_OVERHEAD: u32 = 18;

    /// Create an empty bus.
    pub fn new(config: CsmaConfig) -> Self {
        Self {
            config,
            devices: Vec::new(),
            busy_until: Duration::ZERO,
        }
    }

    /// Bus parameters.
    pub fn config(&self) -> &CsmaConfig {
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

    /// Broadcast `bytes` from `from` to every other attached device.
    pub fn transmit(&mut self, now: Duration, from: DeviceId, bytes: u64) -> Transmission {
        let started_at = now.max(self.busy_until);
        let ends_at = started_at.saturating_add(self.config.data_rate.transmission_time(bytes));
        let arrival = ends_at.saturating_add(self.config.delay);
        self.busy_until = arrival;

        let deliveries = self
            .devices
            .iter()
            .filter(|&&d| d != from)
            .map(|&device| Delivery {
                device,
                at: arrival,
            })
            .collect();

        Transmission {
            started_at,
            ends_at,
            deliveries,
            out_of_range: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packetsim_types::DataRate;

    fn bus(devices: u32) -> CsmaChannel {
        let config = CsmaConfig::default()
            .with_data_rate(DataRate::from_mbps(100))
            .with_delay(Duration::from_micros(10));
        let mut bus = CsmaChannel::new(config);
        for d in 0..devices {
            bus.attach(DeviceId(d));
        }
        bus
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let mut bus = bus(4);
        let tx = bus.transmit(Duration::ZERO, DeviceId(2), 1000);

        let receivers: Vec<_> = tx.deliveries.iter().map(|d| d.device).collect();
        assert_eq!(receivers, vec![DeviceId(0), DeviceId(1), DeviceId(3)]);

        // 1000 bytes at 100 Mbps = 80 µs, plus 10 µs propagation
        for delivery in &tx.deliveries {
            assert_eq!(delivery.at, Duration::from_micros(90));
        }
    }

    #[test]
    fn test_medium_busy_until_propagated() {
        let mut bus = bus(2);
        bus.transmit(Duration::ZERO, DeviceId(0), 1000);

        assert_eq!(bus.ready_at(), Duration::from_micros(90));
    }

    #[test]
    fn test_early_transmit_is_deferred() {
        let mut bus = bus(2);
        bus.transmit(Duration::ZERO, DeviceId(0), 1000);
        let second = bus.transmit(Duration::from_micros(10), DeviceId(1), 1000);
        assert_eq!(second.started_at, Duration::from_micros(90));
        assert_eq!(second.deliveries[0].at, Duration::from_micros(180));
    }
}
