//! Full-duplex point-to-point link.

use super::{Delivery, Transmission};
use crate::{PointToPointConfig, SimulationError};
use packetsim_types::{ChannelId, DeviceId};
use std::time::Duration;

/// A link between exactly two devices.
///
/// Each direction has its own transmitter, so both ends can send at the
/// same time. A frame sent at `t` arrives at the peer at
/// `t + serialization + delay`, where serialization is the wire size
/// clocked out at the link rate.
#[derive(Debug)]
pub struct PointToPointChannel {
    config: PointToPointConfig,

    /// The two endpoints, in attach order.
    devices: Vec<DeviceId>,

    /// Per-endpoint time its transmitter becomes idle.
    busy_until: [Duration; 2],
}

impl PointToPointChannel {
    /// PPP header bytes added to every packet.
    pub const LINK_OVERHEAD: u32 = 2;

    /// Create an unattached link.
    pub fn new(config: PointToPointConfig) -> Self {
        Self {
            config,
            devices: Vec::with_capacity(2),
            busy_until: [Duration::ZERO; 2],
        }
    }

    /// Link parameters.
    pub fn config(&self) -> &PointToPointConfig {
        &self.config
    }

    /// Attached endpoints.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub(crate) fn attach(&mut self, id: ChannelId, device: DeviceId) -> Result<(), SimulationError> {
        if self.devices.len() == 2 {
            return Err(SimulationError::ChannelFull { channel: id });
        }
        self.devices.push(device);
        Ok(())
    }

    fn endpoint(&self, device: DeviceId) -> Option<usize> {
        self.devices.iter().position(|&d| d == device)
    }

    /// Earliest time `from` may start transmitting.
    pub fn ready_at(&self, from: DeviceId) -> Duration {
        self.endpoint(from)
            .map(|i| self.busy_until[i])
            .unwrap_or(Duration::ZERO)
    }

    /// Send `bytes` from `from` to the other endpoint.
    pub fn transmit(&mut self, now: Duration, from: DeviceId, bytes: u64) -> Transmission {
        let started_at = now.max(self.ready_at(from));
        let ends_at = started_at.saturating_add(self.config.data_rate.transmission_time(bytes));

        let mut deliveries = Vec::with_capacity(1);
        if let Some(i) = self.endpoint(from) {
            self.busy_until[i] = ends_at;
            if let Some(&peer) = self.devices.get(1 - i) {
                deliveries.push(Delivery {
                    device: peer,
                    at: ends_at.saturating_add(self.config.delay),
                });
            }
        }

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

    fn link() -> PointToPointChannel {
        let config = PointToPointConfig::default()
            .with_data_rate(DataRate::from_mbps(10))
            .with_delay(Duration::from_millis(1));
        let mut link = PointToPointChannel::new(config);
        link.attach(ChannelId(0), DeviceId(0)).unwrap();
        link.attach(ChannelId(0), DeviceId(1)).unwrap();
        link
    }

    #[test]
    fn test_third_device_rejected() {
        let mut link = link();
        assert_eq!(
            link.attach(ChannelId(0), DeviceId(2)),
            Err(SimulationError::ChannelFull {
                channel: ChannelId(0)
            })
        );
    }

    #[test]
    fn test_delivery_time_is_serialization_plus_delay() {
        let mut link = link();
        let now = Duration::from_secs(2);
        // 1054 bytes at 10 Mbps = 843.2 µs
        let tx = link.transmit(now, DeviceId(0), 1054);

        assert_eq!(tx.ends_at, now + Duration::from_nanos(843_200));
        assert_eq!(
            tx.deliveries,
            vec![Delivery {
                device: DeviceId(1),
                at: now + Duration::from_nanos(843_200) + Duration::from_millis(1),
            }]
        );
    }

    #[test]
    fn test_directions_are_independent() {
        let mut link = link();
        let now = Duration::from_secs(1);
        let forward = link.transmit(now, DeviceId(0), 1000);

        // The reverse direction is idle even while the forward one is busy.
        assert_eq!(link.ready_at(DeviceId(1)), Duration::ZERO);
        assert_eq!(link.ready_at(DeviceId(0)), forward.ends_at);

        let reverse = link.transmit(now, DeviceId(1), 1000);
        assert_eq!(reverse.started_at, now);
    }
}
