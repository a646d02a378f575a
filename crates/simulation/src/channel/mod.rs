//! Transmission media.
//!
//! A channel decides *when* a frame can go out and *when* each receiver
//! sees it. It never touches the event queue: [`Channel::transmit`] returns
//! a [`Transmission`] listing one [`Delivery`] per receiving device and the
//! simulator schedules exactly one arrival event per delivery.
//!
//! # Contention
//!
//! Shared media (CSMA bus and wireless) use **deferral**: while one
//! transmission occupies the medium, other devices keep their frames queued
//! and retry when [`Channel::ready_at`] says the medium is free. Frames are
//! never lost to collisions.

mod csma;
mod point_to_point;
mod wireless;

pub use csma::CsmaChannel;
pub use point_to_point::PointToPointChannel;
pub use wireless::WirelessChannel;

use crate::SimulationError;
use serde::Serialize;
use packetsim_types::{ChannelId, DataRate, DeviceId, Frame, Position};
use std::time::Duration;

/// Supplies device positions for distance-dependent channels.
///
/// Implemented by the simulator on top of the mobility models; channels
/// own no position state.
pub trait PositionOracle {
    /// Position of `device` at simulated time `now`, if it has a mobility
    /// model.
    fn position(&mut self, device: DeviceId, now: Duration) -> Option<Position>;
}

/// Oracle for media that do not depend on geometry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPositions;

impl PositionOracle for NoPositions {
    fn position(&mut self, _device: DeviceId, _now: Duration) -> Option<Position> {
        None
    }
}

/// A frame arriving at one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Receiving device.
    pub device: DeviceId,
    /// Arrival time (last bit received).
    pub at: Duration,
}

/// Result of putting one frame on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// When the first bit left the sender.
    pub started_at: Duration,
    /// When the last bit left the sender.
    pub ends_at: Duration,
    /// One entry per receiving device.
    pub deliveries: Vec<Delivery>,
    /// Attached devices that were too far away to receive the frame.
    pub out_of_range: Vec<DeviceId>,
}

/// Channel variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelKind {
    /// Full-duplex link between exactly two devices.
    PointToPoint,
    /// Half-duplex bus shared by any number of devices.
    SharedMedium,
    /// Radio medium with distance-dependent delay and range.
    Wireless,
}

/// A transmission medium.
#[derive(Debug)]
pub enum Channel {
    /// Full-duplex link between two devices.
    PointToPoint(PointToPointChannel),
    /// Shared bus (CSMA).
    SharedMedium(CsmaChannel),
    /// Shared radio medium.
    Wireless(WirelessChannel),
}

impl Channel {
    /// Variant tag.
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::PointToPoint(_) => ChannelKind::PointToPoint,
            Channel::SharedMedium(_) => ChannelKind::SharedMedium,
            Channel::Wireless(_) => ChannelKind::Wireless,
        }
    }

    /// Check the channel's configuration.
    pub fn validate(&self) -> Result<(), SimulationError> {
        match self {
            Channel::PointToPoint(c) => c.config().validate(),
            Channel::SharedMedium(c) => c.config().validate(),
            Channel::Wireless(c) => c.config().validate(),
        }
    }

    /// Attach a device.
    pub(crate) fn attach(&mut self, id: ChannelId, device: DeviceId) -> Result<(), SimulationError> {
        match self {
            Channel::PointToPoint(c) => c.attach(id, device),
            Channel::SharedMedium(c) => {
                c.attach(device);
                Ok(())
            }
            Channel::Wireless(c) => {
                c.attach(device);
                Ok(())
            }
        }
    }

    /// Attached devices in attach order.
    pub fn devices(&self) -> &[DeviceId] {
        match self {
            Channel::PointToPoint(c) => c.devices(),
            Channel::SharedMedium(c) => c.devices(),
            Channel::Wireless(c) => c.devices(),
        }
    }

    /// Rate at which frames are clocked onto the medium.
    pub fn data_rate(&self) -> DataRate {
        match self {
            Channel::PointToPoint(c) => c.config().data_rate,
            Channel::SharedMedium(c) => c.config().data_rate,
            Channel::Wireless(c) => c.config().data_rate,
        }
    }

    /// Bytes of link-layer framing added to every packet.
    pub fn link_overhead(&self) -> u32 {
        match self {
            Channel::PointToPoint(_) => PointToPointChannel::LINK_OVERHEAD,
            Channel::SharedMedium(_) => CsmaChannel::LINK_OVERHEAD,
            Channel::Wireless(_) => WirelessChannel::LINK_OVERHEAD,
        }
    }

    /// Earliest time `from` may start a transmission.
    pub fn ready_at(&self, from: DeviceId) -> Duration {
        match self {
            Channel::PointToPoint(c) => c.ready_at(from),
            Channel::SharedMedium(c) => c.ready_at(),
            Channel::Wireless(c) => c.ready_at(),
        }
    }

    /// Put `frame` on the medium at `now` and compute every arrival.
    ///
    /// The caller must respect [`ready_at`](Self::ready_at); a transmission
    /// requested early starts when the sender becomes ready.
    pub fn transmit(
        &mut self,
        now: Duration,
        from: DeviceId,
        frame: &Frame,
        positions: &mut dyn PositionOracle,
    ) -> Transmission {
        let bytes = frame.wire_size(self.link_overhead());
        match self {
            Channel::PointToPoint(c) => c.transmit(now, from, bytes),
            Channel::SharedMedium(c) => c.transmit(now, from, bytes),
            Channel::Wireless(c) => c.transmit(now, from, bytes, positions),
        }
    }
}
