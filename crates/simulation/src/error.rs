//! Error types for simulation setup and execution.

use packetsim_types::{AppId, ChannelId, DeviceId, NodeId};
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building or running a simulation.
///
/// All of these are configuration or programming errors. Expected runtime
/// outcomes such as a frame reaching the wrong address, a receiver out of
/// range or a packet with no route are counted in
/// [`SimulationStats`](crate::SimulationStats) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// An event was scheduled before the current simulated time.
    #[error("cannot schedule at {requested:?}: simulated time is already {now:?}")]
    InvalidDelay {
        /// Requested execution time.
        requested: Duration,
        /// Current simulated time.
        now: Duration,
    },

    /// An application's stop time precedes its start time.
    #[error("stop time {stop:?} precedes start time {start:?}")]
    InvalidSchedule {
        /// Requested start time.
        start: Duration,
        /// Requested stop time.
        stop: Duration,
    },

    /// A device tried to send without a channel.
    #[error("{device} has no channel attached")]
    NoChannelAttached {
        /// Offending device.
        device: DeviceId,
    },

    /// Node id not known to this simulator.
    #[error("unknown {0}")]
    UnknownNode(NodeId),

    /// Device id not known to this simulator.
    #[error("unknown {0}")]
    UnknownDevice(DeviceId),

    /// Channel id not known to this simulator.
    #[error("unknown {0}")]
    UnknownChannel(ChannelId),

    /// Application id not known to this simulator.
    #[error("unknown {0}")]
    UnknownApplication(AppId),

    /// A point-to-point channel already has both endpoints.
    #[error("{channel} already has two devices attached")]
    ChannelFull {
        /// Full channel.
        channel: ChannelId,
    },

    /// The device is already attached to a channel.
    #[error("{device} is already attached to {channel}")]
    DeviceAlreadyAttached {
        /// Device being attached.
        device: DeviceId,
        /// Channel it is attached to.
        channel: ChannelId,
    },

    /// The application already has start/stop events registered.
    #[error("{0} is already scheduled")]
    AlreadyScheduled(AppId),

    /// Another application on the node holds the port.
    #[error("port {port} on {node} is already bound")]
    PortInUse {
        /// Node owning the socket table.
        node: NodeId,
        /// Requested port.
        port: u16,
    },

    /// An application asked to send more than one UDP datagram can carry.
    #[error("{app} tried to send {payload_size} bytes; the UDP limit is {max}")]
    PayloadTooLarge {
        /// Sending application.
        app: AppId,
        /// Requested payload size.
        payload_size: u32,
        /// Largest allowed payload.
        max: u32,
    },

    /// The address allocator ran past the end of its subnet.
    #[error("no free host address left in {network}/{prefix_len}")]
    AddressExhausted {
        /// Subnet network address.
        network: Ipv4Addr,
        /// Subnet prefix length.
        prefix_len: u8,
    },

    /// A typed configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
