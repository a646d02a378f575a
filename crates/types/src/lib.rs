//! Core value types for the packet simulator.
//!
//! Everything here is plain data: identifiers, link rates, packets and
//! positions. Behaviour lives in `packetsim-core` and
//! `packetsim-simulation`.

mod data_rate;
mod identifiers;
mod packet;
mod position;

pub use data_rate::{DataRate, ParseDataRateError};
pub use identifiers::{AppId, ChannelId, DeviceId, NodeId};
pub use packet::{Frame, Packet, IPV4_HEADER_BYTES, MAX_UDP_PAYLOAD, UDP_HEADER_BYTES};
pub use position::{Position, Rectangle};
