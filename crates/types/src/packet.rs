//! Packets and link-layer frames.

use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

/// IPv4 header size without options.
pub const IPV4_HEADER_BYTES: u32 = 20;

/// UDP header size.
pub const UDP_HEADER_BYTES: u32 = 8;

/// Largest UDP payload that fits in one IPv4 datagram.
pub const MAX_UDP_PAYLOAD: u32 = 65_507;

/// A UDP datagram travelling through the simulation.
///
/// Packets are immutable once created: channels deliver copies by value and
/// nothing rewrites them in flight. Forwarding routers wrap the same packet
/// in a fresh [`Frame`] for the next hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    /// Unique id, assigned by the simulator in creation order.
    pub uid: u64,
    /// Sending socket.
    pub src: SocketAddrV4,
    /// Destination socket.
    pub dst: SocketAddrV4,
    /// Application payload size in bytes.
    pub payload_size: u32,
    /// Application header carried inside the payload. Echo servers copy
    /// it back unchanged.
    pub tag: u64,
    /// Simulated time at which the application handed the packet down.
    pub sent_at: Duration,
}

impl Packet {
    /// Size of the packet at the network layer (payload + UDP + IPv4 headers).
    pub fn wire_size(&self) -> u64 {
        u64::from(self.payload_size) + u64::from(UDP_HEADER_BYTES + IPV4_HEADER_BYTES)
    }
}

/// Link-layer envelope around a [`Packet`] for one hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Carried packet.
    pub packet: Packet,
    /// Address of the transmitting interface.
    pub link_src: Ipv4Addr,
    /// Address of the next hop. Only the device owning this address
    /// accepts the frame.
    pub link_dst: Ipv4Addr,
}

impl Frame {
    /// Wrap `packet` for transmission from `link_src` towards `link_dst`.
    pub fn new(packet: Packet, link_src: Ipv4Addr, link_dst: Ipv4Addr) -> Self {
        Self {
            packet,
            link_src,
            link_dst,
        }
    }

    /// Frame size on the medium given a per-frame link overhead.
    pub fn wire_size(&self, link_overhead: u32) -> u64 {
        self.packet.wire_size() + u64::from(link_overhead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet(payload_size: u32) -> Packet {
        Packet {
            uid: 1,
            src: SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 1), 49153),
            dst: SocketAddrV4::new(Ipv4Addr::new(192, 168, 2, 6), 64),
            payload_size,
            tag: 0,
            sent_at: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_packet_wire_size_includes_headers() {
        assert_eq!(sample_packet(1024).wire_size(), 1052);
        assert_eq!(sample_packet(0).wire_size(), 28);
    }

    #[test]
    fn test_wire_size_of_largest_payload_does_not_overflow() {
        assert_eq!(sample_packet(u32::MAX).wire_size(), u64::from(u32::MAX) + 28);
        let frame = Frame::new(sample_packet(u32::MAX), Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST);
        assert_eq!(frame.wire_size(36), u64::from(u32::MAX) + 64);
    }

    #[test]
    fn test_frame_wire_size_adds_link_overhead() {
        let packet = sample_packet(1024);
        let frame = Frame::new(packet, Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2));
        assert_eq!(frame.wire_size(2), 1054);
        assert_eq!(frame.wire_size(18), 1070);
    }
}
