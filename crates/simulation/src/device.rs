//! Network devices.

use packetsim_types::{ChannelId, DeviceId, Frame, NodeId};
use std::collections::VecDeque;
use std::net::Ipv4Addr;

/// An IPv4 interface bound to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interface {
    /// Host address.
    pub address: Ipv4Addr,
    /// Subnet prefix length.
    pub prefix_len: u8,
}

impl Interface {
    /// Netmask for the prefix.
    pub fn mask(&self) -> u32 {
        prefix_mask(self.prefix_len)
    }

    /// Network address of the subnet this interface sits on.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask())
    }

    /// Whether `addr` is on the same subnet.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.address) & self.mask()
    }
}

/// Netmask with the top `prefix_len` bits set.
pub(crate) fn prefix_mask(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        n if n >= 32 => u32::MAX,
        n => u32::MAX << (32 - n),
    }
}

/// A node's attachment point to exactly one channel.
#[derive(Debug)]
pub struct Device {
    pub(crate) id: DeviceId,
    pub(crate) node: NodeId,
    pub(crate) channel: Option<ChannelId>,
    pub(crate) interface: Option<Interface>,

    /// Frames waiting for the medium, oldest first.
    pub(crate) queue: VecDeque<Frame>,

    /// A `DeviceReady` event is already scheduled for this device.
    pub(crate) ready_pending: bool,
}

impl Device {
    pub(crate) fn new(id: DeviceId, node: NodeId) -> Self {
        Self {
            id,
            node,
            channel: None,
            interface: None,
            queue: VecDeque::new(),
            ready_pending: false,
        }
    }

    /// Device id.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Owning node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Attached channel, if any.
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    /// Assigned IPv4 interface, if any.
    pub fn interface(&self) -> Option<Interface> {
        self.interface
    }

    /// Assigned address, if any.
    pub fn address(&self) -> Option<Ipv4Addr> {
        self.interface.map(|i| i.address)
    }

    /// Frames waiting to be transmitted.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether this device is the addressee of `frame`.
    pub fn accepts(&self, frame: &Frame) -> bool {
        self.address() == Some(frame.link_dst)
    }
}
