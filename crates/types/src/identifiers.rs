//! Domain-specific identifier types.
//!
//! Identifiers are dense indices handed out in creation order, so a
//! `Vec` indexed by `id.index()` is the natural storage for the entities
//! they name.

use serde::Serialize;
use std::fmt;

/// Simulation node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of this node in the simulator's node table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Network device identifier, unique across the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Position of this device in the simulator's device table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({})", self.0)
    }
}

/// Channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Position of this channel in the simulator's channel table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

/// Application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl AppId {
    /// Position of this application in the simulator's application table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "App({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        assert_eq!(NodeId(3).to_string(), "Node(3)");
        assert_eq!(DeviceId(0).to_string(), "Device(0)");
        assert_eq!(ChannelId(7).to_string(), "Channel(7)");
        assert_eq!(AppId(12).to_string(), "App(12)");
    }

    #[test]
    fn test_identifier_ordering_follows_creation_order() {
        assert!(NodeId(1) < NodeId(2));
        assert!(DeviceId(0) < DeviceId(10));
        assert_eq!(NodeId(5).index(), 5);
    }
}
