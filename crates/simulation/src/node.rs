//! Simulation nodes and their UDP socket tables.

use crate::routing::RoutingTable;
use crate::SimulationError;
use indexmap::IndexMap;
use packetsim_types::{AppId, DeviceId, NodeId};

/// First port handed out when an application binds without asking for one.
pub const EPHEMERAL_PORT_START: u16 = 49153;

/// An addressable participant: a set of devices plus an IPv4/UDP stack.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) devices: Vec<DeviceId>,
    pub(crate) routes: RoutingTable,

    /// Bound UDP ports, in bind order.
    sockets: IndexMap<u16, AppId>,

    next_ephemeral: u16,
}

impl Node {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            devices: Vec::new(),
            routes: RoutingTable::default(),
            sockets: IndexMap::new(),
            next_ephemeral: EPHEMERAL_PORT_START,
        }
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Devices owned by this node, in creation order.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// The node's forwarding table.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Application bound to `port`, if any.
    pub fn socket(&self, port: u16) -> Option<AppId> {
        self.sockets.get(&port).copied()
    }

    /// Bind `app` to `port`, or to the next free ephemeral port.
    pub(crate) fn bind(&mut self, port: Option<u16>, app: AppId) -> Result<u16, SimulationError> {
        let port = match port {
            Some(port) => {
                if self.sockets.get(&port).is_some_and(|&owner| owner != app) {
                    return Err(SimulationError::PortInUse { node: self.id, port });
                }
                port
            }
            None => self.allocate_ephemeral()?,
        };
        self.sockets.insert(port, app);
        Ok(port)
    }

    fn allocate_ephemeral(&mut self) -> Result<u16, SimulationError> {
        let start = self.next_ephemeral;
        loop {
            let candidate = self.next_ephemeral;
            self.next_ephemeral = if candidate == u16::MAX {
                EPHEMERAL_PORT_START
            } else {
                candidate + 1
            };
            if !self.sockets.contains_key(&candidate) {
                return Ok(candidate);
            }
            if self.next_ephemeral == start {
                return Err(SimulationError::PortInUse {
                    node: self.id,
                    port: candidate,
                });
            }
        }
    }

    /// Release every port held by `app`.
    pub(crate) fn unbind(&mut self, app: AppId) {
        self.sockets.retain(|_, owner| *owner != app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_ports_count_up() {
        let mut node = Node::new(NodeId(0));
        assert_eq!(node.bind(None, AppId(0)).unwrap(), 49153);
        assert_eq!(node.bind(None, AppId(1)).unwrap(), 49154);
        assert_eq!(node.socket(49154), Some(AppId(1)));
    }

    #[test]
    fn test_explicit_port_conflict() {
        let mut node = Node::new(NodeId(2));
        node.bind(Some(64), AppId(0)).unwrap();
        assert_eq!(
            node.bind(Some(64), AppId(1)),
            Err(SimulationError::PortInUse {
                node: NodeId(2),
                port: 64
            })
        );
        // Rebinding the same owner is fine.
        assert_eq!(node.bind(Some(64), AppId(0)).unwrap(), 64);
    }

    #[test]
    fn test_ephemeral_skips_taken_ports() {
        let mut node = Node::new(NodeId(0));
        node.bind(Some(EPHEMERAL_PORT_START), AppId(0)).unwrap();
        assert_eq!(node.bind(None, AppId(1)).unwrap(), EPHEMERAL_PORT_START + 1);
    }

    #[test]
    fn test_unbind_releases_ports() {
        let mut node = Node::new(NodeId(0));
        node.bind(Some(9), AppId(3)).unwrap();
        node.unbind(AppId(3));
        assert_eq!(node.socket(9), None);
    }
}
