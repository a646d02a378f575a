//! Forwarding tables and global route computation.

use crate::channel::Channel;
use crate::device::{prefix_mask, Device};
use crate::node::Node;
use packetsim_types::{DeviceId, NodeId};
use std::collections::{BTreeSet, VecDeque};
use std::net::Ipv4Addr;

/// One forwarding entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Destination network address.
    pub network: Ipv4Addr,
    /// Destination prefix length.
    pub prefix_len: u8,
    /// Outgoing device.
    pub device: DeviceId,
    /// Next-hop router, or `None` for a directly connected subnet.
    pub gateway: Option<Ipv4Addr>,
    /// Router hops to the destination subnet.
    pub hops: u32,
}

impl Route {
    /// Whether `addr` falls in this route's destination subnet.
    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        let mask = prefix_mask(self.prefix_len);
        u32::from(addr) & mask == u32::from(self.network) & mask
    }
}

/// A node's routes, matched longest prefix first.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    /// All routes, in insertion order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Add a route unless one for the same subnet is already present.
    pub fn add(&mut self, route: Route) {
        let exists = self
            .routes
            .iter()
            .any(|r| r.network == route.network && r.prefix_len == route.prefix_len);
        if !exists {
            self.routes.push(route);
        }
    }

    /// Best route to `dst`: longest prefix, then fewest hops, then
    /// insertion order.
    pub fn lookup(&self, dst: Ipv4Addr) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| r.matches(dst))
            .min_by_key(|r| (std::cmp::Reverse(r.prefix_len), r.hops))
    }
}

/// How a BFS reached a node from the source: first hop out of the source.
#[derive(Debug, Clone, Copy)]
struct Reach {
    hops: u32,
    first_hop: Option<(DeviceId, Ipv4Addr)>,
}

/// Compute forwarding tables for every node.
///
/// For each source node a breadth-first search over channels finds the
/// fewest-hop path to every other node. Devices are explored in id order,
/// so equal-length paths resolve to the lowest device id. Every subnet in
/// the topology then routes through the first hop towards the nearest node
/// on that subnet. Only devices with an interface and a channel take part.
pub(crate) fn compute_routes(
    nodes: &[Node],
    devices: &[Device],
    channels: &[Channel],
) -> Vec<RoutingTable> {
    let subnets: BTreeSet<(u32, u8)> = devices
        .iter()
        .filter_map(|d| d.interface)
        .map(|i| (u32::from(i.network()), i.prefix_len))
        .collect();

    nodes
        .iter()
        .map(|source| {
            let reach = breadth_first(source.id, nodes, devices, channels);
            let mut table = RoutingTable::default();
            for &(network, prefix_len) in &subnets {
                let network = Ipv4Addr::from(network);
                if let Some(route) = route_to(network, prefix_len, &reach, nodes, devices) {
                    table.add(route);
                }
            }
            table
        })
        .collect()
}

fn linked_devices<'a>(node: &'a Node, devices: &'a [Device]) -> impl Iterator<Item = &'a Device> {
    let mut owned: Vec<&Device> = node
        .devices
        .iter()
        .filter_map(|d| devices.get(d.index()))
        .filter(|d| d.interface.is_some() && d.channel.is_some())
        .collect();
    owned.sort_by_key(|d| d.id);
    owned.into_iter()
}

fn breadth_first(
    source: NodeId,
    nodes: &[Node],
    devices: &[Device],
    channels: &[Channel],
) -> Vec<Option<Reach>> {
    let mut reach: Vec<Option<Reach>> = vec![None; nodes.len()];
    reach[source.index()] = Some(Reach {
        hops: 0,
        first_hop: None,
    });
    let mut frontier = VecDeque::from([source]);

    while let Some(current) = frontier.pop_front() {
        let Some(here) = reach[current.index()] else {
            continue;
        };
        for device in linked_devices(&nodes[current.index()], devices) {
            let Some(channel) = device.channel.and_then(|c| channels.get(c.index())) else {
                continue;
            };
            let mut peers: Vec<DeviceId> = channel.devices().to_vec();
            peers.sort();
            for peer in peers.into_iter().filter(|&p| p != device.id) {
                let Some(peer) = devices.get(peer.index()) else {
                    continue;
                };
                let Some(peer_addr) = peer.address() else {
                    continue;
                };
                if reach[peer.node.index()].is_some() {
                    continue;
                }
                let first_hop = here.first_hop.or(Some((device.id, peer_addr)));
                reach[peer.node.index()] = Some(Reach {
                    hops: here.hops + 1,
                    first_hop,
                });
                frontier.push_back(peer.node);
            }
        }
    }
    reach
}

fn subnet_device<'a>(
    node: &'a Node,
    devices: &'a [Device],
    network: Ipv4Addr,
    prefix_len: u8,
) -> Option<&'a Device> {
    linked_devices(node, devices).find(|d| {
        d.interface
            .is_some_and(|i| i.network() == network && i.prefix_len == prefix_len)
    })
}

fn route_to(
    network: Ipv4Addr,
    prefix_len: u8,
    reach: &[Option<Reach>],
    nodes: &[Node],
    devices: &[Device],
) -> Option<Route> {
    let (node, reach) = nodes
        .iter()
        .filter_map(|n| Some((n, reach[n.id.index()]?)))
        .filter(|(n, _)| subnet_device(n, devices, network, prefix_len).is_some())
        .min_by_key(|(n, r)| (r.hops, n.id))?;

    match reach.first_hop {
        None => subnet_device(node, devices, network, prefix_len).map(|device| Route {
            network,
            prefix_len,
            device: device.id,
            gateway: None,
            hops: 0,
        }),
        Some((device, gateway)) => Some(Route {
            network,
            prefix_len,
            device,
            gateway: Some(gateway),
            hops: reach.hops,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(network: [u8; 4], prefix_len: u8, device: u32, hops: u32) -> Route {
        Route {
            network: Ipv4Addr::from(network),
            prefix_len,
            device: DeviceId(device),
            gateway: None,
            hops,
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut table = RoutingTable::default();
        table.add(route([10, 0, 0, 0], 8, 0, 0));
        table.add(route([10, 1, 0, 0], 16, 1, 2));

        assert_eq!(table.lookup(Ipv4Addr::new(10, 1, 2, 3)).unwrap().device, DeviceId(1));
        assert_eq!(table.lookup(Ipv4Addr::new(10, 2, 0, 1)).unwrap().device, DeviceId(0));
        assert!(table.lookup(Ipv4Addr::new(192, 168, 0, 1)).is_none());
    }

    #[test]
    fn test_duplicate_subnet_ignored() {
        let mut table = RoutingTable::default();
        table.add(route([192, 168, 1, 0], 24, 0, 0));
        table.add(route([192, 168, 1, 0], 24, 5, 0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].device, DeviceId(0));
    }
}
