//! Point-to-point link feeding a shared LAN.
//!
//! ```text
//!   192.168.1.0/24
//! n0 -------------- n1   n2   n3 ... n(1+n_csma)
//!    point-to-point  |    |    |         |
//!                    ==========================
//!                      LAN 192.168.2.0/24
//! ```
//!
//! An echo server listens on port 64 of the last LAN node. Node 1 sends
//! three packets to it and node 0 sends two, the latter crossing the
//! point-to-point link and being forwarded by node 1.

use super::finish;
use crate::{CsmaLanConfig, ScenarioError, ScenarioReport};
use packetsim_apps::{EchoClientConfig, EchoServerConfig, UdpEchoClient, UdpEchoServer};
use packetsim_simulation::trace::PacketLog;
use packetsim_simulation::{
    AddressAllocator, CsmaConfig, PointToPointConfig, Simulator, SimulatorConfig,
};
use packetsim_types::DataRate;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::info;

/// Scenario name used in reports and on the command line.
pub const NAME: &str = "csma-lan";

/// Echo server port.
pub const SERVER_PORT: u16 = 64;

const PACKET_SIZE: u32 = 1024;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Build and run the scenario.
pub fn run(config: &CsmaLanConfig) -> Result<ScenarioReport, ScenarioError> {
    let n_csma = config.n_csma.max(1) as usize;
    info!(n_csma, seed = config.seed, "Building point-to-point + LAN topology");

    let mut sim = Simulator::new(SimulatorConfig::new().with_seed(config.seed))?;

    let p2p_nodes = sim.add_nodes(2);
    let mut lan_nodes = vec![p2p_nodes[1]];
    lan_nodes.extend(sim.add_nodes(n_csma));

    let link = PointToPointConfig::default()
        .with_data_rate(DataRate::from_mbps(10))
        .with_delay(Duration::from_millis(1));
    let (_, p2p_devices) = sim.connect_point_to_point(p2p_nodes[0], p2p_nodes[1], link)?;

    let bus = CsmaConfig::default()
        .with_data_rate(DataRate::from_mbps(100))
        .with_delay(Duration::from_micros(10));
    let (_, lan_devices) = sim.install_csma(&lan_nodes, bus)?;

    let mask = Ipv4Addr::new(255, 255, 255, 0);
    let mut p2p_subnet = AddressAllocator::new(Ipv4Addr::new(192, 168, 1, 0), mask)?;
    sim.assign_addresses(&p2p_devices, &mut p2p_subnet)?;
    let mut lan_subnet = AddressAllocator::new(Ipv4Addr::new(192, 168, 2, 0), mask)?;
    let lan_addresses = sim.assign_addresses(&lan_devices, &mut lan_subnet)?;

    let server = UdpEchoServer::new(EchoServerConfig::with_port(SERVER_PORT))?;
    sim.install_application(lan_nodes[n_csma], Box::new(server), secs(1), Some(secs(10)))?;

    let remote = SocketAddrV4::new(lan_addresses[n_csma], SERVER_PORT);
    let near = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(3)
            .with_interval(secs(2))
            .with_packet_size(PACKET_SIZE),
    )?;
    sim.install_application(p2p_nodes[1], Box::new(near), secs(2), Some(secs(7)))?;

    let far = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(2)
            .with_interval(secs(2))
            .with_packet_size(PACKET_SIZE),
    )?;
    sim.install_application(p2p_nodes[0], Box::new(far), secs(3), Some(secs(6)))?;

    sim.populate_routing_tables();

    // Both link endpoints, plus the first LAN device past the router.
    let capture = PacketLog::for_devices(p2p_devices.iter().copied().chain([lan_devices[1]]));
    sim.add_observer(Box::new(capture.clone()));

    finish(NAME, config.seed, sim, capture)
}
