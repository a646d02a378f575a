//! Infrastructure WLAN with mobile stations.
//!
//! One access point and `n_wifi` stations share a 54 Mbps radio channel
//! with RTS/CTS protecting every frame. Stations start on a 3-wide grid
//! and random-walk inside a 200 m × 200 m box; the access point stays
//! put. Station 0 runs an echo server on port 20, stations 4 and 5 send
//! it two packets each.

use super::finish;
use crate::{ScenarioError, ScenarioReport, WlanConfig};
use packetsim_apps::{EchoClientConfig, EchoServerConfig, UdpEchoClient, UdpEchoServer};
use packetsim_simulation::mobility::{ConstantPosition, GridPositionAllocator, RandomWalk2d};
use packetsim_simulation::trace::{LoggingObserver, PacketLog};
use packetsim_simulation::{AddressAllocator, Simulator, SimulatorConfig, WirelessConfig};
use packetsim_types::{DataRate, Rectangle};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::info;

/// Scenario name used in reports and on the command line.
pub const NAME: &str = "wlan";

/// Echo server port.
pub const SERVER_PORT: u16 = 20;

/// Every station stays inside this box.
pub const WALK_BOUNDS: Rectangle = Rectangle::new(-100.0, 100.0, -100.0, 100.0);

const STOP_TIME: Duration = Duration::from_secs(10);
const PACKET_SIZE: u32 = 1024;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Build and run the scenario.
///
/// Fails with [`ScenarioError::StationCount`] before building anything if
/// `n_wifi` is outside the supported range.
pub fn run(config: &WlanConfig) -> Result<ScenarioReport, ScenarioError> {
    config.validate()?;
    info!(
        n_wifi = config.n_wifi,
        tracing = config.tracing,
        seed = config.seed,
        "Building WLAN topology"
    );

    let sim_config = SimulatorConfig::new()
        .with_seed(config.seed)
        .with_stop_time(STOP_TIME);
    let mut sim = Simulator::new(sim_config)?;

    let ap = sim.add_node();
    let stations = sim.add_nodes(config.n_wifi as usize);

    let radio = WirelessConfig::default()
        .with_data_rate(DataRate::from_mbps(54))
        .with_rts_cts_threshold(Some(0));
    let mut members = stations.clone();
    members.push(ap);
    let (_, devices) = sim.install_wireless(&members, radio)?;
    let ap_device = devices[stations.len()];

    // Stations take the first grid slots, the access point the next one.
    let mut grid = GridPositionAllocator::new(0.0, 0.0, 5.0, 10.0, 3);
    for (index, (&station, start)) in stations.iter().zip(&mut grid).enumerate() {
        let mut walk = RandomWalk2d::new(start, WALK_BOUNDS, sim.node_rng(station));
        if index == 5 {
            walk = walk.with_label(format!("station-5 ({station})"));
        }
        sim.set_mobility(station, Box::new(walk))?;
    }
    let ap_position = grid.next().unwrap_or_default();
    sim.set_mobility(ap, Box::new(ConstantPosition(ap_position)))?;

    // Stations are numbered first, the access point last.
    let mut subnet =
        AddressAllocator::new(Ipv4Addr::new(192, 168, 1, 0), Ipv4Addr::new(255, 255, 255, 0))?;
    let addresses = sim.assign_addresses(&devices, &mut subnet)?;

    let server = UdpEchoServer::new(EchoServerConfig::with_port(SERVER_PORT))?;
    sim.install_application(stations[0], Box::new(server), Duration::ZERO, Some(STOP_TIME))?;

    let remote = SocketAddrV4::new(addresses[0], SERVER_PORT);
    let slow = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(2)
            .with_interval(secs(2))
            .with_packet_size(PACKET_SIZE),
    )?;
    sim.install_application(stations[5], Box::new(slow), secs(2), Some(STOP_TIME))?;

    let fast = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(2)
            .with_interval(secs(1))
            .with_packet_size(PACKET_SIZE),
    )?;
    sim.install_application(stations[4], Box::new(fast), secs(3), Some(STOP_TIME))?;

    sim.populate_routing_tables();

    let capture = PacketLog::for_devices([devices[5], ap_device]);
    sim.add_observer(Box::new(capture.clone()));
    if config.tracing {
        sim.add_observer(Box::new(LoggingObserver));
    }

    finish(NAME, config.seed, sim, capture)
}
