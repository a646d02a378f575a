//! Tests for deterministic simulation.
//!
//! Same construction calls and seed must give identical event order,
//! packet traces and reports on every run.

use packetsim_apps::{EchoClientConfig, EchoServerConfig, UdpEchoClient, UdpEchoServer};
use packetsim_simulation::mobility::{GridPositionAllocator, RandomWalk2d};
use packetsim_simulation::trace::{PacketLog, TraceRecord};
use packetsim_simulation::{
    AddressAllocator, ApplicationReport, EventQueue, SimulationStats, Simulator, SimulatorConfig,
    WirelessConfig,
};
use packetsim_types::Rectangle;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing_test::traced_test;

/// Replay a random schedule/cancel script and return the execution order.
fn replay_queue(seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut queue = EventQueue::new();
    let mut handles = Vec::new();
    for i in 0..200u32 {
        // Coarse delays force plenty of equal-time ties.
        let delay = Duration::from_millis(rng.gen_range(0..20) * 10);
        handles.push(queue.schedule(delay, i));
    }
    for _ in 0..20 {
        let victim = handles[rng.gen_range(0..handles.len())];
        queue.cancel(victim);
    }

    let mut order = Vec::new();
    queue.run_until(None, |q, e| {
        order.push(e);
        if e % 7 == 0 {
            q.schedule(Duration::from_millis(5), e + 1000);
        }
    });
    order
}

#[test]
fn test_event_queue_replays_identically() {
    assert_eq!(replay_queue(42), replay_queue(42));
}

/// A mobile WLAN: station 0 serves, the last station sends.
fn wlan_run(seed: u64) -> (SimulationStats, Vec<ApplicationReport>, Vec<TraceRecord>) {
    let config = SimulatorConfig::default()
        .with_seed(seed)
        .with_stop_time(Duration::from_secs(10));
    let mut sim = Simulator::new(config).unwrap();
    let stations = sim.add_nodes(4);

    let radio = WirelessConfig::default()
        .with_range(60.0)
        .with_rts_cts_threshold(Some(0));
    let (_, devices) = sim.install_wireless(&stations, radio).unwrap();
    let mut allocator =
        AddressAllocator::new(Ipv4Addr::new(10, 1, 3, 0), Ipv4Addr::new(255, 255, 255, 0))
            .unwrap();
    sim.assign_addresses(&devices, &mut allocator).unwrap();

    let bounds = Rectangle::new(-50.0, 50.0, -50.0, 50.0);
    let grid = GridPositionAllocator::new(0.0, 0.0, 5.0, 10.0, 3);
    for (&station, start) in stations.iter().zip(grid) {
        let rng = sim.node_rng(station);
        sim.set_mobility(station, Box::new(RandomWalk2d::new(start, bounds, rng)))
            .unwrap();
    }

    let log = PacketLog::new();
    sim.add_observer(Box::new(log.clone()));

    let server = UdpEchoServer::new(EchoServerConfig::with_port(9)).unwrap();
    sim.install_application(stations[0], Box::new(server), Duration::ZERO, None)
        .unwrap();
    let remote = SocketAddrV4::new(Ipv4Addr::new(10, 1, 3, 1), 9);
    let client = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(8)
            .with_interval(Duration::from_secs(1))
            .with_packet_size(512),
    )
    .unwrap();
    sim.install_application(stations[3], Box::new(client), Duration::from_secs(1), None)
        .unwrap();

    let stats = sim.run().unwrap();
    (stats, sim.application_reports(), log.records())
}

#[traced_test]
#[test]
fn test_same_seed_same_run() {
    let first = wlan_run(12345);
    let second = wlan_run(12345);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2);
    assert_eq!(first.1[1].sent, 8);
}
