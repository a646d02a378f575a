//! Echo client send schedules against start/stop times and packet caps.

use packetsim_apps::{EchoClientConfig, EchoServerConfig, UdpEchoClient, UdpEchoServer};
use packetsim_simulation::{AppState, PointToPointConfig, Simulator, SimulatorConfig};
use packetsim_types::{AppId, DataRate};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing_test::traced_test;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Two nodes on a 10 Mbps / 1 ms link with an echo server on port 9 of
/// the second. Returns the simulator and the client's app id.
fn echo_pair(max_packets: u32, start: Duration, stop: Duration) -> (Simulator, AppId) {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    let nodes = sim.add_nodes(2);
    let link = PointToPointConfig::default()
        .with_data_rate(DataRate::from_mbps(10))
        .with_delay(Duration::from_millis(1));
    let (_, devices) = sim.connect_point_to_point(nodes[0], nodes[1], link).unwrap();
    sim.assign_address(devices[0], Ipv4Addr::new(10, 1, 1, 1), 24)
        .unwrap();
    sim.assign_address(devices[1], Ipv4Addr::new(10, 1, 1, 2), 24)
        .unwrap();
    sim.populate_routing_tables();

    let server = UdpEchoServer::new(EchoServerConfig::with_port(9)).unwrap();
    sim.install_application(nodes[1], Box::new(server), secs(1), Some(secs(10)))
        .unwrap();

    let remote = SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 2), 9);
    let client = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(max_packets)
            .with_interval(secs(2))
            .with_packet_size(1024),
    )
    .unwrap();
    let client = sim
        .install_application(nodes[0], Box::new(client), start, Some(stop))
        .unwrap();
    (sim, client)
}

#[traced_test]
#[test]
fn test_packet_cap_and_stop_both_bound_sends() {
    let (mut sim, client) = echo_pair(3, secs(2), secs(7));
    sim.run().unwrap();

    let report = sim.application_report(client).unwrap();
    assert_eq!(report.send_times, vec![secs(2), secs(4), secs(6)]);
    assert_eq!(report.state, AppState::Stopped);
}

#[test]
fn test_stop_time_suppresses_next_send() {
    let (mut sim, client) = echo_pair(2, secs(3), secs(6));
    sim.run().unwrap();

    let report = sim.application_report(client).unwrap();
    assert_eq!(report.send_times, vec![secs(3), secs(5)]);
}

#[test]
fn test_stop_time_alone_caps_unlimited_client() {
    // max_packets = 0 sends until stopped
    let (mut sim, client) = echo_pair(0, secs(3), secs(6));
    let stats = sim.run().unwrap();

    let report = sim.application_report(client).unwrap();
    assert_eq!(report.send_times, vec![secs(3), secs(5)]);
    // The timer armed at t=5 for t=7 is cancelled by the stop.
    assert_eq!(stats.timers_cancelled, 1);
}

#[test]
fn test_echoes_return_after_two_link_traversals() {
    let (mut sim, client) = echo_pair(3, secs(2), secs(7));
    let stats = sim.run().unwrap();

    // 1024 B payload + 28 B IP/UDP + 2 B PPP = 1054 B at 10 Mbps = 843.2 µs,
    // plus 1 ms propagation, each way.
    let one_way = Duration::from_nanos(1_843_200);
    let report = sim.application_report(client).unwrap();
    assert_eq!(
        report.receive_times,
        vec![
            secs(2) + one_way * 2,
            secs(4) + one_way * 2,
            secs(6) + one_way * 2
        ]
    );
    assert_eq!(report.round_trips, vec![one_way * 2; 3]);
    assert_eq!(stats.packets_sent, 6);
    assert_eq!(stats.packets_received, 6);
    assert_eq!(stats.delivery_rate(), 1.0);
}

#[test]
fn test_start_equal_to_stop_sends_nothing() {
    let (mut sim, client) = echo_pair(3, secs(2), secs(2));
    let stats = sim.run().unwrap();

    let report = sim.application_report(client).unwrap();
    assert_eq!(report.send_times, Vec::<Duration>::new());
    assert_eq!(report.state, AppState::Stopped);
    // The zero-delay send timer armed at start is cancelled by the stop.
    assert_eq!(stats.timers_cancelled, 1);
    assert_eq!(stats.packets_sent, 0);
}

#[test]
fn test_server_reports_echoes() {
    let (mut sim, _) = echo_pair(2, secs(3), secs(6));
    sim.run().unwrap();

    let server = sim.application_report(AppId(0)).unwrap();
    assert_eq!(server.name, "UdpEchoServer");
    assert_eq!(server.port, Some(9));
    assert_eq!(server.received, 2);
    assert_eq!(server.sent, 2);
}

#[test]
fn test_run_terminates_with_empty_queue() {
    let (mut sim, _) = echo_pair(3, secs(2), secs(7));
    sim.run().unwrap();
    assert_eq!(sim.pending_events(), 0);
    // The server's stop at t=10 is the last event.
    assert_eq!(sim.now(), secs(10));
}
