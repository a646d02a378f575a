//! Arrival times and receiver sets for each channel variant.

use packetsim_apps::{EchoClientConfig, EchoServerConfig, UdpEchoClient, UdpEchoServer};
use packetsim_simulation::mobility::ConstantPosition;
use packetsim_simulation::trace::{DropReason, PacketLog, TraceKind};
use packetsim_simulation::{
    CsmaConfig, PointToPointConfig, Simulator, SimulatorConfig, WirelessConfig,
};
use packetsim_types::{DataRate, DeviceId, Frame, Packet, Position};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

fn lan_address(host: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 2, host)
}

fn frame_to(host: u8, payload_size: u32) -> Frame {
    let packet = Packet {
        uid: u64::from(host),
        src: SocketAddrV4::new(lan_address(1), 49153),
        dst: SocketAddrV4::new(lan_address(host), 9),
        payload_size,
        tag: 0,
        sent_at: Duration::ZERO,
    };
    Frame::new(packet, lan_address(1), lan_address(host))
}

#[test]
fn test_point_to_point_arrival_time() {
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

    let log = PacketLog::for_devices([devices[1]]);
    sim.add_observer(Box::new(log.clone()));

    let server = UdpEchoServer::new(EchoServerConfig::with_port(9)).unwrap();
    sim.install_application(nodes[1], Box::new(server), Duration::ZERO, None)
        .unwrap();
    let remote = SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 2), 9);
    let client = UdpEchoClient::new(
        EchoClientConfig::new(remote)
            .with_max_packets(1)
            .with_packet_size(1024),
    )
    .unwrap();
    sim.install_application(nodes[0], Box::new(client), Duration::from_secs(2), None)
        .unwrap();

    sim.run().unwrap();

    let arrival = log
        .records()
        .iter()
        .find(|r| r.kind == TraceKind::Receive)
        .map(|r| r.time)
        .unwrap();

    // Payload alone: 1024 * 8 / 10 Mbps = 819.2 µs
    let lower_bound =
        Duration::from_secs(2) + Duration::from_millis(1) + Duration::from_nanos(819_200);
    assert!(arrival >= lower_bound);
    // With IP/UDP and PPP headers: 1054 B = 843.2 µs
    assert_eq!(
        arrival,
        Duration::from_secs(2) + Duration::from_millis(1) + Duration::from_nanos(843_200)
    );
}

#[test]
fn test_shared_medium_reaches_everyone_but_sender() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    let nodes = sim.add_nodes(4);
    let bus = CsmaConfig::default()
        .with_data_rate(DataRate::from_mbps(100))
        .with_delay(Duration::from_micros(10));
    let (_, devices) = sim.install_csma(&nodes, bus).unwrap();
    for (i, &device) in devices.iter().enumerate() {
        sim.assign_address(device, lan_address(i as u8 + 1), 24)
            .unwrap();
    }

    let log = PacketLog::new();
    sim.add_observer(Box::new(log.clone()));

    // 954 B payload + 28 B IP/UDP + 18 B Ethernet = 1000 B = 80 µs at 100 Mbps
    sim.send_frame(devices[0], frame_to(3, 954)).unwrap();
    let stats = sim.run().unwrap();

    let records = log.records();
    let heard: Vec<(Option<DeviceId>, TraceKind, Duration)> = records
        .iter()
        .filter(|r| r.kind != TraceKind::Transmit)
        .map(|r| (r.device, r.kind, r.time))
        .collect();
    let arrival = Duration::from_micros(90);
    assert_eq!(
        heard,
        vec![
            (
                Some(devices[1]),
                TraceKind::Drop(DropReason::AddressMismatch),
                arrival
            ),
            (Some(devices[2]), TraceKind::Receive, arrival),
            // Node 2 has nothing bound to port 9.
            (None, TraceKind::Drop(DropReason::NoSocket), arrival),
            (
                Some(devices[3]),
                TraceKind::Drop(DropReason::AddressMismatch),
                arrival
            ),
        ]
    );
    assert_eq!(stats.frames_delivered, 1);
    assert_eq!(stats.frames_address_mismatch, 2);
    assert_eq!(stats.packets_no_socket, 1);
}

#[test]
fn test_busy_medium_defers_second_sender() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    let nodes = sim.add_nodes(3);
    let bus = CsmaConfig::default()
        .with_data_rate(DataRate::from_mbps(100))
        .with_delay(Duration::from_micros(10));
    let (_, devices) = sim.install_csma(&nodes, bus).unwrap();
    for (i, &device) in devices.iter().enumerate() {
        sim.assign_address(device, lan_address(i as u8 + 1), 24)
            .unwrap();
    }

    let log = PacketLog::for_devices([devices[2]]);
    sim.add_observer(Box::new(log.clone()));

    sim.send_frame(devices[0], frame_to(3, 954)).unwrap();
    sim.send_frame(devices[1], frame_to(3, 954)).unwrap();
    let stats = sim.run().unwrap();

    let arrivals: Vec<Duration> = log
        .records()
        .iter()
        .filter(|r| r.kind == TraceKind::Receive)
        .map(|r| r.time)
        .collect();
    // Second frame starts once the first has cleared the bus (90 µs),
    // then takes another 80 µs + 10 µs.
    assert_eq!(
        arrivals,
        vec![Duration::from_micros(90), Duration::from_micros(180)]
    );
    assert_eq!(stats.frames_deferred, 1);
    assert_eq!(stats.frames_transmitted, 2);
}

#[test]
fn test_wireless_range_and_distance_delay() {
    let mut sim = Simulator::new(SimulatorConfig::default()).unwrap();
    let nodes = sim.add_nodes(3);
    let radio = WirelessConfig::default()
        .with_data_rate(DataRate::from_mbps(54))
        .with_range(100.0);
    let (_, devices) = sim.install_wireless(&nodes, radio).unwrap();
    for (i, &device) in devices.iter().enumerate() {
        sim.assign_address(device, lan_address(i as u8 + 1), 24)
            .unwrap();
    }
    sim.set_mobility(nodes[0], Box::new(ConstantPosition(Position::new(0.0, 0.0))))
        .unwrap();
    sim.set_mobility(nodes[1], Box::new(ConstantPosition(Position::new(150.0, 0.0))))
        .unwrap();
    sim.set_mobility(nodes[2], Box::new(ConstantPosition(Position::new(30.0, 40.0))))
        .unwrap();

    let log = PacketLog::new();
    sim.add_observer(Box::new(log.clone()));

    sim.send_frame(devices[0], frame_to(3, 100)).unwrap();
    let stats = sim.run().unwrap();

    assert_eq!(stats.frames_out_of_range, 1);
    assert_eq!(stats.frames_delivered, 1);

    let records = log.records();
    let far = records
        .iter()
        .find(|r| r.device == Some(devices[1]))
        .unwrap();
    assert_eq!(far.kind, TraceKind::Drop(DropReason::OutOfRange));

    // 164 B at 54 Mbps, rounded up, plus 50 m of propagation.
    let tx = DataRate::from_mbps(54).transmission_time(164);
    let flight = Duration::from_secs_f64(50.0 / packetsim_simulation::SPEED_OF_LIGHT);
    let arrival = records
        .iter()
        .find(|r| r.kind == TraceKind::Receive)
        .map(|r| r.time)
        .unwrap();
    assert_eq!(arrival, tx + flight);
}
