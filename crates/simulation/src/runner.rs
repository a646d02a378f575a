//! Deterministic simulation driver.
//!
//! The simulator owns every node, device, channel and application plus the
//! event queue. It pops one event at a time, advances the clock to it and
//! dispatches on the event variant. Handlers only schedule new events; they
//! never run anything out of order.

use crate::application::{AppSlot, ApplicationReport};
use crate::channel::{Channel, CsmaChannel, PointToPointChannel, PositionOracle, WirelessChannel};
use crate::device::{Device, Interface};
use crate::event_queue::{EventHandle, EventQueue};
use crate::mobility::MobilityModel;
use crate::node::Node;
use crate::routing::{compute_routes, Route};
use crate::trace::{DropReason, PacketObserver};
use crate::{
    AddressAllocator, CsmaConfig, PointToPointConfig, SimulationError, SimulatorConfig,
    WirelessConfig,
};
use indexmap::IndexMap;
use packetsim_core::{AppAction, AppEvent, Application, Event};
use packetsim_types::{
    AppId, ChannelId, DeviceId, Frame, NodeId, Packet, Position, MAX_UDP_PAYLOAD,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Application timers set.
    pub timers_set: u64,
    /// Application timers cancelled before they fired.
    pub timers_cancelled: u64,
    /// Datagrams handed down by applications.
    pub packets_sent: u64,
    /// Datagrams delivered to a bound socket.
    pub packets_received: u64,
    /// Datagrams relayed by a node that was not their destination.
    pub packets_forwarded: u64,
    /// Datagrams dropped for lack of a route.
    pub packets_no_route: u64,
    /// Datagrams dropped because nothing was bound to the port.
    pub packets_no_socket: u64,
    /// Frames put on a channel.
    pub frames_transmitted: u64,
    /// Frames accepted by their addressee.
    pub frames_delivered: u64,
    /// Frames that had to wait for the medium or an earlier frame.
    pub frames_deferred: u64,
    /// Frame copies ignored by devices they were not addressed to.
    pub frames_address_mismatch: u64,
    /// Frame copies not heard by a receiver out of range.
    pub frames_out_of_range: u64,
    /// Frames dropped at a full device queue.
    pub frames_queue_full: u64,
}

impl SimulationStats {
    /// Frames lost on the link layer (out of range + queue overflow).
    pub fn frames_dropped(&self) -> u64 {
        self.frames_out_of_range + self.frames_queue_full
    }

    /// Datagrams dropped on the network layer (no route + no socket).
    pub fn packets_dropped(&self) -> u64 {
        self.packets_no_route + self.packets_no_socket
    }

    /// Datagram delivery rate (received / sent).
    pub fn delivery_rate(&self) -> f64 {
        if self.packets_sent == 0 {
            1.0
        } else {
            self.packets_received as f64 / self.packets_sent as f64
        }
    }
}

/// What [`Simulator::destroy`] released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Simulated time when the simulator was destroyed.
    pub final_time: Duration,
    /// Events executed over the simulator's lifetime.
    pub events_processed: u64,
    /// Pending events discarded without running.
    pub events_discarded: usize,
    /// Nodes released.
    pub nodes: usize,
    /// Devices released.
    pub devices: usize,
    /// Channels released.
    pub channels: usize,
    /// Applications released.
    pub applications: usize,
}

/// Deterministic discrete-event network simulator.
///
/// Build a topology with the `add_*`/`install_*`/`connect_*` methods,
/// install applications, then call [`run`](Self::run). Given the same
/// construction calls and seed, every run produces identical results.
pub struct Simulator {
    config: SimulatorConfig,

    /// Global event queue and clock.
    queue: EventQueue<Event>,

    /// Indexed by `NodeId`.
    nodes: Vec<Node>,
    /// Indexed by `DeviceId`.
    devices: Vec<Device>,
    /// Indexed by `ChannelId`.
    channels: Vec<Channel>,
    /// Indexed by `AppId`.
    apps: Vec<AppSlot>,

    /// Position models, keyed by node in insertion order.
    mobility: IndexMap<NodeId, Box<dyn MobilityModel>>,

    observers: Vec<Box<dyn PacketObserver>>,

    stats: SimulationStats,

    /// Pending global stop event.
    stop_handle: Option<EventHandle>,
    /// Whether the configured stop time has been turned into an event.
    stop_scheduled: bool,

    next_packet_uid: u64,
}

/// Position lookup over the simulator's devices and mobility models.
struct DevicePositions<'a> {
    devices: &'a [Device],
    mobility: &'a mut IndexMap<NodeId, Box<dyn MobilityModel>>,
}

impl PositionOracle for DevicePositions<'_> {
    fn position(&mut self, device: DeviceId, now: Duration) -> Option<Position> {
        let node = self.devices.get(device.index())?.node;
        self.mobility.get_mut(&node).map(|m| m.position(now))
    }
}

impl Simulator {
    /// Create an empty simulator.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        info!(seed = config.seed, stop_time = ?config.stop_time, "Simulator created");
        Ok(Self {
            config,
            queue: EventQueue::new(),
            nodes: Vec::new(),
            devices: Vec::new(),
            channels: Vec::new(),
            apps: Vec::new(),
            mobility: IndexMap::new(),
            observers: Vec::new(),
            stats: SimulationStats::default(),
            stop_handle: None,
            stop_scheduled: false,
            next_packet_uid: 0,
        })
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Simulator configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Statistics so far.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Number of pending events.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// A deterministic RNG for `node`, derived from the simulator seed.
    pub fn node_rng(&self, node: NodeId) -> ChaCha8Rng {
        let seed = self
            .config
            .seed
            .wrapping_add(u64::from(node.0))
            .wrapping_mul(0x517cc1b727220a95);
        ChaCha8Rng::seed_from_u64(seed)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Topology
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a node with no devices.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id));
        id
    }

    /// Add `count` nodes.
    pub fn add_nodes(&mut self, count: usize) -> Vec<NodeId> {
        (0..count).map(|_| self.add_node()).collect()
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Result<&Node, SimulationError> {
        self.nodes
            .get(id.index())
            .ok_or(SimulationError::UnknownNode(id))
    }

    /// Look up a device.
    pub fn device(&self, id: DeviceId) -> Result<&Device, SimulationError> {
        self.devices
            .get(id.index())
            .ok_or(SimulationError::UnknownDevice(id))
    }

    /// Look up a channel.
    pub fn channel(&self, id: ChannelId) -> Result<&Channel, SimulationError> {
        self.channels
            .get(id.index())
            .ok_or(SimulationError::UnknownChannel(id))
    }

    /// Add an unattached device to `node`.
    pub fn add_device(&mut self, node: NodeId) -> Result<DeviceId, SimulationError> {
        self.node(node)?;
        let id = DeviceId(self.devices.len() as u32);
        self.devices.push(Device::new(id, node));
        self.nodes[node.index()].devices.push(id);
        Ok(id)
    }

    /// Add a channel with no devices.
    pub fn add_channel(&mut self, channel: Channel) -> Result<ChannelId, SimulationError> {
        channel.validate()?;
        let id = ChannelId(self.channels.len() as u32);
        self.channels.push(channel);
        Ok(id)
    }

    /// Attach `device` to `channel`.
    pub fn attach(&mut self, device: DeviceId, channel: ChannelId) -> Result<(), SimulationError> {
        if let Some(existing) = self.device(device)?.channel {
            return Err(SimulationError::DeviceAlreadyAttached {
                device,
                channel: existing,
            });
        }
        self.channels
            .get_mut(channel.index())
            .ok_or(SimulationError::UnknownChannel(channel))?
            .attach(channel, device)?;
        self.devices[device.index()].channel = Some(channel);
        Ok(())
    }

    /// Connect two nodes with a new point-to-point link.
    ///
    /// Returns the channel and the device created on `a` and on `b`.
    pub fn connect_point_to_point(
        &mut self,
        a: NodeId,
        b: NodeId,
        config: PointToPointConfig,
    ) -> Result<(ChannelId, [DeviceId; 2]), SimulationError> {
        self.node(a)?;
        self.node(b)?;
        let channel = self.add_channel(Channel::PointToPoint(PointToPointChannel::new(config)))?;
        let devices = self.install_devices(&[a, b], channel)?;
        Ok((channel, [devices[0], devices[1]]))
    }

    /// Put every node in `nodes` on one new shared bus.
    pub fn install_csma(
        &mut self,
        nodes: &[NodeId],
        config: CsmaConfig,
    ) -> Result<(ChannelId, Vec<DeviceId>), SimulationError> {
        for &node in nodes {
            self.node(node)?;
        }
        let channel = self.add_channel(Channel::SharedMedium(CsmaChannel::new(config)))?;
        let devices = self.install_devices(nodes, channel)?;
        Ok((channel, devices))
    }

    /// Put every node in `nodes` on one new radio channel.
    pub fn install_wireless(
        &mut self,
        nodes: &[NodeId],
        config: WirelessConfig,
    ) -> Result<(ChannelId, Vec<DeviceId>), SimulationError> {
        for &node in nodes {
            self.node(node)?;
        }
        let channel = self.add_channel(Channel::Wireless(WirelessChannel::new(config)))?;
        let devices = self.install_devices(nodes, channel)?;
        Ok((channel, devices))
    }

    fn install_devices(
        &mut self,
        nodes: &[NodeId],
        channel: ChannelId,
    ) -> Result<Vec<DeviceId>, SimulationError> {
        let mut devices = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let device = self.add_device(node)?;
            self.attach(device, channel)?;
            devices.push(device);
        }
        debug!(
            %channel,
            kind = ?self.channels.get(channel.index()).map(Channel::kind),
            devices = devices.len(),
            "Channel installed"
        );
        Ok(devices)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Addressing and routing
    // ═══════════════════════════════════════════════════════════════════════

    /// Give `device` an IPv4 interface and a connected route for its subnet.
    pub fn assign_address(
        &mut self,
        device: DeviceId,
        address: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<(), SimulationError> {
        self.device(device)?;
        if prefix_len > 32 {
            return Err(SimulationError::InvalidConfig(format!(
                "prefix length {prefix_len} exceeds 32"
            )));
        }
        let interface = Interface {
            address,
            prefix_len,
        };
        let dev = &mut self.devices[device.index()];
        dev.interface = Some(interface);
        let node = dev.node;
        self.nodes[node.index()].routes.add(Route {
            network: interface.network(),
            prefix_len,
            device,
            gateway: None,
            hops: 0,
        });
        debug!(%device, %node, %address, prefix_len, "Address assigned");
        Ok(())
    }

    /// Assign consecutive addresses from `allocator` to `devices`, in order.
    pub fn assign_addresses(
        &mut self,
        devices: &[DeviceId],
        allocator: &mut AddressAllocator,
    ) -> Result<Vec<Ipv4Addr>, SimulationError> {
        let mut addresses = Vec::with_capacity(devices.len());
        for &device in devices {
            self.device(device)?;
            let address = allocator.next_address()?;
            self.assign_address(device, address, allocator.prefix_len())?;
            addresses.push(address);
        }
        Ok(addresses)
    }

    /// Address of `device`, if assigned.
    pub fn device_address(&self, device: DeviceId) -> Option<Ipv4Addr> {
        self.devices.get(device.index()).and_then(Device::address)
    }

    /// First assigned address of `node`, by device order.
    pub fn node_address(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.nodes
            .get(node.index())?
            .devices
            .iter()
            .find_map(|&d| self.device_address(d))
    }

    fn owns_address(&self, node: NodeId, address: Ipv4Addr) -> bool {
        self.nodes[node.index()]
            .devices
            .iter()
            .any(|&d| self.device_address(d) == Some(address))
    }

    /// Compute routes between every node and every subnet in the topology.
    ///
    /// Replaces each node's forwarding table. Call after all channels are
    /// installed and addresses assigned.
    pub fn populate_routing_tables(&mut self) {
        let tables = compute_routes(&self.nodes, &self.devices, &self.channels);
        for (node, table) in self.nodes.iter_mut().zip(tables) {
            debug!(node = %node.id, routes = table.len(), "Routing table populated");
            node.routes = table;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mobility and observers
    // ═══════════════════════════════════════════════════════════════════════

    /// Give `node` a position model. Replaces any earlier one.
    pub fn set_mobility(
        &mut self,
        node: NodeId,
        model: Box<dyn MobilityModel>,
    ) -> Result<(), SimulationError> {
        self.node(node)?;
        self.mobility.insert(node, model);
        Ok(())
    }

    /// Position of `node` at the current time, if it has a model.
    pub fn position_of(&mut self, node: NodeId) -> Option<Position> {
        let now = self.now();
        self.mobility.get_mut(&node).map(|m| m.position(now))
    }

    /// Attach a passive packet observer.
    pub fn add_observer(&mut self, observer: Box<dyn PacketObserver>) {
        self.observers.push(observer);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Applications
    // ═══════════════════════════════════════════════════════════════════════

    /// Bind `app` to `node` without scheduling it.
    pub fn add_application(
        &mut self,
        node: NodeId,
        app: Box<dyn Application>,
    ) -> Result<AppId, SimulationError> {
        self.node(node)?;
        let id = AppId(self.apps.len() as u32);
        self.apps.push(AppSlot::new(node, app));
        Ok(id)
    }

    /// Queue the start (and optional stop) event for `app`.
    pub fn schedule_application(
        &mut self,
        app: AppId,
        start: Duration,
        stop: Option<Duration>,
    ) -> Result<(), SimulationError> {
        self.check_schedule(start, stop)?;
        let slot = self
            .apps
            .get_mut(app.index())
            .ok_or(SimulationError::UnknownApplication(app))?;
        if !slot.state.schedule() {
            return Err(SimulationError::AlreadyScheduled(app));
        }
        slot.start_handle = Some(self.queue.schedule_at(start, Event::ApplicationStart { app })?);
        if let Some(stop) = stop {
            slot.stop_handle = Some(self.queue.schedule_at(stop, Event::ApplicationStop { app })?);
        }
        debug!(%app, node = %slot.node, ?start, ?stop, "Application scheduled");
        Ok(())
    }

    /// Add `app` to `node` and schedule it in one step.
    ///
    /// Nothing is added if the schedule is invalid.
    pub fn install_application(
        &mut self,
        node: NodeId,
        app: Box<dyn Application>,
        start: Duration,
        stop: Option<Duration>,
    ) -> Result<AppId, SimulationError> {
        self.node(node)?;
        self.check_schedule(start, stop)?;
        let id = self.add_application(node, app)?;
        self.schedule_application(id, start, stop)?;
        Ok(id)
    }

    fn check_schedule(&self, start: Duration, stop: Option<Duration>) -> Result<(), SimulationError> {
        if let Some(stop) = stop {
            if stop < start {
                return Err(SimulationError::InvalidSchedule { start, stop });
            }
        }
        if start < self.now() {
            return Err(SimulationError::InvalidDelay {
                requested: start,
                now: self.now(),
            });
        }
        Ok(())
    }

    /// Activity summary for one application.
    pub fn application_report(&self, app: AppId) -> Result<ApplicationReport, SimulationError> {
        self.apps
            .get(app.index())
            .map(AppSlot::report)
            .ok_or(SimulationError::UnknownApplication(app))
    }

    /// Activity summaries for every application, by id.
    pub fn application_reports(&self) -> Vec<ApplicationReport> {
        self.apps.iter().map(AppSlot::report).collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Running
    // ═══════════════════════════════════════════════════════════════════════

    /// Schedule the global stop event at `time`, replacing any earlier one.
    pub fn stop_at(&mut self, time: Duration) -> Result<(), SimulationError> {
        let handle = self.queue.schedule_at(time, Event::SimulationStop)?;
        if let Some(old) = self.stop_handle.replace(handle) {
            self.queue.cancel(old);
        }
        self.stop_scheduled = true;
        Ok(())
    }

    /// Run until the queue empties or the stop event fires.
    pub fn run(&mut self) -> Result<SimulationStats, SimulationError> {
        self.run_until(None)
    }

    /// Run until the queue empties, the stop event fires or the next event
    /// lies beyond `horizon`. The clock ends at `horizon` if the queue
    /// drained first.
    pub fn run_until(
        &mut self,
        horizon: Option<Duration>,
    ) -> Result<SimulationStats, SimulationError> {
        if !self.stop_scheduled {
            if let Some(stop_time) = self.config.stop_time {
                self.stop_at(stop_time)?;
            }
        }

        info!(
            time = ?self.now(),
            pending = self.queue.len(),
            horizon = ?horizon,
            "Simulation running"
        );

        while let Some((key, event)) = self.queue.pop_until(horizon) {
            self.stats.events_processed += 1;
            trace!(
                time = ?key.time,
                sequence = key.sequence,
                event = event.type_name(),
                app = ?event.application(),
                "Processing event"
            );

            if let Event::SimulationStop = event {
                self.stop_handle = None;
                info!(time = ?self.now(), "Stop event reached");
                return Ok(self.stats.clone());
            }
            self.handle_event(event)?;
        }

        if let Some(end) = horizon {
            self.queue.advance_to(end);
        }
        info!(
            time = ?self.now(),
            events = self.stats.events_processed,
            "Simulation finished"
        );
        Ok(self.stats.clone())
    }

    /// Release all simulation state.
    ///
    /// Pending events, including cancelled ones, are discarded without
    /// running.
    pub fn destroy(self) -> TeardownReport {
        let report = TeardownReport {
            final_time: self.now(),
            events_processed: self.stats.events_processed,
            events_discarded: self.queue.len(),
            nodes: self.nodes.len(),
            devices: self.devices.len(),
            channels: self.channels.len(),
            applications: self.apps.len(),
        };
        info!(
            time = ?report.final_time,
            discarded = report.events_discarded,
            "Simulator destroyed"
        );
        report
    }

    fn handle_event(&mut self, event: Event) -> Result<(), SimulationError> {
        match event {
            Event::ApplicationStart { app } => self.start_application(app),
            Event::ApplicationStop { app } => self.stop_application(app),
            Event::ApplicationTimer { app, timer } => {
                let slot = self
                    .apps
                    .get_mut(app.index())
                    .ok_or(SimulationError::UnknownApplication(app))?;
                slot.timers.remove(&timer);
                if slot.state.is_running() {
                    self.dispatch(app, AppEvent::Timer(timer))?;
                }
                Ok(())
            }
            Event::FrameArrival { device, frame } => self.receive_frame(device, frame),
            Event::DeviceReady { device } => {
                self.devices
                    .get_mut(device.index())
                    .ok_or(SimulationError::UnknownDevice(device))?
                    .ready_pending = false;
                self.service_device(device)
            }
            // Handled by the run loop.
            Event::SimulationStop => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Application dispatch
    // ═══════════════════════════════════════════════════════════════════════

    fn start_application(&mut self, app: AppId) -> Result<(), SimulationError> {
        let now = self.now();
        let slot = self
            .apps
            .get_mut(app.index())
            .ok_or(SimulationError::UnknownApplication(app))?;
        slot.start_handle = None;
        if !slot.state.start() {
            return Ok(());
        }
        info!(
            %app,
            node = %slot.node,
            name = slot.app.name(),
            time = ?now,
            "Application started"
        );
        self.dispatch(app, AppEvent::Started)
    }

    fn stop_application(&mut self, app: AppId) -> Result<(), SimulationError> {
        let now = self.now();
        let slot = self
            .apps
            .get_mut(app.index())
            .ok_or(SimulationError::UnknownApplication(app))?;
        slot.stop_handle = None;
        if !slot.state.stop() {
            trace!(%app, "Application already stopped");
            return Ok(());
        }

        if let Some(start) = slot.start_handle.take() {
            self.queue.cancel(start);
        }
        for (_, handle) in slot.timers.drain() {
            if self.queue.cancel(handle) {
                self.stats.timers_cancelled += 1;
            }
        }
        self.nodes[slot.node.index()].unbind(app);

        // Stopped applications cannot act; their response is discarded.
        slot.app.set_time(now);
        let _ = slot.app.handle(AppEvent::Stopped);

        info!(
            %app,
            node = %slot.node,
            name = slot.app.name(),
            time = ?now,
            sent = slot.send_times.len(),
            received = slot.receive_times.len(),
            "Application stopped"
        );
        Ok(())
    }

    fn dispatch(&mut self, app: AppId, event: AppEvent) -> Result<(), SimulationError> {
        let now = self.now();
        let slot = &mut self.apps[app.index()];
        slot.app.set_time(now);
        let actions = slot.app.handle(event);
        for action in actions {
            trace!(
                %app,
                action = action.type_name(),
                network = action.is_network(),
                "Applying action"
            );
            self.apply_action(app, action)?;
        }
        Ok(())
    }

    fn apply_action(&mut self, app: AppId, action: AppAction) -> Result<(), SimulationError> {
        let slot = &mut self.apps[app.index()];
        match action {
            AppAction::Bind { port } => {
                let bound = self.nodes[slot.node.index()].bind(port, app)?;
                slot.port = Some(bound);
                debug!(%app, node = %slot.node, port = bound, "Socket bound");
                Ok(())
            }
            AppAction::Send {
                to,
                payload_size,
                tag,
            } => self.send_from_application(app, to, payload_size, tag),
            AppAction::SetTimer { id, after } => {
                if let Some(old) = slot.timers.remove(&id) {
                    if self.queue.cancel(old) {
                        self.stats.timers_cancelled += 1;
                    }
                }
                let handle = self
                    .queue
                    .schedule(after, Event::ApplicationTimer { app, timer: id });
                slot.timers.insert(id, handle);
                self.stats.timers_set += 1;
                Ok(())
            }
            AppAction::CancelTimer { id } => {
                if let Some(handle) = slot.timers.remove(&id) {
                    if self.queue.cancel(handle) {
                        self.stats.timers_cancelled += 1;
                    }
                }
                Ok(())
            }
        }
    }

    fn send_from_application(
        &mut self,
        app: AppId,
        to: SocketAddrV4,
        payload_size: u32,
        tag: u64,
    ) -> Result<(), SimulationError> {
        if payload_size > MAX_UDP_PAYLOAD {
            return Err(SimulationError::PayloadTooLarge {
                app,
                payload_size,
                max: MAX_UDP_PAYLOAD,
            });
        }
        let now = self.now();
        let node = self.apps[app.index()].node;
        let port = match self.apps[app.index()].port {
            Some(port) => port,
            None => {
                let port = self.nodes[node.index()].bind(None, app)?;
                self.apps[app.index()].port = Some(port);
                port
            }
        };

        let source = self.nodes[node.index()]
            .routes
            .lookup(*to.ip())
            .and_then(|route| self.device_address(route.device))
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        let packet = Packet {
            uid: self.next_packet_uid,
            src: SocketAddrV4::new(source, port),
            dst: to,
            payload_size,
            tag,
            sent_at: now,
        };
        self.next_packet_uid += 1;
        self.apps[app.index()].send_times.push(now);
        self.stats.packets_sent += 1;
        self.route_packet(node, packet)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Network layer
    // ═══════════════════════════════════════════════════════════════════════

    fn route_packet(&mut self, node: NodeId, packet: Packet) -> Result<(), SimulationError> {
        let dst = *packet.dst.ip();
        let Some(route) = self.nodes[node.index()].routes.lookup(dst).copied() else {
            self.stats.packets_no_route += 1;
            warn!(%node, %dst, uid = packet.uid, "No route to destination");
            self.notify_drop(node, None, &packet, DropReason::NoRoute);
            return Ok(());
        };

        let link_src = self
            .device_address(route.device)
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        let link_dst = route.gateway.unwrap_or(dst);
        self.send_frame(route.device, Frame::new(packet, link_src, link_dst))
    }

    fn deliver_packet(&mut self, node: NodeId, packet: Packet) -> Result<(), SimulationError> {
        if !self.owns_address(node, *packet.dst.ip()) {
            self.stats.packets_forwarded += 1;
            trace!(%node, dst = %packet.dst, uid = packet.uid, "Forwarding packet");
            return self.route_packet(node, packet);
        }

        let bound = self.nodes[node.index()]
            .socket(packet.dst.port())
            .filter(|app| self.apps[app.index()].state.is_running());
        let Some(app) = bound else {
            self.stats.packets_no_socket += 1;
            warn!(%node, dst = %packet.dst, uid = packet.uid, "No socket bound to port");
            self.notify_drop(node, None, &packet, DropReason::NoSocket);
            return Ok(());
        };

        self.stats.packets_received += 1;
        let now = self.now();
        self.apps[app.index()].receive_times.push(now);
        self.dispatch(app, AppEvent::Received(packet))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Link layer
    // ═══════════════════════════════════════════════════════════════════════

    /// Hand `frame` to `device` for transmission.
    ///
    /// The frame goes out now if the medium is free, otherwise it waits in
    /// the device's queue. Fails with
    /// [`SimulationError::NoChannelAttached`] if the device has no channel.
    pub fn send_frame(&mut self, device: DeviceId, frame: Frame) -> Result<(), SimulationError> {
        let now = self.now();
        let capacity = self.config.device_queue_capacity;
        let dev = self
            .devices
            .get(device.index())
            .ok_or(SimulationError::UnknownDevice(device))?;
        let Some(channel) = dev.channel else {
            return Err(SimulationError::NoChannelAttached { device });
        };

        if dev.queue.len() >= capacity {
            let node = dev.node;
            self.stats.frames_queue_full += 1;
            debug!(%device, uid = frame.packet.uid, "Device queue full");
            self.notify_drop(node, Some(device), &frame.packet, DropReason::QueueFull);
            return Ok(());
        }

        if !dev.queue.is_empty() || self.channels[channel.index()].ready_at(device) > now {
            self.stats.frames_deferred += 1;
            trace!(%device, uid = frame.packet.uid, "Frame deferred");
        }
        self.devices[device.index()].queue.push_back(frame);
        self.service_device(device)
    }

    /// Transmit the head of `device`'s queue if its channel is ready,
    /// otherwise make sure a retry is scheduled.
    fn service_device(&mut self, device: DeviceId) -> Result<(), SimulationError> {
        let now = self.now();
        let dev = &self.devices[device.index()];
        let Some(channel) = dev.channel else {
            return Err(SimulationError::NoChannelAttached { device });
        };
        let node = dev.node;
        if dev.queue.is_empty() {
            return Ok(());
        }

        let ready_at = self.channels[channel.index()].ready_at(device);
        if ready_at > now {
            self.schedule_ready(device, ready_at);
            return Ok(());
        }

        let Some(frame) = self.devices[device.index()].queue.pop_front() else {
            return Ok(());
        };
        let mut positions = DevicePositions {
            devices: &self.devices,
            mobility: &mut self.mobility,
        };
        let tx = self.channels[channel.index()].transmit(now, device, &frame, &mut positions);
        self.stats.frames_transmitted += 1;
        trace!(
            %device,
            uid = frame.packet.uid,
            started = ?tx.started_at,
            ends = ?tx.ends_at,
            receivers = tx.deliveries.len(),
            "Frame transmitted"
        );

        for observer in &mut self.observers {
            observer.on_transmit(tx.started_at, node, device, &frame);
        }
        for delivery in &tx.deliveries {
            self.queue.schedule(
                delivery.at.saturating_sub(now),
                Event::FrameArrival {
                    device: delivery.device,
                    frame: frame.clone(),
                },
            );
        }
        for &far in &tx.out_of_range {
            self.stats.frames_out_of_range += 1;
            let far_node = self.devices[far.index()].node;
            self.notify_drop(far_node, Some(far), &frame.packet, DropReason::OutOfRange);
        }

        if !self.devices[device.index()].queue.is_empty() {
            let next = self.channels[channel.index()].ready_at(device).max(now);
            self.schedule_ready(device, next);
        }
        Ok(())
    }

    fn schedule_ready(&mut self, device: DeviceId, at: Duration) {
        let dev = &mut self.devices[device.index()];
        if dev.ready_pending {
            return;
        }
        dev.ready_pending = true;
        let delay = at.saturating_sub(self.queue.now());
        self.queue.schedule(delay, Event::DeviceReady { device });
    }

    fn receive_frame(&mut self, device: DeviceId, frame: Frame) -> Result<(), SimulationError> {
        let now = self.now();
        let dev = self
            .devices
            .get(device.index())
            .ok_or(SimulationError::UnknownDevice(device))?;
        let node = dev.node;

        if !dev.accepts(&frame) {
            self.stats.frames_address_mismatch += 1;
            trace!(%device, link_dst = %frame.link_dst, "Frame not addressed to device");
            self.notify_drop(node, Some(device), &frame.packet, DropReason::AddressMismatch);
            return Ok(());
        }

        self.stats.frames_delivered += 1;
        for observer in &mut self.observers {
            observer.on_receive(now, node, device, &frame);
        }
        self.deliver_packet(node, frame.packet)
    }

    fn notify_drop(
        &mut self,
        node: NodeId,
        device: Option<DeviceId>,
        packet: &Packet,
        reason: DropReason,
    ) {
        let now = self.now();
        for observer in &mut self.observers {
            observer.on_drop(now, node, device, packet, reason);
        }
    }
}
