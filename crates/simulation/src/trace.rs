//! Passive packet observers.
//!
//! Observers see every transmit, receive and drop as it happens. They get
//! shared references only and return nothing, so attaching one cannot
//! change delivery or timing.

use packetsim_types::{DeviceId, Frame, NodeId, Packet};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::net::SocketAddrV4;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Why a frame or packet did not reach its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DropReason {
    /// The frame reached a device it was not addressed to.
    AddressMismatch,
    /// The receiver was beyond the wireless range.
    OutOfRange,
    /// The sender's outbound queue was full.
    QueueFull,
    /// The node had no route to the destination.
    NoRoute,
    /// No application was bound to the destination port.
    NoSocket,
}

impl DropReason {
    /// Get a human-readable name for this drop reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::AddressMismatch => "address_mismatch",
            DropReason::OutOfRange => "out_of_range",
            DropReason::QueueFull => "queue_full",
            DropReason::NoRoute => "no_route",
            DropReason::NoSocket => "no_socket",
        }
    }
}

/// Callbacks invoked by the simulator on packet activity.
pub trait PacketObserver {
    /// A device put `frame` on its channel.
    fn on_transmit(&mut self, _now: Duration, _node: NodeId, _device: DeviceId, _frame: &Frame) {}

    /// `frame` arrived at, and was accepted by, `device`.
    fn on_receive(&mut self, _now: Duration, _node: NodeId, _device: DeviceId, _frame: &Frame) {}

    /// `packet` was discarded. `device` is `None` for drops above the
    /// link layer.
    fn on_drop(
        &mut self,
        _now: Duration,
        _node: NodeId,
        _device: Option<DeviceId>,
        _packet: &Packet,
        _reason: DropReason,
    ) {
    }
}

/// Kind of a recorded packet event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceKind {
    /// A device put the frame on its channel.
    Transmit,
    /// A device accepted a frame addressed to it.
    Receive,
    /// The packet was discarded.
    Drop(DropReason),
}

/// One captured packet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    /// Simulated time of the event.
    pub time: Duration,
    /// What happened.
    pub kind: TraceKind,
    /// Node where it happened.
    pub node: NodeId,
    /// Device involved. `None` for network-layer drops.
    pub device: Option<DeviceId>,
    /// Packet uid.
    pub uid: u64,
    /// Sending socket.
    pub src: SocketAddrV4,
    /// Destination socket.
    pub dst: SocketAddrV4,
    /// Application payload size in bytes.
    pub payload_size: u32,
}

impl TraceRecord {
    fn new(
        time: Duration,
        kind: TraceKind,
        node: NodeId,
        device: Option<DeviceId>,
        packet: &Packet,
    ) -> Self {
        Self {
            time,
            kind,
            node,
            device,
            uid: packet.uid,
            src: packet.src,
            dst: packet.dst,
            payload_size: packet.payload_size,
        }
    }
}

/// In-memory capture.
///
/// Clones share one buffer: keep a clone, hand the other to
/// [`Simulator::add_observer`](crate::Simulator::add_observer), and read the
/// records after the run.
#[derive(Debug, Clone, Default)]
pub struct PacketLog {
    records: Rc<RefCell<Vec<TraceRecord>>>,
    devices: Option<BTreeSet<DeviceId>>,
}

impl PacketLog {
    /// Capture activity on every device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture only activity on `devices`.
    pub fn for_devices(devices: impl IntoIterator<Item = DeviceId>) -> Self {
        Self {
            records: Rc::default(),
            devices: Some(devices.into_iter().collect()),
        }
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.borrow().clone()
    }

    /// Number of records captured.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    fn captures(&self, device: Option<DeviceId>) -> bool {
        match (&self.devices, device) {
            (None, _) => true,
            (Some(set), Some(device)) => set.contains(&device),
            (Some(_), None) => false,
        }
    }

    fn push(&self, record: TraceRecord) {
        if self.captures(record.device) {
            self.records.borrow_mut().push(record);
        }
    }
}

impl PacketObserver for PacketLog {
    fn on_transmit(&mut self, now: Duration, node: NodeId, device: DeviceId, frame: &Frame) {
        self.push(TraceRecord::new(now, TraceKind::Transmit, node, Some(device), &frame.packet));
    }

    fn on_receive(&mut self, now: Duration, node: NodeId, device: DeviceId, frame: &Frame) {
        self.push(TraceRecord::new(now, TraceKind::Receive, node, Some(device), &frame.packet));
    }

    fn on_drop(
        &mut self,
        now: Duration,
        node: NodeId,
        device: Option<DeviceId>,
        packet: &Packet,
        reason: DropReason,
    ) {
        self.push(TraceRecord::new(now, TraceKind::Drop(reason), node, device, packet));
    }
}

/// Emits a `debug` event per packet event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl PacketObserver for LoggingObserver {
    fn on_transmit(&mut self, now: Duration, node: NodeId, device: DeviceId, frame: &Frame) {
        debug!(
            time = ?now,
            %node,
            %device,
            uid = frame.packet.uid,
            src = %frame.packet.src,
            dst = %frame.packet.dst,
            "Frame transmitted"
        );
    }

    fn on_receive(&mut self, now: Duration, node: NodeId, device: DeviceId, frame: &Frame) {
        debug!(
            time = ?now,
            %node,
            %device,
            uid = frame.packet.uid,
            src = %frame.packet.src,
            dst = %frame.packet.dst,
            "Frame received"
        );
    }

    fn on_drop(
        &mut self,
        now: Duration,
        node: NodeId,
        device: Option<DeviceId>,
        packet: &Packet,
        reason: DropReason,
    ) {
        debug!(
            time = ?now,
            %node,
            device = ?device,
            uid = packet.uid,
            reason = reason.as_str(),
            "Packet dropped"
        );
    }
}
