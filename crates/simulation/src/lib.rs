//! Deterministic discrete-event network simulation.
//!
//! This crate models small IPv4/UDP networks: nodes with devices, devices
//! attached to point-to-point, shared-bus or wireless channels, and
//! applications that start and stop at fixed simulated times. Given the
//! same construction calls and seed, it produces identical results every
//! run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Simulator                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeMap<EventKey, Event>)        │ │
//! │  │     Ordered by: time, sequence                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     apps: Vec<Box<dyn Application>>                │ │
//! │  │     nodes ─ devices ─ channels                     │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Actions / transmissions → schedule new events  │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod address;
mod application;
pub mod channel;
mod config;
mod device;
mod error;
mod event_queue;
pub mod mobility;
mod node;
mod routing;
mod runner;
pub mod trace;

pub use address::AddressAllocator;
pub use application::{AppState, ApplicationReport};
pub use channel::{Channel, ChannelKind};
pub use config::{CsmaConfig, PointToPointConfig, SimulatorConfig, WirelessConfig, SPEED_OF_LIGHT};
pub use device::{Device, Interface};
pub use error::SimulationError;
pub use event_queue::{EventHandle, EventKey, EventQueue};
pub use node::{Node, EPHEMERAL_PORT_START};
pub use routing::{Route, RoutingTable};
pub use runner::{SimulationStats, Simulator, TeardownReport};
