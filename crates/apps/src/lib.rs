//! UDP echo applications.
//!
//! Both applications are [`Application`](packetsim_core::Application)
//! state machines: they react to lifecycle, timer and receive events and
//! return socket/timer actions for the simulator to execute.

mod config;
mod echo_client;
mod echo_server;

pub use config::{ConfigError, EchoClientConfig, EchoServerConfig};
pub use echo_client::UdpEchoClient;
pub use echo_server::UdpEchoServer;
