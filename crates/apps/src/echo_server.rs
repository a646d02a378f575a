//! UDP echo server.

use crate::{ConfigError, EchoServerConfig};
use packetsim_core::{AppAction, AppEvent, Application};
use std::time::Duration;
use tracing::{debug, info};

/// Listens on a fixed port and echoes every datagram back to its sender
/// with the same payload size.
#[derive(Debug)]
pub struct UdpEchoServer {
    config: EchoServerConfig,

    /// Datagrams echoed so far.
    echoed: u64,

    /// Current simulation time.
    now: Duration,
}

impl UdpEchoServer {
    /// Create a server after validating its configuration.
    pub fn new(config: EchoServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            echoed: 0,
            now: Duration::ZERO,
        })
    }

    /// Datagrams echoed so far.
    pub fn echoed(&self) -> u64 {
        self.echoed
    }
}

impl Application for UdpEchoServer {
    fn name(&self) -> &'static str {
        "UdpEchoServer"
    }

    fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Started => {
                debug!(port = self.config.port, "Echo server listening");
                vec![AppAction::Bind {
                    port: Some(self.config.port),
                }]
            }
            AppEvent::Received(packet) => {
                info!(
                    time = ?self.now,
                    bytes = packet.payload_size,
                    from = %packet.src,
                    "Echo server received packet"
                );
                self.echoed += 1;
                info!(
                    time = ?self.now,
                    bytes = packet.payload_size,
                    to = %packet.src,
                    "Echo server echoing packet"
                );
                vec![AppAction::Send {
                    to: packet.src,
                    payload_size: packet.payload_size,
                    tag: packet.tag,
                }]
            }
            AppEvent::Timer(_) => vec![],
            AppEvent::Stopped => {
                debug!(echoed = self.echoed, "Echo server stopped");
                vec![]
            }
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
