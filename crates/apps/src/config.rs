//! Configuration for the echo applications.

use packetsim_types::MAX_UDP_PAYLOAD;
use std::net::SocketAddrV4;
use std::time::Duration;
use thiserror::Error;

/// Invalid application configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Periodic sending needs a positive interval.
    #[error("echo client interval must be non-zero when sending more than one packet")]
    ZeroInterval,

    /// Port 0 is reserved for ephemeral allocation.
    #[error("echo server port must be non-zero")]
    ZeroPort,

    /// The payload would not fit in a single UDP datagram.
    #[error("packet size {0} exceeds the maximum UDP payload of 65507 bytes")]
    PacketTooLarge(u32),
}

/// Configuration for [`UdpEchoClient`](crate::UdpEchoClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoClientConfig {
    /// Echo server to send to.
    pub remote: SocketAddrV4,

    /// Number of packets to send. Zero means no limit other than the
    /// application's stop time.
    pub max_packets: u32,

    /// Time between consecutive sends.
    pub interval: Duration,

    /// Payload size of each packet in bytes.
    pub packet_size: u32,
}

impl EchoClientConfig {
    /// Create a config targeting `remote` with the usual defaults
    /// (100 packets, 1 s interval, 100-byte payload).
    pub fn new(remote: SocketAddrV4) -> Self {
        Self {
            remote,
            max_packets: 100,
            interval: Duration::from_secs(1),
            packet_size: 100,
        }
    }

    /// Set the number of packets to send.
    pub fn with_max_packets(mut self, max_packets: u32) -> Self {
        self.max_packets = max_packets;
        self
    }

    /// Set the interval between sends.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the payload size.
    pub fn with_packet_size(mut self, packet_size: u32) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// Check the config for values the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() && self.max_packets != 1 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.packet_size > MAX_UDP_PAYLOAD {
            return Err(ConfigError::PacketTooLarge(self.packet_size));
        }
        Ok(())
    }
}

/// Configuration for [`UdpEchoServer`](crate::UdpEchoServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoServerConfig {
    /// UDP port to listen on.
    pub port: u16,
}

impl Default for EchoServerConfig {
    fn default() -> Self {
        Self { port: 9 }
    }
}

impl EchoServerConfig {
    /// Create a config listening on `port`.
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }

    /// Check the config for values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn remote() -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(192, 168, 2, 6), 64)
    }

    #[test]
    fn test_client_builder() {
        let config = EchoClientConfig::new(remote())
            .with_max_packets(3)
            .with_interval(Duration::from_secs(2))
            .with_packet_size(1024);
        assert_eq!(config.max_packets, 3);
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.packet_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_rejects_zero_interval() {
        let config = EchoClientConfig::new(remote()).with_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));

        // A single packet never needs the interval.
        let single = config.with_max_packets(1);
        assert!(single.validate().is_ok());
    }

    #[test]
    fn test_client_rejects_oversized_payload() {
        let config = EchoClientConfig::new(remote()).with_packet_size(70_000);
        assert_eq!(config.validate(), Err(ConfigError::PacketTooLarge(70_000)));
    }

    #[test]
    fn test_server_port() {
        assert_eq!(EchoServerConfig::default().port, 9);
        assert_eq!(
            EchoServerConfig::with_port(0).validate(),
            Err(ConfigError::ZeroPort)
        );
        assert!(EchoServerConfig::with_port(64).validate().is_ok());
    }
}
