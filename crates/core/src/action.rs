//! Actions an application asks the simulator to perform.

use crate::TimerId;
use std::net::SocketAddrV4;
use std::time::Duration;

/// Outbound requests from an [`Application`](crate::Application).
///
/// Applications never touch devices, sockets or the event queue directly.
/// They return actions and the simulator carries them out at the current
/// simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Sockets
    // ═══════════════════════════════════════════════════════════════════════
    /// Bind the application's UDP socket. `None` picks an ephemeral port.
    Bind {
        /// Requested local port.
        port: Option<u16>,
    },

    /// Send a datagram from the application's socket.
    ///
    /// The simulator fills in the source address from the outgoing
    /// interface and binds an ephemeral port first if the application has
    /// not bound one.
    Send {
        /// Destination socket.
        to: SocketAddrV4,
        /// Payload size in bytes.
        payload_size: u32,
        /// Application header carried in the payload.
        tag: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Fire [`AppEvent::Timer`](crate::AppEvent::Timer) after `after`.
    /// Replaces a pending timer with the same id.
    SetTimer {
        /// Timer to set.
        id: TimerId,
        /// Delay from now.
        after: Duration,
    },

    /// Cancel a pending timer. No-op if it already fired.
    CancelTimer {
        /// Timer to cancel.
        id: TimerId,
    },
}

impl AppAction {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            AppAction::Bind { .. } => "Bind",
            AppAction::Send { .. } => "Send",
            AppAction::SetTimer { .. } => "SetTimer",
            AppAction::CancelTimer { .. } => "CancelTimer",
        }
    }

    /// Check if this action touches the network.
    pub fn is_network(&self) -> bool {
        matches!(self, AppAction::Bind { .. } | AppAction::Send { .. })
    }

    /// Check if this action manages a timer.
    pub fn is_timer(&self) -> bool {
        matches!(
            self,
            AppAction::SetTimer { .. } | AppAction::CancelTimer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_action_classification() {
        let send = AppAction::Send {
            to: SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9),
            payload_size: 10,
            tag: 0,
        };
        assert!(send.is_network());
        assert!(!send.is_timer());
        assert_eq!(send.type_name(), "Send");

        let timer = AppAction::CancelTimer { id: TimerId(1) };
        assert!(timer.is_timer());
        assert!(!timer.is_network());
    }
}
