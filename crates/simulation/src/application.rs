//! Application lifecycle bookkeeping.

use crate::event_queue::EventHandle;
use packetsim_core::{Application, TimerId};
use packetsim_types::NodeId;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Lifecycle state of an installed application.
///
/// ```text
/// Unscheduled ──schedule──▶ Scheduled ──start──▶ Running ──stop──▶ Stopped
///                               │                                   ▲
///                               └───────────────stop────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AppState {
    /// Added to a node, no start/stop events yet.
    Unscheduled,
    /// Start (and optionally stop) events are queued.
    Scheduled,
    /// Start fired; the application handles events.
    Running,
    /// Stop fired. Terminal.
    Stopped,
}

impl AppState {
    /// Unscheduled → Scheduled. Returns `false` from any other state.
    pub fn schedule(&mut self) -> bool {
        self.transition(AppState::Unscheduled, AppState::Scheduled)
    }

    /// Scheduled → Running. Returns `false` from any other state.
    pub fn start(&mut self) -> bool {
        self.transition(AppState::Scheduled, AppState::Running)
    }

    /// Scheduled or Running → Stopped. Returns `false` if already stopped
    /// or never scheduled.
    pub fn stop(&mut self) -> bool {
        match self {
            AppState::Scheduled | AppState::Running => {
                *self = AppState::Stopped;
                true
            }
            AppState::Unscheduled | AppState::Stopped => false,
        }
    }

    /// Whether the application currently handles events.
    pub fn is_running(&self) -> bool {
        matches!(self, AppState::Running)
    }

    fn transition(&mut self, from: AppState, to: AppState) -> bool {
        if *self == from {
            *self = to;
            true
        } else {
            false
        }
    }
}

/// Per-application activity summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationReport {
    /// Application name.
    pub name: &'static str,
    /// Owning node.
    pub node: NodeId,
    /// Lifecycle state at the time of the report.
    pub state: AppState,
    /// Bound UDP port, if any.
    pub port: Option<u16>,
    /// Datagrams sent.
    pub sent: u64,
    /// Datagrams received.
    pub received: u64,
    /// Simulated time of each send.
    pub send_times: Vec<Duration>,
    /// Simulated time of each receive.
    pub receive_times: Vec<Duration>,
    /// Round trips the application matched to its own requests.
    pub round_trips: Vec<Duration>,
}

/// Simulator-side record for one application.
pub(crate) struct AppSlot {
    pub(crate) app: Box<dyn Application>,
    pub(crate) node: NodeId,
    pub(crate) state: AppState,
    pub(crate) port: Option<u16>,

    /// Pending timers, for cancellation on stop.
    pub(crate) timers: HashMap<TimerId, EventHandle>,
    pub(crate) start_handle: Option<EventHandle>,
    pub(crate) stop_handle: Option<EventHandle>,

    pub(crate) send_times: Vec<Duration>,
    pub(crate) receive_times: Vec<Duration>,
}

impl AppSlot {
    pub(crate) fn new(node: NodeId, app: Box<dyn Application>) -> Self {
        Self {
            app,
            node,
            state: AppState::Unscheduled,
            port: None,
            timers: HashMap::new(),
            start_handle: None,
            stop_handle: None,
            send_times: Vec::new(),
            receive_times: Vec::new(),
        }
    }

    pub(crate) fn report(&self) -> ApplicationReport {
        ApplicationReport {
            name: self.app.name(),
            node: self.node,
            state: self.state,
            port: self.port,
            sent: self.send_times.len() as u64,
            received: self.receive_times.len() as u64,
            send_times: self.send_times.clone(),
            receive_times: self.receive_times.clone(),
            round_trips: self.app.round_trips().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut state = AppState::Unscheduled;
        assert!(!state.start(), "Cannot start before scheduling");
        assert!(state.schedule());
        assert!(!state.schedule());
        assert!(state.start());
        assert!(state.is_running());
        assert!(state.stop());
        assert_eq!(state, AppState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut state = AppState::Running;
        assert!(state.stop());
        assert!(!state.stop());
        assert!(!state.start(), "Stopped is terminal");
        assert_eq!(state, AppState::Stopped);
    }

    #[test]
    fn test_stop_before_start() {
        let mut state = AppState::Scheduled;
        assert!(state.stop());
        assert_eq!(state, AppState::Stopped);
    }
}
