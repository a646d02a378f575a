//! Events processed by the simulator and by applications.

use crate::TimerId;
use packetsim_types::{AppId, DeviceId, Frame, Packet};

/// A unit of scheduled work in the simulator's event queue.
///
/// Events are plain data naming their target and carrying exactly what the
/// handler needs. The simulator dispatches on the variant; nothing is
/// captured implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Application lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    /// Move an application from Scheduled to Running.
    ApplicationStart {
        /// Target application.
        app: AppId,
    },

    /// Move an application to Stopped, cancelling its pending timers.
    ApplicationStop {
        /// Target application.
        app: AppId,
    },

    /// A timer set by an application expired.
    ApplicationTimer {
        /// Owning application.
        app: AppId,
        /// Timer that fired.
        timer: TimerId,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Link layer
    // ═══════════════════════════════════════════════════════════════════════
    /// A frame finished propagating and arrives at a device.
    FrameArrival {
        /// Receiving device.
        device: DeviceId,
        /// Delivered frame (a copy per receiver).
        frame: Frame,
    },

    /// A device should try to transmit the head of its outbound queue.
    ///
    /// Scheduled when the device's own transmission ends or when the medium
    /// it deferred to becomes idle.
    DeviceReady {
        /// Device to poll.
        device: DeviceId,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Driver
    // ═══════════════════════════════════════════════════════════════════════
    /// Global horizon: the driver stops processing when this fires.
    SimulationStop,
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::ApplicationStart { .. } => "ApplicationStart",
            Event::ApplicationStop { .. } => "ApplicationStop",
            Event::ApplicationTimer { .. } => "ApplicationTimer",
            Event::FrameArrival { .. } => "FrameArrival",
            Event::DeviceReady { .. } => "DeviceReady",
            Event::SimulationStop => "SimulationStop",
        }
    }

    /// The application this event targets, if any.
    pub fn application(&self) -> Option<AppId> {
        match self {
            Event::ApplicationStart { app }
            | Event::ApplicationStop { app }
            | Event::ApplicationTimer { app, .. } => Some(*app),
            _ => None,
        }
    }
}

/// Inputs delivered to an [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The start event fired; the application is now Running.
    Started,
    /// A timer set via [`AppAction::SetTimer`](crate::AppAction::SetTimer) fired.
    Timer(TimerId),
    /// A datagram arrived on the application's socket.
    Received(Packet),
    /// The stop event fired. Pending timers are already cancelled and
    /// actions returned in response are ignored.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_application_target() {
        let app = AppId(4);
        assert_eq!(Event::ApplicationStart { app }.application(), Some(app));
        assert_eq!(
            Event::ApplicationTimer {
                app,
                timer: TimerId(0)
            }
            .application(),
            Some(app)
        );
        assert_eq!(Event::SimulationStop.application(), None);
        assert_eq!(
            Event::DeviceReady {
                device: DeviceId(1)
            }
            .type_name(),
            "DeviceReady"
        );
    }
}
