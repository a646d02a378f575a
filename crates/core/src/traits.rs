//! Core traits for applications.

use crate::{AppAction, AppEvent};
use std::time::Duration;

/// A timed behaviour bound to a node.
///
/// Applications are state machines driven by the simulator:
///
/// - **Synchronous**: No async, no `.await`
/// - **Deterministic**: Same state + event = same actions
/// - **No I/O**: Sockets and timers are requested through returned actions
///
/// # Example
///
/// ```ignore
/// impl Application for UdpEchoServer {
///     fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
///         match event {
///             AppEvent::Started => vec![AppAction::Bind { port: Some(self.port) }],
///             AppEvent::Received(packet) => self.echo(packet),
///             // ... etc
///         }
///     }
///
///     fn set_time(&mut self, now: Duration) {
///         self.now = now;
///     }
/// }
/// ```
pub trait Application {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Process an event, returning actions to perform.
    ///
    /// # Guarantees
    ///
    /// - **Synchronous**: This method never blocks or awaits
    /// - **Deterministic**: Given the same state and event, always returns the same actions
    /// - **No I/O**: All I/O is performed by the simulator via the returned actions
    fn handle(&mut self, event: AppEvent) -> Vec<AppAction>;

    /// Set the current simulated time.
    ///
    /// Called by the simulator before each `handle()` call.
    fn set_time(&mut self, now: Duration);

    /// Get the time that was last set via `set_time()`.
    fn now(&self) -> Duration;

    /// Round-trip times the application measured itself, if it measures any.
    fn round_trips(&self) -> &[Duration] {
        &[]
    }
}
