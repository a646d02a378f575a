//! Application timer identifiers.

/// Opaque identifier for a timer owned by one application.
///
/// Timer ids are scoped to the application that sets them: two
/// applications may both use `TimerId(0)` without interfering. Setting a
/// timer that is already pending replaces it.
///
/// # Example
///
/// ```ignore
/// // In an application:
/// const SEND_TIMER: TimerId = TimerId(0);
///
/// fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
///     match event {
///         AppEvent::Timer(SEND_TIMER) => self.send_next(),
///         // ...
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}
