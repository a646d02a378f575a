//! Event queue with deterministic ordering.

use crate::SimulationError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for events scheduled at the same time)
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: Duration,
    /// Sequence number for deterministic FIFO ordering.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by time first
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Then by sequence (FIFO)
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Handle to a scheduled event, used for cancellation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventHandle(EventKey);

impl EventHandle {
    /// Time the event is scheduled for.
    pub fn time(&self) -> Duration {
        self.0.time
    }

    /// The ordering key of the event.
    pub fn key(&self) -> EventKey {
        self.0
    }
}

/// Time-ordered queue of pending events plus the simulation clock.
///
/// The clock only moves when an event is popped, and only forwards: every
/// event is scheduled at or after the current time, so the popped minimum is
/// never earlier than `now`. Given the same sequence of `schedule` calls the
/// pop order is identical on every run.
#[derive(Debug)]
pub struct EventQueue<E> {
    /// Pending events, ordered deterministically.
    events: BTreeMap<EventKey, E>,

    /// Sequence counter for deterministic ordering.
    sequence: u64,

    /// Current simulation time.
    now: Duration,

    /// Events cancelled before they ran.
    cancelled: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// Create an empty queue at time zero.
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            cancelled: 0,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events cancelled so far.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<Duration> {
        self.events.first_key_value().map(|(key, _)| key.time)
    }

    /// Schedule `event` to run `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, event: E) -> EventHandle {
        let time = self.now.saturating_add(delay);
        self.insert(time, event)
    }

    /// Schedule `event` at an absolute time.
    ///
    /// Fails with [`SimulationError::InvalidDelay`] if `time` is in the past.
    pub fn schedule_at(&mut self, time: Duration, event: E) -> Result<EventHandle, SimulationError> {
        if time < self.now {
            return Err(SimulationError::InvalidDelay {
                requested: time,
                now: self.now,
            });
        }
        Ok(self.insert(time, event))
    }

    fn insert(&mut self, time: Duration, event: E) -> EventHandle {
        self.sequence += 1;
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.events.insert(key, event);
        EventHandle(key)
    }

    /// Cancel a pending event.
    ///
    /// Returns `false` if the event already ran or was already cancelled.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        if self.events.remove(&handle.0).is_some() {
            self.cancelled += 1;
            trace!(time = ?handle.0.time, sequence = handle.0.sequence, "Event cancelled");
            true
        } else {
            false
        }
    }

    /// Whether the event behind `handle` is still waiting to run.
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.events.contains_key(&handle.0)
    }

    /// Pop the earliest event and advance the clock to its time.
    pub fn pop(&mut self) -> Option<(EventKey, E)> {
        let (key, event) = self.events.pop_first()?;
        self.now = key.time;
        Some((key, event))
    }

    /// Pop the earliest event if it is scheduled at or before `horizon`.
    pub fn pop_until(&mut self, horizon: Option<Duration>) -> Option<(EventKey, E)> {
        let next = self.peek_time()?;
        if horizon.is_some_and(|end| next > end) {
            return None;
        }
        self.pop()
    }

    /// Run events in order until the queue empties or the next event lies
    /// beyond `horizon`. The handler may schedule further events.
    ///
    /// When a horizon is given the clock ends at the horizon even if the
    /// queue ran dry earlier. Returns the number of events executed.
    pub fn run_until<F>(&mut self, horizon: Option<Duration>, mut handler: F) -> u64
    where
        F: FnMut(&mut Self, E),
    {
        let mut executed = 0;
        while let Some((_, event)) = self.pop_until(horizon) {
            handler(self, event);
            executed += 1;
        }
        if let Some(end) = horizon {
            self.advance_to(end);
        }
        executed
    }

    /// Move the clock forward to `time` without running anything.
    ///
    /// No-op if `time` is not later than `now` or an event is pending
    /// before `time`.
    pub fn advance_to(&mut self, time: Duration) {
        if self.peek_time().is_some_and(|next| next < time) {
            return;
        }
        if self.now < time {
            self.now = time;
        }
    }

    /// Discard every pending event without running it.
    ///
    /// Returns how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.events.len();
        self.events.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_ordering() {
        let earlier = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        let later = EventKey {
            time: Duration::from_secs(2),
            sequence: 1,
        };
        assert!(earlier < later);
    }

    #[test]
    fn test_sequence_breaks_ties() {
        let first = EventKey {
            time: Duration::from_secs(1),
            sequence: 1,
        };
        let second = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        assert!(first < second, "Lower sequence should process first");
    }

    #[test]
    fn test_pop_advances_clock() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::from_secs(3), "c");
        queue.schedule(Duration::from_secs(1), "a");
        queue.schedule(Duration::from_secs(2), "b");

        let mut order = vec![];
        while let Some((key, event)) = queue.pop() {
            assert_eq!(queue.now(), key.time);
            order.push(event);
        }
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(queue.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_equal_times_run_in_insertion_order() {
        let mut queue = EventQueue::new();
        for i in 0..10 {
            queue.schedule(Duration::from_secs(5), i);
        }
        let order: Vec<_> = std::iter::from_fn(|| queue.pop().map(|(_, e)| e)).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_schedule_in_past_is_invalid_delay() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::from_secs(2), ());
        queue.pop();

        let err = queue.schedule_at(Duration::from_secs(1), ()).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidDelay {
                requested: Duration::from_secs(1),
                now: Duration::from_secs(2),
            }
        );

        // Scheduling at exactly `now` is allowed.
        assert!(queue.schedule_at(Duration::from_secs(2), ()).is_ok());
    }

    #[test]
    fn test_cancel_before_run() {
        let mut queue = EventQueue::new();
        let keep = queue.schedule(Duration::from_secs(1), "keep");
        let drop = queue.schedule(Duration::from_secs(1), "drop");
        queue.schedule(Duration::from_secs(2), "later");

        assert!(queue.cancel(drop));
        assert!(!queue.cancel(drop), "Second cancel is a no-op");
        assert!(queue.is_pending(keep));

        let mut ran = vec![];
        queue.run_until(None, |_, e| ran.push(e));
        assert_eq!(ran, vec!["keep", "later"]);
        assert_eq!(queue.cancelled(), 1);
    }

    #[test]
    fn test_cancel_after_run_is_noop() {
        let mut queue = EventQueue::new();
        let handle = queue.schedule(Duration::ZERO, ());
        queue.pop();
        assert!(!queue.cancel(handle));
        assert_eq!(queue.cancelled(), 0);
    }

    #[test]
    fn test_run_until_horizon_leaves_later_events() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::from_secs(1), 1);
        queue.schedule(Duration::from_secs(5), 5);
        queue.schedule(Duration::from_secs(10), 10);

        let mut ran = vec![];
        let executed = queue.run_until(Some(Duration::from_secs(5)), |_, e| ran.push(e));
        assert_eq!(executed, 2);
        assert_eq!(ran, vec![1, 5]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_handler_can_schedule_follow_ups() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::ZERO, 3u32);

        let mut times = vec![];
        queue.run_until(None, |q, remaining| {
            times.push(q.now());
            if remaining > 0 {
                q.schedule(Duration::from_secs(1), remaining - 1);
            }
        });
        assert_eq!(
            times,
            (0..4).map(Duration::from_secs).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut queue = EventQueue::new();
        queue.schedule(Duration::from_secs(1), ());
        queue.schedule(Duration::from_secs(2), ());
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.peek_time(), None);
    }
}
