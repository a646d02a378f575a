//! UDP echo client.

use crate::{ConfigError, EchoClientConfig};
use packetsim_core::{AppAction, AppEvent, Application, TimerId};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Timer driving the periodic send.
const SEND_TIMER: TimerId = TimerId(0);

/// Sends `max_packets` datagrams to an echo server, one every `interval`,
/// and counts the echoes that come back.
///
/// Starting arms the send timer with no delay, so the first packet leaves
/// at the start time unless the application is stopped at that same
/// instant. Each send arms the timer for the next one until the packet
/// budget is spent; the simulator cancels the timer when the application
/// stops, so the stop time caps the send schedule as well.
///
/// Every request carries its sequence number as the packet tag. The server
/// echoes the tag back, which lets replies be matched to requests even
/// when some are lost.
#[derive(Debug)]
pub struct UdpEchoClient {
    config: EchoClientConfig,

    /// Packets handed to the socket so far.
    sent: u32,

    /// Echoes received so far.
    received: u32,

    /// Send times of requests whose echo has not arrived yet, by sequence.
    outstanding: BTreeMap<u64, Duration>,

    /// Round-trip times of received echoes, in arrival order.
    round_trips: Vec<Duration>,

    /// Current simulation time.
    now: Duration,
}

impl UdpEchoClient {
    /// Create a client after validating its configuration.
    pub fn new(config: EchoClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sent: 0,
            received: 0,
            outstanding: BTreeMap::new(),
            round_trips: Vec::new(),
            now: Duration::ZERO,
        })
    }

    /// Packets sent so far.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Echoes received so far.
    pub fn received(&self) -> u32 {
        self.received
    }

    fn budget_left(&self) -> bool {
        self.config.max_packets == 0 || self.sent < self.config.max_packets
    }

    fn send(&mut self) -> Vec<AppAction> {
        if !self.budget_left() {
            return vec![];
        }

        self.sent += 1;
        let seq = u64::from(self.sent);
        self.outstanding.insert(seq, self.now);
        info!(
            time = ?self.now,
            bytes = self.config.packet_size,
            to = %self.config.remote,
            seq = self.sent,
            "Echo client sent packet"
        );

        let mut actions = vec![AppAction::Send {
            to: self.config.remote,
            payload_size: self.config.packet_size,
            tag: seq,
        }];
        if self.budget_left() {
            actions.push(AppAction::SetTimer {
                id: SEND_TIMER,
                after: self.config.interval,
            });
        }
        actions
    }
}

impl Application for UdpEchoClient {
    fn name(&self) -> &'static str {
        "UdpEchoClient"
    }

    fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Started => vec![
                AppAction::Bind { port: None },
                AppAction::SetTimer {
                    id: SEND_TIMER,
                    after: Duration::ZERO,
                },
            ],
            AppEvent::Timer(SEND_TIMER) => self.send(),
            AppEvent::Timer(other) => {
                debug!(timer = %other, "Echo client ignoring unknown timer");
                vec![]
            }
            AppEvent::Received(packet) => {
                self.received += 1;
                match self.outstanding.remove(&packet.tag) {
                    Some(sent_at) => self.round_trips.push(self.now.saturating_sub(sent_at)),
                    None => debug!(seq = packet.tag, "Echo reply matches no outstanding request"),
                }
                info!(
                    time = ?self.now,
                    bytes = packet.payload_size,
                    from = %packet.src,
                    seq = packet.tag,
                    "Echo client received packet"
                );
                vec![]
            }
            AppEvent::Stopped => {
                debug!(
                    sent = self.sent,
                    received = self.received,
                    "Echo client stopped"
                );
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

    fn round_trips(&self) -> &[Duration] {
        &self.round_trips
    }
}
