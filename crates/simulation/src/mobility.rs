//! Position models for nodes on wireless channels.

use packetsim_types::{Position, Rectangle};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;
use std::time::Duration;
use tracing::{debug, info};

/// Supplies a node's position over simulated time.
///
/// Queries arrive with non-decreasing `now`; models may advance internal
/// state on each call.
pub trait MobilityModel {
    /// Position at simulated time `now`.
    fn position(&mut self, now: Duration) -> Position;
}

/// A node that never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPosition(pub Position);

impl MobilityModel for ConstantPosition {
    fn position(&mut self, _now: Duration) -> Position {
        self.0
    }
}

/// Random walk in a rectangle.
///
/// Every `leg` the walker draws a new speed uniformly from
/// `[min_speed, max_speed]` m/s and a new heading uniformly from
/// `[0, 2π)`. Walls reflect the walker back into `bounds`.
#[derive(Debug, Clone)]
pub struct RandomWalk2d {
    bounds: Rectangle,
    min_speed: f64,
    max_speed: f64,
    leg: Duration,
    rng: ChaCha8Rng,

    leg_start: Duration,
    leg_origin: Position,
    velocity: (f64, f64),

    /// Set for walkers whose course changes are reported at `info`.
    label: Option<String>,
    course_changes: u64,
}

impl RandomWalk2d {
    /// Start a walk at `start` confined to `bounds`.
    ///
    /// Defaults to 2–4 m/s with a new course every second.
    pub fn new(start: Position, bounds: Rectangle, rng: ChaCha8Rng) -> Self {
        let mut walk = Self {
            bounds,
            min_speed: 2.0,
            max_speed: 4.0,
            leg: Duration::from_secs(1),
            rng,
            leg_start: Duration::ZERO,
            leg_origin: reflect_into(start, &bounds),
            velocity: (0.0, 0.0),
            label: None,
            course_changes: 0,
        };
        walk.velocity = walk.draw_velocity();
        walk
    }

    /// Set the speed range in m/s.
    pub fn with_speed(mut self, min_speed: f64, max_speed: f64) -> Self {
        self.min_speed = min_speed.min(max_speed);
        self.max_speed = max_speed.max(min_speed);
        self.velocity = self.draw_velocity();
        self
    }

    /// Set how long each leg lasts. Zero is treated as one nanosecond.
    pub fn with_leg(mut self, leg: Duration) -> Self {
        self.leg = leg.max(Duration::from_nanos(1));
        self
    }

    /// Report this walker's course changes at `info` under `label`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Course changes so far.
    pub fn course_changes(&self) -> u64 {
        self.course_changes
    }

    fn draw_velocity(&mut self) -> (f64, f64) {
        let speed = if self.max_speed > self.min_speed {
            self.rng.gen_range(self.min_speed..=self.max_speed)
        } else {
            self.min_speed
        };
        let heading = self.rng.gen_range(0.0..TAU);
        (speed * heading.cos(), speed * heading.sin())
    }

    fn position_in_leg(&self, elapsed: Duration) -> Position {
        let t = elapsed.as_secs_f64();
        let free = Position::new(
            self.leg_origin.x + self.velocity.0 * t,
            self.leg_origin.y + self.velocity.1 * t,
        );
        reflect_into(free, &self.bounds)
    }
}

impl MobilityModel for RandomWalk2d {
    fn position(&mut self, now: Duration) -> Position {
        while now >= self.leg_start + self.leg {
            self.leg_origin = self.position_in_leg(self.leg);
            self.leg_start += self.leg;
            self.velocity = self.draw_velocity();
            self.course_changes += 1;

            let at = self.leg_start;
            let p = self.leg_origin;
            match &self.label {
                Some(label) => info!(walker = %label, time = ?at, x = p.x, y = p.y, "Course change"),
                None => debug!(time = ?at, x = p.x, y = p.y, "Course change"),
            }
        }
        self.position_in_leg(now.saturating_sub(self.leg_start))
    }
}

/// Fold an unconstrained coordinate back into `[min, max]` as if it had
/// bounced off both walls.
fn reflect(value: f64, min: f64, max: f64) -> f64 {
    let width = max - min;
    if width <= 0.0 {
        return min;
    }
    let mut offset = (value - min).rem_euclid(2.0 * width);
    if offset > width {
        offset = 2.0 * width - offset;
    }
    min + offset
}

fn reflect_into(p: Position, bounds: &Rectangle) -> Position {
    Position::new(
        reflect(p.x, bounds.x_min, bounds.x_max),
        reflect(p.y, bounds.y_min, bounds.y_max),
    )
}

/// Lays positions out on a grid, row first.
///
/// Yields `(min_x, min_y)`, `(min_x + delta_x, min_y)`, … and starts a new
/// row every `grid_width` positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPositionAllocator {
    /// X of the first column.
    pub min_x: f64,
    /// Y of the first row.
    pub min_y: f64,
    /// Column spacing.
    pub delta_x: f64,
    /// Row spacing.
    pub delta_y: f64,
    /// Positions per row.
    pub grid_width: u32,
    next: u32,
}

impl GridPositionAllocator {
    /// Create an allocator. A zero `grid_width` is treated as one.
    pub fn new(min_x: f64, min_y: f64, delta_x: f64, delta_y: f64, grid_width: u32) -> Self {
        Self {
            min_x,
            min_y,
            delta_x,
            delta_y,
            grid_width: grid_width.max(1),
            next: 0,
        }
    }

    /// Position of the `index`-th slot.
    pub fn slot(&self, index: u32) -> Position {
        let column = index % self.grid_width;
        let row = index / self.grid_width;
        Position::new(
            self.min_x + f64::from(column) * self.delta_x,
            self.min_y + f64::from(row) * self.delta_y,
        )
    }
}

impl Iterator for GridPositionAllocator {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        let p = self.slot(self.next);
        self.next = self.next.checked_add(1)?;
        Some(p)
    }
}
