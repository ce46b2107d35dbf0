//! Held-key latch and per-tick input

/// One of the two directional signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Currently held directions.
///
/// Written by the key listener, sampled once per tick. Last writer wins;
/// nothing is queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputLatch {
    left: bool,
    right: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn press(&mut self, direction: Direction) {
        self.set(direction, true);
    }

    pub fn release(&mut self, direction: Direction) {
        self.set(direction, false);
    }

    /// Drop all held keys (focus loss, round restart)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Snapshot the latch into a tick input stamped with the frame time
    pub fn sample(&self, now_ms: f64) -> TickInput {
        TickInput {
            left: self.left,
            right: self.right,
            now_ms,
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Host frame timestamp in milliseconds (drives the combo window)
    pub now_ms: f64,
}
