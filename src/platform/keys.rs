//! Keyboard mapping for the input latch

use crate::sim::Direction;

/// Map a `KeyboardEvent.key` value to a paddle direction
pub fn direction_for_key(key: &str) -> Option<Direction> {
    match key {
        "ArrowLeft" | "a" | "A" => Some(Direction::Left),
        "ArrowRight" | "d" | "D" => Some(Direction::Right),
        _ => None,
    }
}
