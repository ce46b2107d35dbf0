//! Round simulation
//!
//! All gameplay logic lives here. Pure in-memory state transitions:
//! - One tick per display refresh
//! - Seeded RNG only (and only for cosmetic effects)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod input;
pub mod state;
pub mod tick;

pub use collision::Wall;
pub use effects::{Effects, decay_screen_shake};
pub use input::{Direction, InputLatch, TickInput};
pub use state::{Ball, Brick, FrameState, Indicator, Paddle, Particle, RoundScore, Tint};
pub use tick::{CollisionEvent, RoundOutcome, TickReport, tick};
