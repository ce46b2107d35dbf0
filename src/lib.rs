//! Brick Wager - a brick breaker whose rounds are paid for and settled on a ledger
//!
//! Core modules:
//! - `sim`: Frame state, physics, collisions and visual effects
//! - `game_loop`: Per-frame scheduler state machine
//! - `round`: Round controller and the ledger client boundary
//! - `renderer`: Scene building and the WebGPU pipeline
//! - `platform`: Browser input mapping

pub mod game_loop;
pub mod platform;
pub mod renderer;
pub mod round;
pub mod settings;
pub mod sim;

pub use game_loop::{FrameHandle, FrameStep, GameLoop, LoopState, RoundSummary};
pub use round::{LedgerClient, LedgerError, PlayMode, PlayerStats, RoundController, Wei};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (logical units)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    /// Horizontal speed in units per tick
    pub const PADDLE_SPEED: f32 = 8.0;
    /// Distance from the paddle top to the bottom of the field
    pub const PADDLE_BOTTOM_OFFSET: f32 = 30.0;
    /// Glow added per tick of movement, and its cap
    pub const PADDLE_MOVE_GLOW: f32 = 2.0;
    pub const PADDLE_MOVE_GLOW_MAX: f32 = 20.0;
    /// Glow set by a ball hit
    pub const PADDLE_HIT_GLOW: f32 = 30.0;
    pub const PADDLE_GLOW_DECAY: f32 = 0.95;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Spawn point sits this far above the bottom of the field
    pub const BALL_SPAWN_BOTTOM_OFFSET: f32 = 50.0;
    pub const BALL_SPAWN_DX: f32 = 4.0;
    pub const BALL_SPAWN_DY: f32 = -4.0;
    /// Trail points kept behind the ball
    pub const TRAIL_LENGTH: usize = 10;

    /// Brick grid layout
    pub const BRICK_ROWS: usize = 5;
    pub const BRICK_COLS: usize = 10;
    pub const BRICK_WIDTH: f32 = 70.0;
    pub const BRICK_HEIGHT: f32 = 20.0;
    pub const BRICK_PADDING: f32 = 5.0;
    pub const BRICK_OFFSET_TOP: f32 = 60.0;
    pub const BRICK_OFFSET_LEFT: f32 = 35.0;

    /// Scoring
    pub const STARTING_LIVES: u32 = 3;
    pub const BRICK_BASE_SCORE: u64 = 10;
    /// Every this many combo hits adds `COMBO_BONUS` to a brick's value
    pub const COMBO_BONUS_STEP: u32 = 3;
    pub const COMBO_BONUS: u64 = 5;
    /// Max gap between brick hits that keeps a combo alive
    pub const COMBO_WINDOW_MS: f64 = 1000.0;
    /// Combo at which the milestone effects fire
    pub const COMBO_MILESTONE: u32 = 5;

    /// Particles
    pub const PARTICLE_DECAY: f32 = 0.02;
    pub const PARTICLE_DAMPING: f32 = 0.98;
    /// Max initial speed per axis
    pub const PARTICLE_SPREAD: f32 = 4.0;
    pub const PARTICLE_MIN_SIZE: f32 = 2.0;
    pub const PARTICLE_MAX_SIZE: f32 = 6.0;

    /// Floating indicators
    pub const INDICATOR_DECAY: f32 = 0.015;
    /// Vertical drift of an indicator over its lifetime
    pub const INDICATOR_RISE: f32 = 30.0;

    /// Screen shake
    pub const SHAKE_DECAY: f32 = 0.9;
    pub const SHAKE_MAX_BRICK: f32 = 8.0;
}
