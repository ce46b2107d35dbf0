//! Frame state and core simulation types
//!
//! Everything the tick mutates and the renderer reads lives in `FrameState`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Cosmetic color tags carried by particles, indicators and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    /// Paddle and wall sparks
    Cyan,
    /// Score popups and milestone sparkle
    Gold,
    /// Life loss and big combos
    Red,
    /// Brick debris, colored by grid row
    Row(u8),
}

impl Tint {
    /// RGB components in 0-1
    pub fn rgb(&self) -> [f32; 3] {
        match self {
            Tint::Cyan => [78.0 / 255.0, 205.0 / 255.0, 196.0 / 255.0],
            Tint::Gold => [1.0, 215.0 / 255.0, 0.0],
            Tint::Red => [1.0, 107.0 / 255.0, 107.0 / 255.0],
            Tint::Row(row) => hsl_to_rgb(*row as f32 * 60.0, 0.7, 0.5),
        }
    }

    /// RGBA with the given alpha
    pub fn rgba(&self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.rgb();
        [r, g, b, alpha]
    }
}

/// Convert HSL (hue in degrees, saturation/lightness in 0-1) to RGB
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// The player's paddle
#[derive(Debug, Clone)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Units per tick
    pub speed: f32,
    /// Decaying glow amplitude (cosmetic)
    pub glow: f32,
}

impl Default for Paddle {
    fn default() -> Self {
        Self {
            pos: Vec2::new(
                FIELD_WIDTH / 2.0 - PADDLE_WIDTH / 2.0,
                FIELD_HEIGHT - PADDLE_BOTTOM_OFFSET,
            ),
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            speed: PADDLE_SPEED,
            glow: 0.0,
        }
    }
}

impl Paddle {
    /// Right edge x
    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.width
    }

    /// Horizontal center x
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }
}

/// The ball
#[derive(Debug, Clone)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Recent positions, oldest first
    pub trail: Vec<Vec2>,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            pos: Ball::spawn_pos(),
            vel: Ball::spawn_vel(),
            radius: BALL_RADIUS,
            trail: Vec::with_capacity(TRAIL_LENGTH + 1),
        }
    }
}

impl Ball {
    /// Where the ball (re)appears at round start and after a lost life
    pub fn spawn_pos() -> Vec2 {
        Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - BALL_SPAWN_BOTTOM_OFFSET)
    }

    pub fn spawn_vel() -> Vec2 {
        Vec2::new(BALL_SPAWN_DX, BALL_SPAWN_DY)
    }

    /// Append the current position, evicting the oldest point past `TRAIL_LENGTH`
    pub fn record_trail(&mut self) {
        self.trail.push(self.pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.remove(0);
        }
    }

    /// Put the ball back at the spawn point with the spawn velocity
    pub fn respawn(&mut self) {
        self.pos = Ball::spawn_pos();
        self.vel = Ball::spawn_vel();
        self.trail.clear();
    }

    /// Current speed magnitude
    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A brick in the grid
#[derive(Debug, Clone)]
pub struct Brick {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Grid row, also the color tag
    pub row: u8,
    pub col: u8,
    visible: bool,
}

impl Brick {
    pub fn new(row: u8, col: u8) -> Self {
        let pos = Vec2::new(
            col as f32 * (BRICK_WIDTH + BRICK_PADDING) + BRICK_OFFSET_LEFT,
            row as f32 * (BRICK_HEIGHT + BRICK_PADDING) + BRICK_OFFSET_TOP,
        );
        Self {
            pos,
            size: Vec2::new(BRICK_WIDTH, BRICK_HEIGHT),
            row,
            col,
            visible: true,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hide the brick. There is no way back.
    pub fn clear(&mut self) {
        self.visible = false;
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn tint(&self) -> Tint {
        Tint::Row(self.row)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub tint: Tint,
    /// 0-1, decreases every tick
    pub life: f32,
    pub decay: f32,
    pub size: f32,
}

/// Floating text marker (score popups, status messages)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub pos: Vec2,
    pub text: String,
    pub tint: Tint,
    /// 0-1, decreases every tick
    pub life: f32,
    pub decay: f32,
}

/// Score, lives and combo bookkeeping for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    pub score: u64,
    pub lives: u32,
    pub combo: u32,
    pub max_combo: u32,
    /// Host timestamp of the last brick hit; `None` after a reset
    pub last_brick_hit_ms: Option<f64>,
}

impl Default for RoundScore {
    fn default() -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
            combo: 0,
            max_combo: 0,
            last_brick_hit_ms: None,
        }
    }
}

impl RoundScore {
    /// Register a brick hit at `now_ms` and return the points it is worth
    pub fn register_brick_hit(&mut self, now_ms: f64) -> u64 {
        let in_window = self
            .last_brick_hit_ms
            .is_some_and(|last| now_ms - last < COMBO_WINDOW_MS);
        self.combo = if in_window { self.combo + 1 } else { 1 };
        self.last_brick_hit_ms = Some(now_ms);
        self.max_combo = self.max_combo.max(self.combo);

        let points = BRICK_BASE_SCORE + (self.combo / COMBO_BONUS_STEP) as u64 * COMBO_BONUS;
        self.score += points;
        points
    }

    /// Drop the running combo (paddle hit or lost life)
    pub fn reset_combo(&mut self) {
        self.combo = 0;
        self.last_brick_hit_ms = None;
    }
}

/// Complete frame state for one round
#[derive(Debug, Clone)]
pub struct FrameState {
    pub paddle: Paddle,
    pub ball: Ball,
    /// Row-major, `BRICK_ROWS * BRICK_COLS` entries
    pub bricks: Vec<Brick>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    /// Floating indicators (not gameplay-affecting)
    pub indicators: Vec<Indicator>,
    pub score: RoundScore,
    /// Screen shake amplitude in field units (cosmetic)
    pub screen_shake: f32,
    /// Ticks simulated this round
    pub time_ticks: u64,
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameState {
    /// Fresh board: centered paddle, ball at spawn, full brick grid
    pub fn new() -> Self {
        let bricks = (0..BRICK_ROWS)
            .flat_map(|r| (0..BRICK_COLS).map(move |c| Brick::new(r as u8, c as u8)))
            .collect();

        Self {
            paddle: Paddle::default(),
            ball: Ball::default(),
            bricks,
            particles: Vec::new(),
            indicators: Vec::new(),
            score: RoundScore::default(),
            screen_shake: 0.0,
            time_ticks: 0,
        }
    }

    /// Number of bricks still standing
    pub fn visible_bricks(&self) -> usize {
        self.bricks.iter().filter(|b| b.is_visible()).count()
    }

    /// Brick at a grid cell
    pub fn brick(&self, row: usize, col: usize) -> Option<&Brick> {
        if row >= BRICK_ROWS || col >= BRICK_COLS {
            return None;
        }
        self.bricks.get(row * BRICK_COLS + col)
    }
}
