//! Per-frame simulation tick
//!
//! Advances paddle and ball, resolves collisions, updates bricks, score and
//! combo, and reports what happened. No I/O, cannot fail.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{
    Wall, ball_out_of_bounds, paddle_bounce_velocity, paddle_contact, point_in_brick,
    side_wall_hit, top_wall_hit,
};
use super::input::TickInput;
use super::state::{FrameState, Paddle, Tint};
use crate::consts::*;

/// Something the tick wants the effects system (and anyone else) to know about
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    WallBounce {
        pos: Vec2,
        wall: Wall,
        tint: Tint,
    },
    PaddleBounce {
        /// Contact point on the paddle top
        pos: Vec2,
        /// 0 = left end, 1 = right end
        hit_pos: f32,
    },
    BrickCleared {
        index: usize,
        center: Vec2,
        points: u64,
        combo: u32,
        tint: Tint,
    },
    /// Raised after a `BrickCleared` that pushed the combo to the milestone or beyond
    ComboMilestone { center: Vec2, combo: u32 },
    /// Ball left the bottom of the field
    BallLost { pos: Vec2, lives_left: u32 },
}

/// How the round stands after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Continue,
    /// Every brick cleared (terminal)
    Win,
    /// Ball lost, lives remain; the ball has been respawned
    LoseLife { lives_left: u32 },
    /// Last life lost (terminal)
    LoseGame,
}

impl RoundOutcome {
    /// Whether this outcome ends the round
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundOutcome::Win | RoundOutcome::LoseGame)
    }
}

/// Events raised during a tick plus the resulting outcome
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub events: Vec<CollisionEvent>,
    pub outcome: RoundOutcome,
}

/// Advance the frame state by one tick
pub fn tick(state: &mut FrameState, input: &TickInput) -> TickReport {
    let mut events = Vec::new();
    state.time_ticks += 1;

    update_paddle(&mut state.paddle, input);

    // Euler step, one tick per display refresh
    let ball = &mut state.ball;
    ball.pos += ball.vel;
    ball.record_trail();

    // Walls
    if let Some(wall) = side_wall_hit(ball.pos, ball.vel, ball.radius, FIELD_WIDTH) {
        ball.vel.x = -ball.vel.x;
        events.push(CollisionEvent::WallBounce {
            pos: ball.pos,
            wall,
            tint: Tint::Cyan,
        });
    }
    if top_wall_hit(ball.pos, ball.vel, ball.radius) {
        ball.vel.y = -ball.vel.y;
        events.push(CollisionEvent::WallBounce {
            pos: ball.pos,
            wall: Wall::Top,
            tint: Tint::Cyan,
        });
    }

    // Paddle
    if let Some(hit_pos) = paddle_contact(&state.ball, &state.paddle) {
        let speed = state.ball.speed();
        state.ball.vel = paddle_bounce_velocity(hit_pos, speed);
        state.paddle.glow = PADDLE_HIT_GLOW;
        state.score.reset_combo();
        events.push(CollisionEvent::PaddleBounce {
            pos: Vec2::new(state.ball.pos.x, state.paddle.pos.y),
            hit_pos,
        });
    }

    // Bricks: the ball passes through, every brick containing its center goes
    let center = state.ball.pos;
    for (index, brick) in state.bricks.iter_mut().enumerate() {
        if !brick.is_visible() || !point_in_brick(center, brick) {
            continue;
        }
        brick.clear();

        let points = state.score.register_brick_hit(input.now_ms);
        let combo = state.score.combo;
        let brick_center = brick.center();
        events.push(CollisionEvent::BrickCleared {
            index,
            center: brick_center,
            points,
            combo,
            tint: brick.tint(),
        });
        if combo >= COMBO_MILESTONE {
            events.push(CollisionEvent::ComboMilestone {
                center: brick_center,
                combo,
            });
        }
    }

    if state.visible_bricks() == 0 {
        log::info!("All bricks cleared, score {}", state.score.score);
        return TickReport {
            events,
            outcome: RoundOutcome::Win,
        };
    }

    if ball_out_of_bounds(&state.ball, FIELD_HEIGHT) {
        state.score.lives = state.score.lives.saturating_sub(1);
        state.score.reset_combo();
        let lives_left = state.score.lives;
        events.push(CollisionEvent::BallLost {
            pos: Vec2::new(state.ball.pos.x, FIELD_HEIGHT),
            lives_left,
        });

        if lives_left == 0 {
            log::info!("Last life lost, score {}", state.score.score);
            return TickReport {
                events,
                outcome: RoundOutcome::LoseGame,
            };
        }

        log::debug!("Life lost, {} remaining", lives_left);
        state.ball.respawn();
        return TickReport {
            events,
            outcome: RoundOutcome::LoseLife { lives_left },
        };
    }

    TickReport {
        events,
        outcome: RoundOutcome::Continue,
    }
}

/// Move the paddle from held keys and fade its glow
fn update_paddle(paddle: &mut Paddle, input: &TickInput) {
    let mut moved = false;
    if input.left && paddle.pos.x > 0.0 {
        paddle.pos.x -= paddle.speed;
        moved = true;
    }
    if input.right && paddle.right() < FIELD_WIDTH {
        paddle.pos.x += paddle.speed;
        moved = true;
    }
    paddle.pos.x = paddle.pos.x.clamp(0.0, FIELD_WIDTH - paddle.width);

    if moved {
        paddle.glow = (paddle.glow + PADDLE_MOVE_GLOW).min(PADDLE_MOVE_GLOW_MAX);
    }
    paddle.glow *= PADDLE_GLOW_DECAY;
}
