//! Particle bursts, floating indicators and screen shake
//!
//! Reacts to the events of a tick. Only touches the particle and indicator
//! collections and the cosmetic shake amplitude; gameplay fields are read-only
//! here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{FrameState, Indicator, Particle, Tint};
use super::tick::{CollisionEvent, RoundOutcome, TickReport};
use crate::consts::*;
use crate::settings::Settings;

/// Particle counts per burst
const WALL_SPARKS: usize = 5;
const PADDLE_SPARKS: usize = 8;
const BRICK_DEBRIS: usize = 12;
const MILESTONE_SPARKLE: usize = 20;
const BALL_LOST_BURST: usize = 15;
const GAME_OVER_BURST: usize = 30;
const VICTORY_BURST: usize = 50;

/// Shake amplitudes
const WALL_SHAKE: f32 = 3.0;
const PADDLE_SHAKE: f32 = 2.0;
const BALL_LOST_SHAKE: f32 = 10.0;

/// Milestone text floats this far above the brick
const MILESTONE_TEXT_OFFSET: f32 = 30.0;

/// Effects system state (seeded RNG plus limits from settings)
#[derive(Debug, Clone)]
pub struct Effects {
    rng: Pcg32,
    max_particles: usize,
    screen_shake: bool,
}

impl Effects {
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            max_particles: settings.max_particles(),
            screen_shake: settings.effective_screen_shake(),
        }
    }

    /// Reseed for a new round
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Pick up changed settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.max_particles = settings.max_particles();
        self.screen_shake = settings.effective_screen_shake();
    }

    /// Run one tick of effects: age what exists, then spawn for new events
    pub fn update(&mut self, state: &mut FrameState, report: &TickReport) {
        decay(state);

        for event in &report.events {
            self.on_event(state, event);
        }
        self.on_outcome(state, report.outcome);

        let overflow = state.particles.len().saturating_sub(self.max_particles);
        if overflow > 0 {
            // Oldest go first
            state.particles.drain(..overflow);
        }
    }

    fn on_event(&mut self, state: &mut FrameState, event: &CollisionEvent) {
        match *event {
            CollisionEvent::WallBounce { pos, tint, .. } => {
                self.burst(state, pos, tint, WALL_SPARKS);
                self.shake(state, WALL_SHAKE);
            }
            CollisionEvent::PaddleBounce { pos, .. } => {
                self.burst(state, pos, Tint::Cyan, PADDLE_SPARKS);
                self.shake(state, PADDLE_SHAKE);
            }
            CollisionEvent::BrickCleared {
                center,
                points,
                combo,
                tint,
                ..
            } => {
                self.burst(state, center, tint, BRICK_DEBRIS);
                let indicator = if points > BRICK_BASE_SCORE {
                    Indicator::new(center, format!("+{points} COMBO!"), Tint::Cyan)
                } else {
                    Indicator::new(center, format!("+{points}"), Tint::Gold)
                };
                state.indicators.push(indicator);
                self.shake(state, (2.0 + combo as f32 * 0.5).min(SHAKE_MAX_BRICK));
            }
            CollisionEvent::ComboMilestone { center, combo } => {
                self.burst(state, center, Tint::Gold, MILESTONE_SPARKLE);
                state.indicators.push(Indicator::new(
                    center - Vec2::new(0.0, MILESTONE_TEXT_OFFSET),
                    format!("{combo}x COMBO!"),
                    Tint::Red,
                ));
            }
            CollisionEvent::BallLost { pos, .. } => {
                self.burst(state, pos, Tint::Red, BALL_LOST_BURST);
                self.shake(state, BALL_LOST_SHAKE);
            }
        }
    }

    fn on_outcome(&mut self, state: &mut FrameState, outcome: RoundOutcome) {
        let center = Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0);
        match outcome {
            RoundOutcome::Continue => {}
            RoundOutcome::Win => {
                self.burst(state, center, Tint::Cyan, VICTORY_BURST);
                state
                    .indicators
                    .push(Indicator::new(center, "VICTORY!".to_string(), Tint::Gold));
            }
            RoundOutcome::LoseGame => {
                self.burst(state, center, Tint::Red, GAME_OVER_BURST);
                state
                    .indicators
                    .push(Indicator::new(center, "GAME OVER".to_string(), Tint::Red));
            }
            RoundOutcome::LoseLife { lives_left } => {
                state.indicators.push(Indicator::new(
                    center,
                    format!("{lives_left} LIVES LEFT"),
                    Tint::Gold,
                ));
            }
        }
    }

    /// Spray `count` particles out of `pos`
    fn burst(&mut self, state: &mut FrameState, pos: Vec2, tint: Tint, count: usize) {
        if self.max_particles == 0 {
            return;
        }
        for _ in 0..count {
            let vel = Vec2::new(
                self.rng.random_range(-PARTICLE_SPREAD..PARTICLE_SPREAD),
                self.rng.random_range(-PARTICLE_SPREAD..PARTICLE_SPREAD),
            );
            state.particles.push(Particle {
                pos,
                vel,
                tint,
                life: 1.0,
                decay: PARTICLE_DECAY,
                size: self.rng.random_range(PARTICLE_MIN_SIZE..PARTICLE_MAX_SIZE),
            });
        }
    }

    /// Raise the shake amplitude to at least `amount`
    fn shake(&self, state: &mut FrameState, amount: f32) {
        if self.screen_shake {
            state.screen_shake = state.screen_shake.max(amount);
        }
    }
}

impl Indicator {
    pub fn new(pos: Vec2, text: String, tint: Tint) -> Self {
        Self {
            pos,
            text,
            tint,
            life: 1.0,
            decay: INDICATOR_DECAY,
        }
    }

    /// Where to draw it: drifts upward as it fades
    pub fn display_pos(&self) -> Vec2 {
        self.pos - Vec2::new(0.0, (1.0 - self.life) * INDICATOR_RISE)
    }
}

/// Age every particle and indicator by one tick and drop the dead ones
pub fn decay(state: &mut FrameState) {
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel;
        particle.vel *= PARTICLE_DAMPING;
        particle.life -= particle.decay;
    }
    state.particles.retain(|p| p.life > 0.0);

    for indicator in state.indicators.iter_mut() {
        indicator.life -= indicator.decay;
    }
    state.indicators.retain(|i| i.life > 0.0);
}

/// Fade screen shake after a render pass
pub fn decay_screen_shake(state: &mut FrameState) {
    state.screen_shake *= SHAKE_DECAY;
    if state.screen_shake < 0.01 {
        state.screen_shake = 0.0;
    }
}
