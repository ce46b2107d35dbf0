//! Scene building: turns a frame state into one triangle list
//!
//! Draw order is back to front: background, starfield, bricks, trail,
//! paddle, ball, particles. Text is not drawn here; the HUD owns it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::FrameState;

const STAR_COUNT: usize = 50;
const STAR_SEED: u64 = 0x5eed_57a2;

/// Layout and quality knobs plus the static starfield
#[derive(Debug, Clone)]
pub struct Scene {
    stars: Vec<Vec2>,
    trails: bool,
    circle_segments: u32,
}

impl Scene {
    pub fn new(settings: &Settings) -> Self {
        let mut scene = Self {
            stars: Vec::new(),
            trails: true,
            circle_segments: 16,
        };
        scene.apply_settings(settings);
        scene
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.trails = settings.trails;
        self.circle_segments = settings.quality.circle_segments();
        self.stars = if settings.quality.starfield_enabled() {
            // Same sky every time
            let mut rng = Pcg32::seed_from_u64(STAR_SEED);
            (0..STAR_COUNT)
                .map(|_| {
                    Vec2::new(
                        rng.random_range(0.0..FIELD_WIDTH),
                        rng.random_range(0.0..FIELD_HEIGHT),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };
    }

    /// Build the full frame, every vertex moved by `offset`
    pub fn build(&self, state: &FrameState, offset: Vec2) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(2048);

        out.extend(shapes::vertical_gradient(
            Vec2::ZERO,
            Vec2::new(FIELD_WIDTH, FIELD_HEIGHT),
            colors::BACKGROUND_TOP,
            colors::BACKGROUND_BOTTOM,
        ));
        for star in &self.stars {
            out.extend(shapes::rect(*star, Vec2::ONE, colors::STAR));
        }

        self.push_bricks(state, &mut out);
        if self.trails {
            self.push_trail(state, &mut out);
        }
        self.push_paddle(state, &mut out);
        self.push_ball(state, &mut out);
        self.push_particles(state, &mut out);

        if offset != Vec2::ZERO {
            for v in out.iter_mut() {
                v.position[0] += offset.x;
                v.position[1] += offset.y;
            }
        }
        out
    }

    fn push_bricks(&self, state: &FrameState, out: &mut Vec<Vertex>) {
        for brick in state.bricks.iter().filter(|b| b.is_visible()) {
            out.extend(shapes::rect(brick.pos, brick.size, brick.tint().rgba(1.0)));
            // Top highlight strip
            out.extend(shapes::rect(
                brick.pos,
                Vec2::new(brick.size.x, 4.0),
                colors::HIGHLIGHT,
            ));
        }
    }

    fn push_trail(&self, state: &FrameState, out: &mut Vec<Vertex>) {
        let trail = &state.ball.trail;
        let len = trail.len() as f32;
        for (i, point) in trail.iter().enumerate() {
            let alpha = (i as f32 / len) * 0.5;
            let [r, g, b] = colors::TRAIL;
            out.extend(shapes::circle(
                *point,
                state.ball.radius,
                [r, g, b, alpha],
                self.circle_segments,
            ));
        }
    }

    fn push_paddle(&self, state: &FrameState, out: &mut Vec<Vertex>) {
        let paddle = &state.paddle;
        if paddle.glow > 0.5 {
            let halo = Vec2::splat(paddle.glow * 0.5);
            let mut color = colors::PADDLE_GLOW;
            color[3] *= (paddle.glow / PADDLE_HIT_GLOW).min(1.0);
            out.extend(shapes::rect(
                paddle.pos - halo,
                Vec2::new(paddle.width, paddle.height) + halo * 2.0,
                color,
            ));
        }
        out.extend(shapes::rect(
            paddle.pos,
            Vec2::new(paddle.width, paddle.height),
            colors::PADDLE,
        ));
        out.extend(shapes::rect(
            paddle.pos,
            Vec2::new(paddle.width, paddle.height / 3.0),
            colors::HIGHLIGHT,
        ));
    }

    fn push_ball(&self, state: &FrameState, out: &mut Vec<Vertex>) {
        let ball = &state.ball;
        out.extend(shapes::radial_glow(
            ball.pos,
            ball.radius * 2.0,
            colors::BALL_GLOW,
            self.circle_segments,
        ));
        out.extend(shapes::circle(
            ball.pos,
            ball.radius,
            colors::BALL,
            self.circle_segments,
        ));
        out.extend(shapes::circle(
            ball.pos - Vec2::splat(ball.radius * 0.3),
            ball.radius * 0.3,
            colors::HIGHLIGHT,
            self.circle_segments / 2,
        ));
    }

    fn push_particles(&self, state: &FrameState, out: &mut Vec<Vertex>) {
        let segments = (self.circle_segments / 2).max(6);
        for p in &state.particles {
            out.extend(shapes::circle(
                p.pos,
                p.size * p.life,
                p.tint.rgba(p.life),
                segments,
            ));
        }
    }
}

/// Random view jitter for a shake amplitude, within ±amplitude/2 per axis
pub fn shake_offset(rng: &mut impl Rng, amplitude: f32) -> Vec2 {
    if amplitude <= 0.0 {
        return Vec2::ZERO;
    }
    let half = amplitude / 2.0;
    Vec2::new(rng.random_range(-half..=half), rng.random_range(-half..=half))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;

    fn scene(preset: QualityPreset) -> Scene {
        Scene::new(&Settings::from_preset(preset))
    }

    #[test]
    fn test_cleared_bricks_are_not_drawn() {
        let scene = scene(QualityPreset::Medium);
        let mut state = FrameState::new();
        let full = scene.build(&state, Vec2::ZERO).len();
        state.bricks[0].clear();
        state.bricks[1].clear();
        let fewer = scene.build(&state, Vec2::ZERO).len();
        // Body plus highlight strip per brick
        assert_eq!(full - fewer, 2 * 12);
    }

    #[test]
    fn test_low_preset_drops_stars_and_trail() {
        let mut state = FrameState::new();
        for i in 0..5 {
            state.ball.pos = Vec2::new(100.0 + i as f32, 300.0);
            state.ball.record_trail();
        }
        let low = scene(QualityPreset::Low).build(&state, Vec2::ZERO).len();
        let medium = scene(QualityPreset::Medium).build(&state, Vec2::ZERO).len();
        assert!(low < medium);
        assert!(scene(QualityPreset::Low).stars.is_empty());
        assert_eq!(scene(QualityPreset::High).stars.len(), STAR_COUNT);
    }

    #[test]
    fn test_starfield_is_stable() {
        let a = scene(QualityPreset::Medium);
        let b = scene(QualityPreset::Medium);
        assert_eq!(a.stars, b.stars);
    }

    #[test]
    fn test_offset_moves_every_vertex() {
        let scene = scene(QualityPreset::Medium);
        let state = FrameState::new();
        let base = scene.build(&state, Vec2::ZERO);
        let moved = scene.build(&state, Vec2::new(3.0, -2.0));
        assert_eq!(base.len(), moved.len());
        for (a, b) in base.iter().zip(&moved) {
            assert!((b.position[0] - a.position[0] - 3.0).abs() < 1e-3);
            assert!((b.position[1] - a.position[1] + 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_shake_offset_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(shake_offset(&mut rng, 0.0), Vec2::ZERO);
        for _ in 0..200 {
            let o = shake_offset(&mut rng, 8.0);
            assert!(o.x.abs() <= 4.0 && o.y.abs() <= 4.0);
        }
    }

    #[test]
    fn test_particles_shrink_with_life() {
        let scene = scene(QualityPreset::Medium);
        let mut state = FrameState::new();
        state.particles.push(crate::sim::Particle {
            pos: Vec2::new(200.0, 200.0),
            vel: Vec2::ZERO,
            tint: crate::sim::Tint::Gold,
            life: 0.5,
            decay: PARTICLE_DECAY,
            size: 4.0,
        });
        let verts = scene.build(&state, Vec2::ZERO);
        let last = verts.last().unwrap();
        assert_eq!(last.color[3], 0.5);
        let d = Vec2::from(last.position).distance(Vec2::new(200.0, 200.0));
        assert!(d <= 2.0 + 1e-4);
    }
}
