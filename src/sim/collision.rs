//! Collision detection and response for the rectangular playfield
//!
//! All tests here are pure functions of positions and velocities; the tick
//! decides what to do with the answers.

use std::f32::consts::FRAC_PI_3;

use glam::Vec2;

use super::state::{Ball, Brick, Paddle};

/// Which wall the ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Top,
}

/// Check the left and right walls.
///
/// Only reports a hit while the ball is still heading outward, so a ball
/// that overlaps the wall after bouncing is not flipped back.
pub fn side_wall_hit(pos: Vec2, vel: Vec2, radius: f32, field_width: f32) -> Option<Wall> {
    if pos.x + radius > field_width && vel.x > 0.0 {
        Some(Wall::Right)
    } else if pos.x - radius < 0.0 && vel.x < 0.0 {
        Some(Wall::Left)
    } else {
        None
    }
}

/// Check the top wall (same outward-only rule as the sides)
pub fn top_wall_hit(pos: Vec2, vel: Vec2, radius: f32) -> bool {
    pos.y - radius < 0.0 && vel.y < 0.0
}

/// Check ball against paddle.
///
/// A hit needs the ball moving down, its bottom edge past the paddle top,
/// its center not yet past the paddle bottom, and its center inside the
/// paddle span. Returns the hit position across the paddle in [0, 1].
pub fn paddle_contact(ball: &Ball, paddle: &Paddle) -> Option<f32> {
    if ball.vel.y <= 0.0 {
        return None;
    }
    let bottom = ball.pos.y + ball.radius;
    if bottom <= paddle.pos.y || ball.pos.y > paddle.pos.y + paddle.height {
        return None;
    }
    if ball.pos.x < paddle.pos.x || ball.pos.x > paddle.right() {
        return None;
    }
    Some((ball.pos.x - paddle.pos.x) / paddle.width)
}

/// Outgoing velocity for a paddle hit.
///
/// The hit position maps linearly onto a 60° fan centered on vertical
/// (±30° at the paddle ends); the speed magnitude is kept.
pub fn paddle_bounce_velocity(hit_pos: f32, speed: f32) -> Vec2 {
    let angle = (hit_pos - 0.5) * FRAC_PI_3;
    Vec2::new(speed * angle.sin(), -speed * angle.cos())
}

/// Whether a point lies strictly inside a brick's box
#[inline]
pub fn point_in_brick(point: Vec2, brick: &Brick) -> bool {
    point.x > brick.pos.x
        && point.x < brick.pos.x + brick.size.x
        && point.y > brick.pos.y
        && point.y < brick.pos.y + brick.size.y
}

/// Whether the ball's bottom edge has left the field
#[inline]
pub fn ball_out_of_bounds(ball: &Ball, field_height: f32) -> bool {
    ball.pos.y + ball.radius > field_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_side_walls() {
        let r = BALL_RADIUS;
        assert_eq!(
            side_wall_hit(Vec2::new(795.0, 300.0), Vec2::new(4.0, 4.0), r, FIELD_WIDTH),
            Some(Wall::Right)
        );
        assert_eq!(
            side_wall_hit(Vec2::new(5.0, 300.0), Vec2::new(-4.0, 4.0), r, FIELD_WIDTH),
            Some(Wall::Left)
        );
        // Already heading back in
        assert_eq!(
            side_wall_hit(Vec2::new(795.0, 300.0), Vec2::new(-4.0, 4.0), r, FIELD_WIDTH),
            None
        );
        assert_eq!(
            side_wall_hit(Vec2::new(400.0, 300.0), Vec2::new(4.0, 4.0), r, FIELD_WIDTH),
            None
        );
    }

    #[test]
    fn test_top_wall() {
        assert!(top_wall_hit(Vec2::new(400.0, 5.0), Vec2::new(0.0, -4.0), 8.0));
        assert!(!top_wall_hit(Vec2::new(400.0, 5.0), Vec2::new(0.0, 4.0), 8.0));
        assert!(!top_wall_hit(Vec2::new(400.0, 50.0), Vec2::new(0.0, -4.0), 8.0));
    }

    #[test]
    fn test_paddle_contact_center() {
        let paddle = Paddle::default();
        let mut ball = Ball::default();
        ball.pos = Vec2::new(paddle.center_x(), paddle.pos.y - 4.0);
        ball.vel = Vec2::new(0.0, 4.0);
        let hit = paddle_contact(&ball, &paddle).expect("should hit");
        assert!((hit - 0.5).abs() < 1e-6);

        // Moving up never counts
        ball.vel = Vec2::new(0.0, -4.0);
        assert!(paddle_contact(&ball, &paddle).is_none());
    }

    #[test]
    fn test_paddle_contact_edges_and_misses() {
        let paddle = Paddle::default();
        let mut ball = Ball::default();
        ball.vel = Vec2::new(0.0, 4.0);
        ball.pos = Vec2::new(paddle.pos.x, paddle.pos.y);
        assert_eq!(paddle_contact(&ball, &paddle), Some(0.0));
        ball.pos = Vec2::new(paddle.right(), paddle.pos.y);
        assert_eq!(paddle_contact(&ball, &paddle), Some(1.0));

        // Outside the span
        ball.pos = Vec2::new(paddle.pos.x - 1.0, paddle.pos.y);
        assert!(paddle_contact(&ball, &paddle).is_none());
        // Above the paddle
        ball.pos = Vec2::new(paddle.center_x(), paddle.pos.y - 20.0);
        assert!(paddle_contact(&ball, &paddle).is_none());
        // Already fell past it
        ball.pos = Vec2::new(paddle.center_x(), paddle.pos.y + paddle.height + 1.0);
        assert!(paddle_contact(&ball, &paddle).is_none());
    }

    #[test]
    fn test_paddle_bounce_preserves_speed() {
        let speed = Vec2::new(4.0, 4.0).length();
        for hit in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let vel = paddle_bounce_velocity(hit, speed);
            assert!((vel.length() - speed).abs() < 1e-4);
            assert!(vel.y < 0.0, "always sent upward");
        }
        let straight = paddle_bounce_velocity(0.5, speed);
        assert!(straight.x.abs() < 1e-6);

        // Ends deflect by 30 degrees
        let left = paddle_bounce_velocity(0.0, 2.0);
        assert!((left.x - (-1.0)).abs() < 1e-4);
        assert!((left.y - (-(3.0f32.sqrt()))).abs() < 1e-4);
        let right = paddle_bounce_velocity(1.0, 2.0);
        assert!((right.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_in_brick_is_strict() {
        let brick = Brick::new(0, 0);
        assert!(point_in_brick(brick.center(), &brick));
        assert!(!point_in_brick(brick.pos, &brick));
        assert!(!point_in_brick(brick.pos + brick.size, &brick));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ball = Ball::default();
        ball.pos.y = FIELD_HEIGHT - BALL_RADIUS;
        assert!(!ball_out_of_bounds(&ball, FIELD_HEIGHT));
        ball.pos.y += 0.5;
        assert!(ball_out_of_bounds(&ball, FIELD_HEIGHT));
    }
}
