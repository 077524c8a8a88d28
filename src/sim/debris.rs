//! Cosmetic debris bursts
//!
//! Spawned where an element breaks loose. Gravity and fade only, no
//! collisions; drawn on its own canvas layer.

use glam::Vec2;
use rand::Rng;

use super::spring::FrameStatus;

/// Maximum live debris pieces
pub const MAX_DEBRIS: usize = 256;

/// Seconds a piece lives
const DEBRIS_LIFETIME: f32 = 1.2;

/// One fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debris {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1 when spawned, 0 when gone
    pub life: f32,
    pub size: f32,
    pub rotation: f32,
    pub spin: f32,
}

/// Fixed-capacity pool of fragments
#[derive(Debug, Clone)]
pub struct DebrisField {
    pieces: Vec<Debris>,
    gravity: f32,
}

impl DebrisField {
    pub fn new(gravity: f32) -> Self {
        Self {
            pieces: Vec::with_capacity(MAX_DEBRIS),
            gravity,
        }
    }

    pub fn pieces(&self) -> &[Debris] {
        &self.pieces
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Scatter `count` fragments from `origin`. Drops the excess when full.
    pub fn burst(&mut self, origin: Vec2, count: usize, rng: &mut impl Rng) {
        let room = MAX_DEBRIS - self.pieces.len();
        for _ in 0..count.min(room) {
            let angle = rng.random_range(-std::f32::consts::PI..0.0);
            let speed = rng.random_range(80.0..320.0);
            self.pieces.push(Debris {
                pos: origin,
                vel: Vec2::from_angle(angle) * speed,
                life: 1.0,
                size: rng.random_range(2.0..6.0),
                rotation: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-8.0..8.0),
            });
        }
    }

    /// Advance by `dt` seconds
    pub fn step(&mut self, dt: f32) -> FrameStatus {
        if self.pieces.is_empty() {
            return FrameStatus::Idle;
        }
        for piece in &mut self.pieces {
            piece.vel.y += self.gravity * dt;
            piece.pos += piece.vel * dt;
            piece.rotation += piece.spin * dt;
            piece.life -= dt / DEBRIS_LIFETIME;
        }
        self.pieces.retain(|p| p.life > 0.0);
        if self.pieces.is_empty() {
            FrameStatus::Converged
        } else {
            FrameStatus::Running
        }
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_burst_respects_capacity() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut field = DebrisField::new(900.0);
        for _ in 0..40 {
            field.burst(Vec2::new(10.0, 10.0), 10, &mut rng);
        }
        assert_eq!(field.pieces().len(), MAX_DEBRIS);
    }

    #[test]
    fn test_debris_falls_and_fades_out() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut field = DebrisField::new(900.0);
        field.burst(Vec2::ZERO, 12, &mut rng);
        assert!(field.pieces().iter().all(|p| p.vel.y <= 0.0));

        let mut last = FrameStatus::Running;
        for _ in 0..200 {
            last = field.step(1.0 / 60.0);
            if last != FrameStatus::Running {
                break;
            }
        }
        assert_eq!(last, FrameStatus::Converged);
        assert!(field.is_empty());
        assert_eq!(field.step(1.0 / 60.0), FrameStatus::Idle);
    }
}
