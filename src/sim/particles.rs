//! Ambient particle field
//!
//! A fixed pool of dots that drift around their home positions, get pushed
//! (or pulled) by the cursor, and relax back. The pool is seeded once at the
//! first non-empty resize and then only mutated in place.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::spring::FrameStatus;
use crate::consts::*;
use crate::settings::{ParticleConfig, ParticleMode};

/// One dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub home: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub opacity: f32,
    /// Drift phase offset so particles don't move in lockstep
    pub phase: f32,
}

/// Particle pool plus the canvas-level state that gates its frame loop
pub struct ParticleField {
    particles: Vec<Particle>,
    count: usize,
    config: ParticleConfig,
    /// Logical (CSS px) canvas size
    bounds: Vec2,
    dpr: f32,
    seeded: bool,
    visible: bool,
    frame: u64,
    rng: Pcg32,
}

impl ParticleField {
    /// `count` is the already device-adjusted pool size
    pub fn new(config: ParticleConfig, count: usize, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(count),
            count,
            config,
            bounds: Vec2::ZERO,
            dpr: 1.0,
            seeded: false,
            visible: false,
            frame: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Frame loop should be alive
    pub fn is_running(&self) -> bool {
        self.seeded && self.visible
    }

    /// Canvas backing store size in device pixels
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.bounds.x * self.dpr).round().max(0.0) as u32,
            (self.bounds.y * self.dpr).round().max(0.0) as u32,
        )
    }

    /// Container changed size. Seeds the pool the first time the size is
    /// non-empty; returns true when that happened.
    pub fn resize(&mut self, width: f32, height: f32, dpr: f32) -> bool {
        self.bounds = Vec2::new(width.max(0.0), height.max(0.0));
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        if self.seeded || self.bounds.x <= 0.0 || self.bounds.y <= 0.0 {
            return false;
        }
        self.seed_pool();
        true
    }

    fn seed_pool(&mut self) {
        let (min_size, max_size) = (self.config.min_size, self.config.max_size.max(self.config.min_size));
        self.particles.clear();
        for _ in 0..self.count {
            let pos = Vec2::new(
                self.rng.random_range(0.0..=self.bounds.x),
                self.rng.random_range(0.0..=self.bounds.y),
            );
            self.particles.push(Particle {
                pos,
                home: pos,
                vel: Vec2::ZERO,
                size: self.rng.random_range(min_size..=max_size),
                opacity: self.rng.random_range(0.2..=0.8),
                phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            });
        }
        self.seeded = true;
        log::debug!("Seeded {} particles in {}x{}", self.count, self.bounds.x, self.bounds.y);
    }

    /// Intersection change. Returns true if the frame loop must be (re)started.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let was_running = self.is_running();
        self.visible = visible;
        !was_running && self.is_running()
    }

    /// Advance one frame. `cursor` is in canvas-local CSS pixels.
    pub fn step(&mut self, cursor: Option<Vec2>) -> FrameStatus {
        if !self.is_running() {
            return FrameStatus::Idle;
        }
        self.frame += 1;
        let time = self.frame as f32 * PARTICLE_DRIFT_RATE;
        let cfg = &self.config;
        let bounds = self.bounds;

        for p in &mut self.particles {
            if let Some(cursor) = cursor {
                let to_cursor = cursor - p.pos;
                let dist = to_cursor.length();
                if dist < cfg.cursor_radius && dist > f32::EPSILON {
                    let force = (1.0 - dist / cfg.cursor_radius) * cfg.cursor_force;
                    let dir = to_cursor / dist;
                    match cfg.mode {
                        ParticleMode::Scatter => p.vel -= dir * force,
                        ParticleMode::Attract => p.vel += dir * force,
                    }
                }
            }

            p.vel += (p.home - p.pos) * cfg.home_spring;
            p.vel += Vec2::new((time + p.phase).sin(), (time + p.phase).cos()) * cfg.drift;

            p.vel *= PARTICLE_DAMPING;
            p.pos += p.vel;
            p.pos = p.pos.clamp(Vec2::ZERO, bounds);
        }
        FrameStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_config() -> ParticleConfig {
        ParticleConfig {
            count: 24,
            drift: 0.0,
            ..Default::default()
        }
    }

    fn running_field(cfg: ParticleConfig) -> ParticleField {
        let count = cfg.count;
        let mut field = ParticleField::new(cfg, count, 7);
        assert!(field.resize(400.0, 300.0, 2.0));
        assert!(field.set_visible(true));
        field
    }

    #[test]
    fn test_seeds_once() {
        let mut field = ParticleField::new(still_config(), 24, 1);
        assert!(!field.resize(0.0, 0.0, 1.0));
        assert!(field.resize(400.0, 300.0, 1.0));
        let first: Vec<Vec2> = field.particles().iter().map(|p| p.home).collect();
        assert!(!field.resize(800.0, 600.0, 1.0));
        let second: Vec<Vec2> = field.particles().iter().map(|p| p.home).collect();
        assert_eq!(first, second);
        assert_eq!(field.particles().len(), 24);
    }

    #[test]
    fn test_backing_size_uses_dpr() {
        let field = running_field(still_config());
        assert_eq!(field.backing_size(), (800, 600));
    }

    #[test]
    fn test_hidden_field_is_idle() {
        let mut field = running_field(still_config());
        assert_eq!(field.step(None), FrameStatus::Running);
        assert!(!field.set_visible(false));
        assert_eq!(field.step(None), FrameStatus::Idle);
        assert!(field.set_visible(true));
        assert!(!field.set_visible(true));
    }

    #[test]
    fn test_scatter_pushes_away() {
        let mut field = running_field(still_config());
        let p0 = field.particles()[0];
        let cursor = p0.pos + Vec2::new(10.0, 0.0);
        field.step(Some(cursor));
        let p1 = field.particles()[0];
        assert!(p1.vel.x < 0.0 || p1.pos.x == 0.0);
    }

    #[test]
    fn test_attract_pulls_toward() {
        let cfg = ParticleConfig {
            mode: ParticleMode::Attract,
            ..still_config()
        };
        let mut field = running_field(cfg);
        let p0 = field.particles()[0];
        let cursor = p0.pos + Vec2::new(10.0, 0.0);
        field.step(Some(cursor));
        assert!(field.particles()[0].vel.x > 0.0);
    }

    #[test]
    fn test_particles_return_home() {
        let mut field = running_field(still_config());
        let center = Vec2::new(200.0, 150.0);
        for _ in 0..30 {
            field.step(Some(center));
        }
        let disturbed = field
            .particles()
            .iter()
            .any(|p| p.pos.distance(p.home) > 0.5);
        assert!(disturbed);

        // Cursor parked far outside every particle's radius
        let far = Vec2::new(5000.0, 5000.0);
        for _ in 0..1200 {
            field.step(Some(far));
        }
        for p in field.particles() {
            assert!(p.pos.distance(p.home) < 0.01, "{:?} vs {:?}", p.pos, p.home);
        }
    }

    #[test]
    fn test_positions_stay_in_bounds() {
        let cfg = ParticleConfig {
            cursor_force: 50.0,
            ..Default::default()
        };
        let mut field = running_field(cfg);
        for i in 0..200 {
            let cursor = Vec2::new((i * 7 % 400) as f32, (i * 13 % 300) as f32);
            field.step(Some(cursor));
            for p in field.particles() {
                assert!(p.pos.x >= 0.0 && p.pos.x <= 400.0);
                assert!(p.pos.y >= 0.0 && p.pos.y <= 300.0);
            }
        }
    }

    #[test]
    fn test_drift_stays_near_home() {
        let mut field = running_field(ParticleConfig::default());
        for _ in 0..2000 {
            field.step(None);
        }
        let cfg = ParticleConfig::default();
        // Forced response of a damped spring: amplitude on the order of drift / home_spring
        let bound = 4.0 * cfg.drift / cfg.home_spring + 1.0;
        for p in field.particles() {
            assert!(p.pos.distance(p.home) < bound);
        }
    }
}
