//! Rigid-body physics capability
//!
//! The page breaker only talks to `PhysicsWorld`; `RapierWorld` puts rapier2d
//! behind it. Everything on this side of the trait is in screen pixels.

pub mod world;

pub use world::RapierWorld;

use glam::Vec2;

use crate::Rect;
use crate::consts::*;
use crate::error::Result;

/// Static bodies never move and have infinite mass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Surface and mass properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Mass per px²
    pub density: f32,
    /// Bounciness, 0 = dead stop
    pub restitution: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 0.001,
            restitution: 0.2,
            friction: 0.5,
        }
    }
}

/// Reference to a body. Stale after the world is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) epoch: u32,
}

/// Where a body is right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Center of mass, screen px
    pub position: Vec2,
    /// Radians, clockwise on screen
    pub angle: f32,
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub angle: f32,
    pub kind: BodyKind,
    pub material: Material,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    /// Bodies sharing a non-zero group never collide with each other
    pub group: u32,
}

impl BodyDesc {
    /// Dynamic box covering `rect`
    pub fn dynamic_from_rect(rect: &Rect, material: Material) -> Self {
        Self {
            center: rect.center(),
            half_extents: rect.half_size(),
            angle: 0.0,
            kind: BodyKind::Dynamic,
            material,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            group: 0,
        }
    }

    /// Immovable box covering `rect`
    pub fn static_from_rect(rect: &Rect) -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic_from_rect(rect, Material::default())
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2, angular_velocity: f32) -> Self {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }
}

/// Narrow interface over a 2D physics engine
pub trait PhysicsWorld: Sized {
    /// New empty world with constant acceleration `gravity` (px/s²)
    fn create(gravity: Vec2) -> Result<Self>;

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Advance by `dt` seconds
    fn step(&mut self, dt: f32);

    /// `None` for stale or unknown handles
    fn query_body(&self, handle: BodyHandle) -> Option<BodyPose>;

    fn dynamic_count(&self) -> usize;

    /// Topmost dynamic body under `point`
    fn pick(&self, point: Vec2) -> Option<BodyHandle>;

    /// Attach the pointer constraint to `handle` at world `point`
    fn begin_drag(&mut self, handle: BodyHandle, point: Vec2) -> bool;

    /// Move the pointer end of the constraint
    fn drag_to(&mut self, point: Vec2);

    fn end_drag(&mut self);

    fn is_dragging(&self) -> bool;

    /// Remove every body; outstanding handles become stale
    fn clear(&mut self);
}

/// Fixed-timestep accumulator in front of a world
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    /// Feed one frame's elapsed time, run as many fixed steps as fit.
    /// Returns the number of substeps taken.
    pub fn advance<W: PhysicsWorld>(&mut self, world: &mut W, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= PHYSICS_DT && substeps < MAX_SUBSTEPS {
            world.step(PHYSICS_DT);
            self.accumulator -= PHYSICS_DT;
            substeps += 1;
        }
        // Drop backlog we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(PHYSICS_DT);
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_substeps() {
        let mut world = RapierWorld::create(Vec2::new(0.0, 100.0)).unwrap();
        let mut stepper = FixedStep::default();
        assert_eq!(stepper.advance(&mut world, PHYSICS_DT * 0.5), 0);
        assert_eq!(stepper.advance(&mut world, PHYSICS_DT * 0.6), 1);
        // Huge hitch is clamped to MAX_FRAME_DT and capped at MAX_SUBSTEPS
        assert_eq!(stepper.advance(&mut world, 5.0), MAX_SUBSTEPS);
        assert!(stepper.advance(&mut world, 0.0) <= 1);
    }
}
