//! Studio FX - interaction playground for the studio site
//!
//! Core modules:
//! - `sim`: Deterministic interaction engine (springs, fields, physics, page breaker)
//! - `effects`: Binds sim state to owned render handles, one frame loop per element
//! - `renderer`: CSS transform formatting and Canvas2D layers
//! - `platform`: Host page abstraction (browser DOM on wasm32, in-memory for tests)
//! - `settings`: Per-effect configuration with documented defaults

pub mod capabilities;
pub mod effects;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use capabilities::Capabilities;
pub use error::{FxError, Result};
pub use settings::FxSettings;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Engine configuration constants
pub mod consts {
    /// Spring convergence threshold, per dimension
    pub const SPRING_EPSILON: f32 = 0.01;
    /// Pointer sample throttle (~60 Hz ceiling)
    pub const POINTER_THROTTLE_MS: f64 = 16.0;
    /// One display frame at 60 Hz
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Fixed physics timestep (120 Hz, same cadence for every frame rate)
    pub const PHYSICS_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Particle velocity retained per frame (~8% loss)
    pub const PARTICLE_DAMPING: f32 = 0.92;
    /// Angular speed of the ambient particle drift (radians per frame)
    pub const PARTICLE_DRIFT_RATE: f32 = 0.02;

    /// Page breaker shake pre-roll
    pub const SHAKE_DURATION_MS: f64 = 400.0;
    /// Elements detached per batch
    pub const BATCH_SIZE: usize = 4;
    /// Delay between detach batches
    pub const BATCH_INTERVAL_MS: f64 = 40.0;
    /// Elements narrower or shorter than this are left alone
    pub const MIN_ELEMENT_SIZE: f32 = 10.0;
    /// Slack around the viewport when deciding what is on screen
    pub const VIEWPORT_MARGIN: f32 = 50.0;
    /// Thickness of floor and wall bodies
    pub const BOUNDARY_THICKNESS: f32 = 100.0;
    /// Downward acceleration in px/s²
    pub const GRAVITY: f32 = 1800.0;
    /// Width of the fake scrollbar that falls with the page
    pub const SCROLLBAR_WIDTH: f32 = 12.0;
}

/// Axis-aligned rectangle in CSS pixels (viewport coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    #[inline]
    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Inclusive on all edges
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right() && point.y >= self.top && point.y <= self.bottom()
    }

    /// A rect with NaN or negative extent cannot be placed on screen
    pub fn is_measurable(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Where `value` sits between `a` and `b` (0 at `a`, 1 at `b`)
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

#[inline]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Angle of the vector from `from` to `to` (radians, screen space)
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
