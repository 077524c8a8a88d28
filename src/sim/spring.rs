//! Spring-follow animator
//!
//! Exponential ease of a current value toward a target, one step per frame.
//! Once every dimension is within epsilon the value snaps to the target, that
//! frame reports `Converged`, and the owner stops requesting frames until the
//! target moves again.

use glam::{Vec2, Vec3, Vec4};

use crate::consts::SPRING_EPSILON;

/// Outcome of one animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Still moving, schedule another frame
    Running,
    /// Reached the target this frame (final write happens now)
    Converged,
    /// Nothing to do
    Idle,
}

impl FrameStatus {
    #[inline]
    pub fn wants_next_frame(self) -> bool {
        self == FrameStatus::Running
    }

    /// Did this frame change anything visible
    #[inline]
    pub fn wrote_frame(self) -> bool {
        self != FrameStatus::Idle
    }

    /// Combine statuses of independent animations sharing one loop
    pub fn merge(self, other: FrameStatus) -> FrameStatus {
        use FrameStatus::*;
        match (self, other) {
            (Running, _) | (_, Running) => Running,
            (Converged, _) | (_, Converged) => Converged,
            _ => Idle,
        }
    }
}

/// A value the spring can ease
pub trait Springable: Copy + PartialEq {
    /// `self + (target - self) * t`
    fn ease_toward(self, target: Self, t: f32) -> Self;
    /// Largest absolute per-dimension difference
    fn max_delta(self, other: Self) -> f32;
}

impl Springable for f32 {
    fn ease_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
    fn max_delta(self, other: Self) -> f32 {
        (self - other).abs()
    }
}

impl Springable for Vec2 {
    fn ease_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
    fn max_delta(self, other: Self) -> f32 {
        (self - other).abs().max_element()
    }
}

impl Springable for Vec3 {
    fn ease_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
    fn max_delta(self, other: Self) -> f32 {
        (self - other).abs().max_element()
    }
}

impl Springable for Vec4 {
    fn ease_toward(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
    fn max_delta(self, other: Self) -> f32 {
        (self - other).abs().max_element()
    }
}

/// Current/target pair for one animated element
#[derive(Debug, Clone)]
pub struct SpringFollow<T: Springable> {
    current: T,
    target: T,
    rest: T,
    ease: f32,
    epsilon: f32,
    running: bool,
}

impl<T: Springable> SpringFollow<T> {
    /// Start at rest, not running
    pub fn new(rest: T, ease: f32) -> Self {
        Self {
            current: rest,
            target: rest,
            rest,
            ease: ease.clamp(0.001, 1.0),
            epsilon: SPRING_EPSILON,
            running: false,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.max(f32::EPSILON);
        self
    }

    #[inline]
    pub fn current(&self) -> T {
        self.current
    }

    #[inline]
    pub fn target(&self) -> T {
        self.target
    }

    #[inline]
    pub fn rest(&self) -> T {
        self.rest
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Target equals the rest pose
    pub fn target_at_rest(&self) -> bool {
        self.target == self.rest
    }

    /// Point the spring somewhere new.
    /// Returns true if this woke an idle spring (the owner must schedule a frame).
    pub fn set_target(&mut self, target: T) -> bool {
        self.target = target;
        if !self.running && self.current != target {
            self.running = true;
            return true;
        }
        false
    }

    /// Relax toward the rest pose
    pub fn release(&mut self) -> bool {
        self.set_target(self.rest)
    }

    /// Advance one frame
    pub fn step(&mut self) -> FrameStatus {
        if !self.running {
            return FrameStatus::Idle;
        }
        self.current = self.current.ease_toward(self.target, self.ease);
        if self.current.max_delta(self.target) <= self.epsilon {
            self.current = self.target;
            self.running = false;
            FrameStatus::Converged
        } else {
            FrameStatus::Running
        }
    }

    /// Jump straight to rest without animating
    pub fn snap_to_rest(&mut self) {
        self.current = self.rest;
        self.target = self.rest;
        self.running = false;
    }
}
