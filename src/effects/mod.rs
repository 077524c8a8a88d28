//! Per-element effects
//!
//! Each effect owns its render handle and a spring. Pointer samples retarget
//! the spring; the frame loop steps it and writes straight to the element,
//! stopping by itself once the spring converges.

pub mod castle;
pub mod flee;
pub mod magnetic;
pub mod scramble;
pub mod tilt;
pub mod words;

pub use castle::CardCastleEffect;
pub use flee::FleeingButton;
pub use magnetic::MagneticButton;
pub use scramble::ScrambleText;
pub use tilt::TiltCard;
pub use words::MagneticWords;

use glam::Vec2;

use crate::Rect;
use crate::sim::{FrameStatus, PointerSample};

/// Frame-loop contract shared by every element effect
pub trait Interactive {
    /// Feed a pointer sample. Returns true if the frame loop must (re)start.
    fn on_pointer(&mut self, sample: &PointerSample) -> bool;

    /// Step once and write the result to the element
    fn frame(&mut self) -> FrameStatus;

    /// Stop and put the element back the way it was
    fn teardown(&mut self);
}

/// Measured box with our own translation taken back out
#[inline]
pub(crate) fn untranslated(measured: Rect, offset: Vec2) -> Rect {
    Rect {
        left: measured.left - offset.x,
        top: measured.top - offset.y,
        ..measured
    }
}
