//! Magnetic button

use glam::{Vec2, Vec3};

use super::{Interactive, untranslated};
use crate::platform::RenderTarget;
use crate::renderer::css::Transform;
use crate::settings::MagneticConfig;
use crate::sim::magnetic::MAGNETIC_REST;
use crate::sim::{FrameStatus, PointerSample, SpringFollow, magnetic_target};

pub struct MagneticButton<R: RenderTarget> {
    target: R,
    spring: SpringFollow<Vec3>,
    config: MagneticConfig,
    engaged: bool,
}

impl<R: RenderTarget> MagneticButton<R> {
    pub fn new(target: R, config: MagneticConfig) -> Self {
        Self {
            target,
            spring: SpringFollow::new(MAGNETIC_REST, config.ease),
            config,
            engaged: false,
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    /// Current `(x, y, scale)`
    pub fn pose(&self) -> Vec3 {
        self.spring.current()
    }

    pub fn goal(&self) -> Vec3 {
        self.spring.target()
    }

    /// Published once the spring settles, never per frame
    fn set_engaged(&mut self, engaged: bool) {
        if engaged != self.engaged {
            self.engaged = engaged;
            self.target.set_active(engaged);
        }
    }
}

impl<R: RenderTarget> Interactive for MagneticButton<R> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        if self.config.disabled {
            return false;
        }
        let Some(measured) = self.target.measure() else {
            return self.spring.release();
        };
        let current = self.spring.current();
        let layout = untranslated(measured, Vec2::new(current.x, current.y));
        let goal = magnetic_target(&layout, sample.active_position(), &self.config);
        self.spring.set_target(goal)
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.spring.step();
        if status.wrote_frame() {
            self.target
                .set_transform(&Transform::magnetic(self.spring.current()));
        }
        if status == FrameStatus::Converged {
            self.set_engaged(self.spring.target() != MAGNETIC_REST);
        }
        status
    }

    fn teardown(&mut self) {
        self.spring.snap_to_rest();
        self.target.clear_style("transform");
        self.set_engaged(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;
    use crate::platform::memory::RecordingTarget;

    fn sample(x: f32, y: f32) -> PointerSample {
        PointerSample {
            x,
            y,
            in_viewport: true,
            ..PointerSample::default()
        }
    }

    fn button() -> MagneticButton<RecordingTarget> {
        MagneticButton::new(
            RecordingTarget::new(Rect::new(100.0, 100.0, 100.0, 50.0)),
            MagneticConfig::default(),
        )
    }

    fn settle(b: &mut MagneticButton<RecordingTarget>) -> usize {
        let mut frames = 0;
        while b.frame().wants_next_frame() {
            frames += 1;
            assert!(frames < 500, "spring never settled");
        }
        frames
    }

    #[test]
    fn test_center_scales_up_without_moving() {
        let mut b = button();
        assert!(b.on_pointer(&sample(150.0, 125.0)));
        assert_eq!(b.goal(), Vec3::new(0.0, 0.0, 1.05));
        assert!(!b.target().is_active());
        b.frame();
        assert!(!b.target().is_active());
        settle(&mut b);
        assert_eq!(b.target().transform().scale, 1.05);
        assert!(b.target().is_active());
    }

    #[test]
    fn test_boundary_cursor_is_rest() {
        let mut b = button();
        assert!(!b.on_pointer(&sample(250.0, 125.0)));
        assert_eq!(b.goal(), MAGNETIC_REST);
        assert!(!b.target().is_active());
        assert_eq!(b.frame(), FrameStatus::Idle);
        assert_eq!(b.target().transform_writes(), 0);
    }

    #[test]
    fn test_own_offset_does_not_feed_back() {
        let mut b = button();
        b.on_pointer(&sample(200.0, 125.0));
        let goal = b.goal();
        settle(&mut b);
        // Element has moved toward the cursor; same cursor, same goal
        b.on_pointer(&sample(200.0, 125.0));
        assert!((b.goal() - goal).abs().max_element() < 1e-4);
    }

    #[test]
    fn test_leaving_relaxes_and_loop_stops() {
        let mut b = button();
        b.on_pointer(&sample(180.0, 125.0));
        settle(&mut b);
        let left = PointerSample {
            in_viewport: false,
            ..sample(180.0, 125.0)
        };
        assert!(b.on_pointer(&left));
        assert!(b.target().is_active());
        settle(&mut b);
        assert!(!b.target().is_active());
        assert_eq!(b.pose(), MAGNETIC_REST);
        assert_eq!(b.frame(), FrameStatus::Idle);
    }

    #[test]
    fn test_teardown_clears_transform() {
        let mut b = button();
        b.on_pointer(&sample(170.0, 120.0));
        b.frame();
        b.teardown();
        assert_eq!(b.target().transform(), Transform::IDENTITY);
        assert_eq!(b.pose(), MAGNETIC_REST);
        assert!(!b.target().is_active());
    }

    #[test]
    fn test_disabled_never_moves() {
        let mut b = MagneticButton::new(
            RecordingTarget::new(Rect::new(100.0, 100.0, 100.0, 50.0)),
            MagneticConfig {
                disabled: true,
                ..MagneticConfig::default()
            },
        );
        assert!(!b.on_pointer(&sample(150.0, 125.0)));
        assert_eq!(b.frame(), FrameStatus::Idle);
    }
}
