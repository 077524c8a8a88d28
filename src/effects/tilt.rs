//! Tilt card with glare
//!
//! Writes the 3D transform directly and hands the glare position to page CSS
//! through custom properties, so the highlight layer stays pure CSS.

use super::Interactive;
use crate::platform::RenderTarget;
use crate::renderer::css::{Transform, glare_properties};
use crate::settings::TiltConfig;
use crate::sim::{FrameStatus, PointerSample, SpringFollow, TiltPose, tilt_target};

pub struct TiltCard<R: RenderTarget> {
    target: R,
    spring: SpringFollow<TiltPose>,
    config: TiltConfig,
    hovered: bool,
}

impl<R: RenderTarget> TiltCard<R> {
    pub fn new(target: R, config: TiltConfig) -> Self {
        Self {
            target,
            spring: SpringFollow::new(TiltPose::NEUTRAL, config.ease),
            config,
            hovered: false,
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn pose(&self) -> TiltPose {
        self.spring.current()
    }

    fn write(&self, pose: &TiltPose) {
        self.target
            .set_transform(&Transform::tilt(pose, self.config.perspective));
        if self.config.glare_enabled {
            for (property, value) in glare_properties(pose) {
                self.target.set_style(property, &value);
            }
        }
    }
}

impl<R: RenderTarget> Interactive for TiltCard<R> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        if self.config.disabled {
            return false;
        }
        // Rotation and scale leave the center where it was
        let goal = match self.target.measure() {
            Some(rect) => tilt_target(&rect, sample.active_position(), &self.config),
            None => TiltPose::NEUTRAL,
        };
        self.spring.set_target(goal)
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.spring.step();
        if status.wrote_frame() {
            self.write(&self.spring.current());
        }
        let hovered = self.spring.target() != TiltPose::NEUTRAL;
        if status == FrameStatus::Converged && hovered != self.hovered {
            self.hovered = hovered;
            self.target.set_active(hovered);
        }
        status
    }

    fn teardown(&mut self) {
        self.spring.snap_to_rest();
        self.target.clear_style("transform");
        for (property, _) in glare_properties(&TiltPose::NEUTRAL) {
            self.target.clear_style(property);
        }
        if self.hovered {
            self.hovered = false;
            self.target.set_active(false);
        }
    }
}
