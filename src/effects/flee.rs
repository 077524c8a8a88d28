//! Button that runs away from the cursor

use glam::Vec2;

use super::{Interactive, untranslated};
use crate::platform::RenderTarget;
use crate::renderer::css::Transform;
use crate::settings::FleeConfig;
use crate::sim::{FleeField, FrameStatus, PointerSample, SpringFollow};

/// `container` bounds where the button may go
pub struct FleeingButton<R: RenderTarget, C: RenderTarget> {
    button: R,
    container: C,
    field: FleeField,
    spring: SpringFollow<Vec2>,
}

impl<R: RenderTarget, C: RenderTarget> FleeingButton<R, C> {
    pub fn new(button: R, container: C, config: FleeConfig) -> Self {
        let spring = SpringFollow::new(Vec2::ZERO, config.ease);
        Self {
            button,
            container,
            field: FleeField::new(config),
            spring,
        }
    }

    pub fn button(&self) -> &R {
        &self.button
    }

    pub fn field(&self) -> &FleeField {
        &self.field
    }
}

impl<R: RenderTarget, C: RenderTarget> Interactive for FleeingButton<R, C> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        let (Some(measured), Some(bounds)) = (self.button.measure(), self.container.measure())
        else {
            return false;
        };
        let home = untranslated(measured, self.spring.current());
        match self.field.react(&home, &bounds, sample.active_position()) {
            Some(offset) => {
                if self.field.gave_up() {
                    self.button.set_active(true);
                }
                self.spring.set_target(offset)
            }
            None => false,
        }
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.spring.step();
        if status.wrote_frame() {
            self.button
                .set_transform(&Transform::translate(self.spring.current()));
        }
        status
    }

    fn teardown(&mut self) {
        self.field.reset();
        self.spring.snap_to_rest();
        self.button.clear_style("transform");
        self.button.set_active(false);
    }
}
