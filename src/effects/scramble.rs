//! Scrambled text reveal, replayed on hover

use super::Interactive;
use crate::platform::RenderTarget;
use crate::settings::ScrambleConfig;
use crate::sim::{FrameStatus, PointerSample, TextScramble};

pub struct ScrambleText<R: RenderTarget> {
    target: R,
    scramble: TextScramble,
    animate: bool,
    hovered: bool,
}

impl<R: RenderTarget> ScrambleText<R> {
    /// `text` is the final string; `animate` is false under reduced motion
    pub fn new(target: R, text: &str, config: &ScrambleConfig, seed: u64, animate: bool) -> Self {
        let scramble = TextScramble::new(text, config, seed, !animate);
        Self {
            target,
            scramble,
            animate: animate && !config.disabled,
            hovered: false,
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    /// Play the reveal from the start. Returns true if frames are needed.
    pub fn start(&mut self) -> bool {
        if !self.animate {
            self.target.set_text(&self.scramble.text());
            return false;
        }
        self.scramble.restart();
        true
    }
}

impl<R: RenderTarget> Interactive for ScrambleText<R> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        let inside = match (self.target.measure(), sample.active_position()) {
            (Some(rect), Some(cursor)) => rect.contains(cursor),
            _ => false,
        };
        let entered = inside && !self.hovered;
        self.hovered = inside;
        entered && self.scramble.is_done() && self.start()
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.scramble.step();
        if status.wrote_frame() {
            let text = self.scramble.render();
            self.target.set_text(&text);
        }
        status
    }

    fn teardown(&mut self) {
        self.scramble.finish();
        self.target.set_text(&self.scramble.text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;
    use crate::platform::memory::RecordingTarget;

    fn at(x: f32, y: f32) -> PointerSample {
        PointerSample {
            x,
            y,
            in_viewport: true,
            ..PointerSample::default()
        }
    }

    fn label(animate: bool) -> ScrambleText<RecordingTarget> {
        ScrambleText::new(
            RecordingTarget::new(Rect::new(0.0, 0.0, 120.0, 30.0)),
            "Get started",
            &ScrambleConfig::default(),
            11,
            animate,
        )
    }

    #[test]
    fn test_mount_reveal_ends_on_final_text() {
        let mut l = label(true);
        assert!(l.start());
        assert_ne!(l.frame(), FrameStatus::Idle);
        assert_ne!(l.target().text(), "");
        while l.frame().wants_next_frame() {}
        assert_eq!(l.target().text(), "Get started");
    }

    #[test]
    fn test_hover_replays_once_per_entry() {
        let mut l = label(true);
        l.start();
        while l.frame().wants_next_frame() {}

        assert!(l.on_pointer(&at(10.0, 10.0)));
        assert!(!l.on_pointer(&at(20.0, 10.0)));
        while l.frame().wants_next_frame() {}
        assert!(!l.on_pointer(&at(500.0, 10.0)));
        assert!(l.on_pointer(&at(10.0, 10.0)));
    }

    #[test]
    fn test_reduced_motion_sets_text_once() {
        let mut l = label(false);
        assert!(!l.start());
        assert_eq!(l.target().text(), "Get started");
        assert!(!l.on_pointer(&at(10.0, 10.0)));
        assert_eq!(l.frame(), FrameStatus::Idle);
    }

    #[test]
    fn test_disabled_config_never_scrambles() {
        let config = ScrambleConfig {
            disabled: true,
            ..ScrambleConfig::default()
        };
        let mut l = ScrambleText::new(
            RecordingTarget::new(Rect::new(0.0, 0.0, 120.0, 30.0)),
            "Get started",
            &config,
            11,
            true,
        );
        assert!(!l.start());
        assert_eq!(l.target().text(), "Get started");
        assert!(!l.on_pointer(&at(10.0, 10.0)));
        assert_eq!(l.frame(), FrameStatus::Idle);
        assert_eq!(l.target().text(), "Get started");
    }

    #[test]
    fn test_teardown_restores_text_mid_reveal() {
        let mut l = label(true);
        l.start();
        l.frame();
        l.teardown();
        assert_eq!(l.target().text(), "Get started");
    }
}
