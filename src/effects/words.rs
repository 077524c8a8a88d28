//! Magnetic headline: every word follows the cursor on its own spring

use super::{Interactive, untranslated};
use crate::platform::RenderTarget;
use crate::renderer::css::Transform;
use crate::settings::WordsConfig;
use crate::sim::{FrameStatus, PointerSample, WordField, WordHandle};

pub struct MagneticWords<R: RenderTarget> {
    words: Vec<(WordHandle, R)>,
    field: WordField,
    disabled: bool,
}

impl<R: RenderTarget> MagneticWords<R> {
    pub fn new(targets: impl IntoIterator<Item = R>, config: WordsConfig) -> Self {
        let disabled = config.disabled;
        let mut field = WordField::new(config);
        let words = targets
            .into_iter()
            .map(|target| (field.add_word(), target))
            .collect();
        Self {
            words,
            field,
            disabled,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, index: usize) -> Option<&R> {
        self.words.get(index).map(|(_, target)| target)
    }

    pub fn field(&self) -> &WordField {
        &self.field
    }
}

impl<R: RenderTarget> Interactive for MagneticWords<R> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        if self.disabled {
            return false;
        }
        let Some(cursor) = sample.active_position() else {
            return self.field.release_all();
        };
        let mut woke = false;
        for (handle, target) in &self.words {
            // Detached words just stay put
            let Some(measured) = target.measure() else {
                continue;
            };
            let layout = untranslated(measured, self.field.offset(*handle));
            woke |= self.field.retarget(*handle, &layout, Some(cursor));
        }
        woke
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.field.step();
        if status.wrote_frame() {
            for (handle, target) in &self.words {
                target.set_transform(&Transform::translate(self.field.offset(*handle)));
            }
        }
        status
    }

    fn teardown(&mut self) {
        self.field.snap_all();
        for (_, target) in &self.words {
            target.clear_style("transform");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;
    use crate::platform::memory::RecordingTarget;
    use glam::Vec2;

    fn headline() -> MagneticWords<RecordingTarget> {
        let words = (0..4).map(|i| RecordingTarget::new(Rect::new(i as f32 * 80.0, 0.0, 70.0, 40.0)));
        MagneticWords::new(words, WordsConfig::default())
    }

    fn at(x: f32, y: f32) -> PointerSample {
        PointerSample {
            x,
            y,
            in_viewport: true,
            ..PointerSample::default()
        }
    }

    #[test]
    fn test_words_lean_toward_cursor() {
        let mut h = headline();
        // Between the first two words, nearer the first
        assert!(h.on_pointer(&at(55.0, 20.0)));
        let mut frames = 0;
        while h.frame().wants_next_frame() {
            frames += 1;
            assert!(frames < 1000);
        }
        let first = h.word(0).unwrap().transform().translate;
        let second = h.word(1).unwrap().transform().translate;
        let last = h.word(3).unwrap().transform().translate;
        assert!(first.x > 0.0);
        assert!(second.x < 0.0);
        assert_eq!(last, Vec2::ZERO);
    }

    #[test]
    fn test_unmeasurable_word_is_skipped() {
        let mut h = headline();
        h.word(0).unwrap().set_layout(None);
        h.on_pointer(&at(35.0, 20.0));
        let first = h.words[0].0;
        assert_eq!(h.field().offset(first), Vec2::ZERO);
        assert!(!h.field().is_running(first));
        assert!(h.field().is_running(h.words[1].0));
    }

    #[test]
    fn test_leave_relaxes_every_word() {
        let mut h = headline();
        h.on_pointer(&at(100.0, 20.0));
        while h.frame().wants_next_frame() {}
        let gone = PointerSample {
            in_viewport: false,
            ..at(100.0, 20.0)
        };
        assert!(h.on_pointer(&gone));
        while h.frame().wants_next_frame() {}
        for i in 0..h.len() {
            assert_eq!(h.word(i).unwrap().transform().translate, Vec2::ZERO);
        }
    }

    #[test]
    fn test_teardown_snaps_home() {
        let mut h = headline();
        h.on_pointer(&at(100.0, 20.0));
        h.frame();
        h.teardown();
        assert_eq!(h.frame(), FrameStatus::Idle);
        assert!(h.word(1).unwrap().style("transform").is_none());
        assert_eq!(h.word(1).unwrap().transform(), Transform::IDENTITY);
    }
}
