//! Card castle for the 404 page
//!
//! Cards are absolutely positioned inside the stage at their standing
//! layout; the first pointer sample over the stage knocks them over.

use glam::Vec2;

use super::Interactive;
use crate::Rect;
use crate::consts::FRAME_MS;
use crate::error::{FxError, Result};
use crate::platform::RenderTarget;
use crate::renderer::css::Transform;
use crate::settings::CastleConfig;
use crate::sim::{CardCastle, CardPlacement, FrameStatus, PointerSample};

pub struct CardCastleEffect<R: RenderTarget> {
    stage: R,
    cards: Vec<R>,
    castle: CardCastle,
}

impl<R: RenderTarget> CardCastleEffect<R> {
    /// `spawn` creates one card element inside `stage`
    pub fn new(
        stage: R,
        config: CastleConfig,
        seed: u64,
        mut spawn: impl FnMut(&CardPlacement) -> Result<R>,
    ) -> Result<Self> {
        let measured = stage
            .measure()
            .filter(|r| r.is_measurable() && r.width > 0.0 && r.height > 0.0)
            .ok_or_else(|| FxError::Unmeasurable("card castle stage".into()))?;
        let castle = CardCastle::new(config, Rect::new(0.0, 0.0, measured.width, measured.height), seed);

        let mut cards = Vec::with_capacity(castle.layout().len());
        for placement in castle.layout() {
            let card = spawn(placement)?;
            let rect = placement.rect();
            card.set_style("position", "absolute");
            card.set_style("left", &format!("{:.2}px", rect.left));
            card.set_style("top", &format!("{:.2}px", rect.top));
            card.set_style("width", &format!("{:.2}px", rect.width));
            card.set_style("height", &format!("{:.2}px", rect.height));
            cards.push(card);
        }

        let effect = Self { stage, cards, castle };
        effect.write_cards();
        Ok(effect)
    }

    pub fn castle(&self) -> &CardCastle {
        &self.castle
    }

    pub fn cards(&self) -> &[R] {
        &self.cards
    }

    fn write_cards(&self) {
        for (i, card) in self.cards.iter().enumerate() {
            if let Some(t) = self.castle.transform(i) {
                card.set_transform(&Transform::clone_pose(&t));
            }
        }
    }
}

impl<R: RenderTarget> Interactive for CardCastleEffect<R> {
    fn on_pointer(&mut self, sample: &PointerSample) -> bool {
        let (Some(stage), Some(cursor)) = (self.stage.measure(), sample.active_position()) else {
            return false;
        };
        if !stage.contains(cursor) {
            return false;
        }
        let local = cursor - Vec2::new(stage.left, stage.top);
        let knocked = self.castle.knock(local);
        if knocked {
            self.stage.set_active(true);
        }
        knocked
    }

    fn frame(&mut self) -> FrameStatus {
        let status = self.castle.step((FRAME_MS / 1000.0) as f32);
        if status.wrote_frame() {
            self.write_cards();
        }
        status
    }

    fn teardown(&mut self) {
        self.castle.rebuild();
        self.write_cards();
        self.stage.set_active(false);
    }
}
