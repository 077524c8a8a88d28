//! Card castle
//!
//! A house of cards that stands still until the cursor knocks it, then
//! collapses onto the stage floor. Coordinates are stage-local px with the
//! floor at the stage bottom.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::breaker::CloneTransform;
use super::physics::{BodyDesc, BodyHandle, BodyPose, FixedStep, Material, PhysicsWorld, RapierWorld};
use super::spring::FrameStatus;
use crate::Rect;
use crate::consts::BOUNDARY_THICKNESS;
use crate::settings::CastleConfig;

/// Where one card stands before the collapse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Radians, clockwise on screen
    pub angle: f32,
}

impl CardPlacement {
    /// Box the card occupies before rotation
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.center.x - self.half_extents.x,
            self.center.y - self.half_extents.y,
            self.half_extents.x * 2.0,
            self.half_extents.y * 2.0,
        )
    }

    fn pose(&self) -> BodyPose {
        BodyPose {
            position: self.center,
            angle: self.angle,
        }
    }
}

/// Leaning pairs with flat cards bridging their apexes, centered on `stage`.
///
/// Level `k` (from the bottom) has `levels - k` pairs; each level above
/// stands on the flats of the one below.
pub fn castle_layout(config: &CastleConfig, stage: &Rect) -> Vec<CardPlacement> {
    let h = config.card_height;
    let t = config.card_thickness;
    let (sin, cos) = config.lean.sin_cos();
    let pair_width = 2.0 * h * sin;
    let center_x = stage.center().x;

    let mut cards = Vec::new();
    let mut base_y = stage.bottom();
    for level in 0..config.levels {
        let pairs = config.levels - level;
        let first = center_x - (pairs - 1) as f32 * pair_width / 2.0;
        let apex_y = base_y - h * cos;
        let apexes: Vec<f32> = (0..pairs).map(|i| first + i as f32 * pair_width).collect();

        for &x in &apexes {
            let upright = Vec2::new(t / 2.0, h / 2.0);
            let mid_y = base_y - h / 2.0 * cos;
            cards.push(CardPlacement {
                center: Vec2::new(x - h / 2.0 * sin, mid_y),
                half_extents: upright,
                angle: config.lean,
            });
            cards.push(CardPlacement {
                center: Vec2::new(x + h / 2.0 * sin, mid_y),
                half_extents: upright,
                angle: -config.lean,
            });
        }
        for pair in apexes.windows(2) {
            cards.push(CardPlacement {
                center: Vec2::new((pair[0] + pair[1]) / 2.0, apex_y - t / 2.0),
                half_extents: Vec2::new(h / 2.0, t / 2.0),
                angle: 0.0,
            });
        }
        base_y = apex_y - t;
    }
    cards
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastlePhase {
    Standing,
    /// Simulating; `remaining` seconds until the cards freeze
    Collapsing { remaining: f32 },
    Fallen,
}

pub struct CardCastle<W: PhysicsWorld = RapierWorld> {
    config: CastleConfig,
    stage: Rect,
    layout: Vec<CardPlacement>,
    phase: CastlePhase,
    world: Option<W>,
    bodies: Vec<BodyHandle>,
    stepper: FixedStep,
    rng: Pcg32,
}

impl<W: PhysicsWorld> CardCastle<W> {
    pub fn new(config: CastleConfig, stage: Rect, seed: u64) -> Self {
        let layout = castle_layout(&config, &stage);
        Self {
            config,
            stage,
            layout,
            phase: CastlePhase::Standing,
            world: None,
            bodies: Vec::new(),
            stepper: FixedStep::default(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> CastlePhase {
        self.phase
    }

    pub fn layout(&self) -> &[CardPlacement] {
        &self.layout
    }

    pub fn stage(&self) -> Rect {
        self.stage
    }

    /// Pose of card `index`, standing or falling
    pub fn pose(&self, index: usize) -> Option<BodyPose> {
        let placement = self.layout.get(index)?;
        match (&self.world, self.bodies.get(index)) {
            (Some(world), Some(body)) => world.query_body(*body),
            _ => Some(placement.pose()),
        }
    }

    /// Offset of card `index` from its unrotated layout box
    pub fn transform(&self, index: usize) -> Option<CloneTransform> {
        let placement = self.layout.get(index)?;
        Some(CloneTransform::from_pose(placement.center, self.pose(index)?))
    }

    /// Knock the castle over from `point`. Returns true if the collapse
    /// started; ignored unless standing.
    pub fn knock(&mut self, point: Vec2) -> bool {
        if self.config.disabled || self.phase != CastlePhase::Standing {
            return false;
        }
        let mut world = match W::create(Vec2::new(0.0, self.config.gravity)) {
            Ok(world) => world,
            Err(e) => {
                log::warn!("Card castle stays up: {}", e);
                return false;
            }
        };

        let (s, t) = (self.stage, BOUNDARY_THICKNESS);
        for rect in [
            Rect::new(s.left - t, s.bottom(), s.width + 2.0 * t, t),
            Rect::new(s.left - t, s.top - s.height, t, 2.0 * s.height + t),
            Rect::new(s.right(), s.top - s.height, t, 2.0 * s.height + t),
        ] {
            world.add_body(BodyDesc::static_from_rect(&rect));
        }

        let reach = self.config.card_height;
        self.bodies = self
            .layout
            .iter()
            .map(|card| {
                let away = card.center - point;
                let falloff = 1.0 / (1.0 + away.length() / reach);
                let velocity = away.normalize_or(Vec2::NEG_Y) * self.config.knock_speed * falloff
                    + Vec2::new(self.rng.random_range(-20.0..20.0), self.rng.random_range(-20.0..0.0));
                let spin = self.rng.random_range(-2.0..2.0) * falloff;
                let desc = BodyDesc {
                    center: card.center,
                    half_extents: card.half_extents,
                    angle: card.angle,
                    ..BodyDesc::dynamic_from_rect(&card.rect(), Material::default())
                }
                .with_velocity(velocity, spin);
                world.add_body(desc)
            })
            .collect();

        log::info!("Card castle knocked over ({} cards)", self.bodies.len());
        self.world = Some(world);
        self.stepper.reset();
        self.phase = CastlePhase::Collapsing {
            remaining: (self.config.settle_ms / 1000.0) as f32,
        };
        true
    }

    /// Advance the collapse by one frame of `dt` seconds
    pub fn step(&mut self, dt: f32) -> FrameStatus {
        let CastlePhase::Collapsing { remaining } = self.phase else {
            return FrameStatus::Idle;
        };
        if let Some(world) = self.world.as_mut() {
            self.stepper.advance(world, dt);
        }
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.phase = CastlePhase::Fallen;
            FrameStatus::Converged
        } else {
            self.phase = CastlePhase::Collapsing { remaining };
            FrameStatus::Running
        }
    }

    /// Stand every card back up
    pub fn rebuild(&mut self) {
        if let Some(mut world) = self.world.take() {
            world.clear();
        }
        self.bodies.clear();
        self.stepper.reset();
        self.phase = CastlePhase::Standing;
    }
}
