//! Page breaker
//!
//! Detaches live page elements into overlay clones, hangs each clone on a
//! rigid body and lets the page collapse. State machine:
//!
//! `Idle` → `activate` → `Shake` (CSS shake for a moment) → `Fall` (batched
//! detachment, physics, transform sync) → `reset` → `Idle`
//!
//! Pairing rule: an element is hidden only after its clone is attached and
//! its body exists, so `falling` always maps one clone to one dynamic body.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::debris::DebrisField;
use super::physics::{BodyDesc, BodyHandle, BodyPose, FixedStep, Material, PhysicsWorld, RapierWorld};
use super::selection::{SelectionRules, select_targets};
use super::spring::FrameStatus;
use crate::consts::*;
use crate::platform::{CloneId, ElementId, PageSurface, ScrollMetrics, SyntheticPart, Viewport};
use crate::settings::BreakerConfig;
use crate::{Rect, clamp01};

/// Collision group shared by the fake scrollbar parts
const SCROLLBAR_GROUP: u32 = 1;
/// Shortest fake scrollbar thumb (px)
const MIN_THUMB_HEIGHT: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakerPhase {
    Idle,
    Shake { until_ms: f64 },
    Fall,
}

/// Offset of a clone from where it was detached, applied around its center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CloneTransform {
    pub dx: f32,
    pub dy: f32,
    /// Radians
    pub angle: f32,
}

impl CloneTransform {
    pub fn from_pose(origin: Vec2, pose: BodyPose) -> Self {
        Self {
            dx: pose.position.x - origin.x,
            dy: pose.position.y - origin.y,
            angle: pose.angle,
        }
    }
}

/// One detached element (or scrollbar part) and the body driving it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingElement {
    /// `None` for synthetic parts
    pub source: Option<ElementId>,
    pub clone: CloneId,
    pub body: BodyHandle,
    /// Clone center at attach time
    pub origin: Vec2,
}

pub struct PageBreaker<W: PhysicsWorld = RapierWorld> {
    config: BreakerConfig,
    phase: BreakerPhase,
    world: Option<W>,
    stepper: FixedStep,
    pending: VecDeque<ElementId>,
    next_batch_ms: f64,
    falling: Vec<FallingElement>,
    claimed: HashSet<ElementId>,
    debris: DebrisField,
    rng: Pcg32,
    last_frame_ms: Option<f64>,
}

impl<W: PhysicsWorld> PageBreaker<W> {
    pub fn new(config: BreakerConfig, seed: u64) -> Self {
        let debris = DebrisField::new(config.gravity);
        Self {
            config,
            phase: BreakerPhase::Idle,
            world: None,
            stepper: FixedStep::default(),
            pending: VecDeque::new(),
            next_batch_ms: 0.0,
            falling: Vec::new(),
            claimed: HashSet::new(),
            debris,
            rng: Pcg32::seed_from_u64(seed),
            last_frame_ms: None,
        }
    }

    pub fn phase(&self) -> BreakerPhase {
        self.phase
    }

    pub fn falling(&self) -> &[FallingElement] {
        &self.falling
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn dynamic_body_count(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.dynamic_count())
    }

    pub fn debris(&self) -> &DebrisField {
        &self.debris
    }

    /// Current pose of the body behind `item`
    pub fn body_pose(&self, item: &FallingElement) -> Option<BodyPose> {
        self.world.as_ref()?.query_body(item.body)
    }

    /// Start the shake. Returns true if the frame loop should start; ignored
    /// unless idle.
    pub fn activate<S: PageSurface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> bool {
        if self.config.disabled || self.phase != BreakerPhase::Idle {
            return false;
        }
        log::info!("Page break triggered");
        surface.set_shaking(true);
        self.phase = BreakerPhase::Shake {
            until_ms: now_ms + self.config.shake_ms,
        };
        true
    }

    /// One animation frame
    pub fn update<S: PageSurface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> FrameStatus {
        match self.phase {
            BreakerPhase::Idle => FrameStatus::Idle,
            BreakerPhase::Shake { until_ms } => {
                if now_ms >= until_ms {
                    self.enter_fall(surface, now_ms)
                } else {
                    FrameStatus::Running
                }
            }
            BreakerPhase::Fall => {
                self.fall_frame(surface, now_ms);
                FrameStatus::Running
            }
        }
    }

    fn enter_fall<S: PageSurface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> FrameStatus {
        surface.set_shaking(false);

        let mut world = match W::create(Vec2::new(0.0, self.config.gravity)) {
            Ok(world) => world,
            Err(e) => {
                log::warn!("Page break aborted: {}", e);
                self.phase = BreakerPhase::Idle;
                return FrameStatus::Idle;
            }
        };

        let viewport = surface.viewport();
        for rect in boundary_rects(viewport) {
            world.add_body(BodyDesc::static_from_rect(&rect));
        }

        let rules = SelectionRules::from(&self.config);
        for (element, _) in select_targets(surface, &rules, &self.claimed) {
            self.claimed.insert(element);
            self.pending.push_back(element);
        }

        if self.config.scrollbar {
            let (track, thumb) = scrollbar_rects(viewport, surface.scroll_metrics());
            for (part, rect) in [(SyntheticPart::ScrollTrack, track), (SyntheticPart::ScrollThumb, thumb)] {
                let Some(clone) = surface.attach_synthetic(part, rect) else {
                    continue;
                };
                let desc = BodyDesc::dynamic_from_rect(&rect, Material::default())
                    .with_velocity(Vec2::new(self.rng.random_range(-20.0..0.0), 0.0), 0.0)
                    .with_group(SCROLLBAR_GROUP);
                self.falling.push(FallingElement {
                    source: None,
                    clone,
                    body: world.add_body(desc),
                    origin: rect.center(),
                });
            }
        }

        log::info!("Page falling: {} elements queued", self.pending.len());
        surface.set_controls_visible(true);
        self.world = Some(world);
        self.sync_clones(surface);
        self.stepper.reset();
        self.phase = BreakerPhase::Fall;
        self.next_batch_ms = now_ms;
        self.last_frame_ms = Some(now_ms);
        FrameStatus::Running
    }

    fn fall_frame<S: PageSurface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) {
        let dt = self
            .last_frame_ms
            .map_or(0.0, |last| ((now_ms - last) / 1000.0).max(0.0) as f32);
        self.last_frame_ms = Some(now_ms);

        if !self.pending.is_empty() && now_ms >= self.next_batch_ms {
            self.spawn_batch(surface);
            self.next_batch_ms = now_ms + self.config.batch_interval_ms;
        }

        let Some(world) = self.world.as_mut() else {
            return;
        };
        self.stepper.advance(world, dt);
        self.sync_clones(surface);

        if self.debris.step(dt).wrote_frame() {
            surface.draw_debris(self.debris.pieces());
        }
    }

    /// Read bodies, write clones; never the other way around
    fn sync_clones<S: PageSurface + ?Sized>(&self, surface: &mut S) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        for item in &self.falling {
            if let Some(pose) = world.query_body(item.body) {
                surface.set_clone_transform(item.clone, &CloneTransform::from_pose(item.origin, pose));
            }
        }
    }

    fn spawn_batch<S: PageSurface + ?Sized>(&mut self, surface: &mut S) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let mut spawned = 0;
        while spawned < self.config.batch_size {
            let Some(element) = self.pending.pop_front() else {
                break;
            };
            let Some(rect) = surface.measure(element) else {
                log::debug!("Element {:?} vanished before detaching", element);
                continue;
            };
            let Some(clone) = surface.attach_clone(element, rect) else {
                log::debug!("Could not clone element {:?}", element);
                continue;
            };

            let material = Material {
                density: self.rng.random_range(0.001..0.003),
                restitution: self.rng.random_range(0.1..0.4),
                friction: self.rng.random_range(0.2..0.6),
            };
            let velocity = Vec2::new(
                self.rng.random_range(-60.0..60.0),
                self.rng.random_range(-120.0..0.0),
            );
            let spin = self.rng.random_range(-1.5..1.5);
            let body = world.add_body(BodyDesc::dynamic_from_rect(&rect, material).with_velocity(velocity, spin));

            surface.hide(element);
            self.falling.push(FallingElement {
                source: Some(element),
                clone,
                body,
                origin: rect.center(),
            });
            self.debris
                .burst(rect.center(), self.config.debris_per_element, &mut self.rng);
            spawned += 1;
        }
    }

    /// Grab the topmost falling body under the pointer
    pub fn pointer_down(&mut self, point: Vec2) -> bool {
        let Some(world) = self.world.as_mut() else {
            return false;
        };
        match world.pick(point) {
            Some(handle) => world.begin_drag(handle, point),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, point: Vec2) {
        if let Some(world) = self.world.as_mut() {
            world.drag_to(point);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(world) = self.world.as_mut() {
            world.end_drag();
        }
    }

    /// Put the page back. Safe in any phase and safe to repeat.
    pub fn reset<S: PageSurface + ?Sized>(&mut self, surface: &mut S) {
        let was_idle = self.phase == BreakerPhase::Idle && self.falling.is_empty();

        self.pending.clear();
        if let Some(mut world) = self.world.take() {
            world.clear();
        }
        self.stepper.reset();

        for item in self.falling.drain(..) {
            surface.remove_clone(item.clone);
            if let Some(source) = item.source {
                surface.restore(source);
            }
        }
        self.claimed.clear();
        self.debris.clear();
        surface.draw_debris(&[]);
        surface.set_shaking(false);
        surface.set_controls_visible(false);
        surface.forget_elements();

        self.phase = BreakerPhase::Idle;
        self.last_frame_ms = None;
        if !was_idle {
            log::info!("Page restored");
        }
    }
}

/// Floor under the viewport and two tall walls just outside it
pub fn boundary_rects(viewport: Viewport) -> [Rect; 3] {
    let t = BOUNDARY_THICKNESS;
    let (w, h) = (viewport.width, viewport.height);
    [
        Rect::new(-t, h, w + 2.0 * t, t),
        Rect::new(-t, -2.0 * h, t, 3.0 * h + t),
        Rect::new(w, -2.0 * h, t, 3.0 * h + t),
    ]
}

/// Fake scrollbar `(track, thumb)` matching the current scroll position
pub fn scrollbar_rects(viewport: Viewport, scroll: ScrollMetrics) -> (Rect, Rect) {
    let (w, h) = (viewport.width, viewport.height);
    let track = Rect::new(w - SCROLLBAR_WIDTH, 0.0, SCROLLBAR_WIDTH, h);

    let ratio = if scroll.document_height > 0.0 {
        (h / scroll.document_height).clamp(0.05, 1.0)
    } else {
        1.0
    };
    let thumb_height = (h * ratio).max(MIN_THUMB_HEIGHT).min(h);
    let max_scroll = (scroll.document_height - h).max(0.0);
    let progress = if max_scroll > 0.0 {
        clamp01(scroll.scroll_y / max_scroll)
    } else {
        0.0
    };
    let thumb = Rect::new(
        w - SCROLLBAR_WIDTH + 2.0,
        (h - thumb_height) * progress,
        SCROLLBAR_WIDTH - 4.0,
        thumb_height,
    );
    (track, thumb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemorySurface;
    use proptest::prelude::*;

    const FRAME_MS: f64 = 16.0;

    fn page() -> (MemorySurface, Vec<ElementId>) {
        let mut page = MemorySurface::new(1024.0, 768.0).with_scroll(2400.0, 0.0);
        let header = page.add_element(None, &["header"], Rect::new(0.0, 0.0, 1024.0, 80.0));
        let _logo = page.add_element(Some(header), &["img"], Rect::new(20.0, 20.0, 40.0, 40.0));
        let mut ids = vec![header];
        for i in 0..9 {
            let y = 120.0 + i as f32 * 60.0;
            ids.push(page.add_element(None, &["p"], Rect::new(40.0, y, 400.0, 40.0)));
        }
        (page, ids)
    }

    fn config(scrollbar: bool) -> BreakerConfig {
        BreakerConfig {
            scrollbar,
            ..BreakerConfig::default()
        }
    }

    /// Run frames from `start` until `end`, checking pairing every frame
    fn run(breaker: &mut PageBreaker, page: &mut MemorySurface, start: f64, end: f64) -> f64 {
        let mut t = start;
        while t < end {
            breaker.update(page, t);
            assert_eq!(breaker.falling().len(), breaker.dynamic_body_count());
            assert_eq!(page.clone_count(), breaker.falling().len());
            t += FRAME_MS;
        }
        t
    }

    #[test]
    fn test_activate_shakes_then_falls() {
        let (mut page, ids) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 7);

        assert!(breaker.activate(&mut page, 0.0));
        assert!(!breaker.activate(&mut page, 10.0));
        assert!(page.is_shaking());
        assert_eq!(breaker.update(&mut page, 100.0), FrameStatus::Running);
        assert!(matches!(breaker.phase(), BreakerPhase::Shake { .. }));

        breaker.update(&mut page, 400.0);
        assert_eq!(breaker.phase(), BreakerPhase::Fall);
        assert!(!page.is_shaking());
        assert!(page.controls_visible());
        // Header claims its logo
        assert_eq!(breaker.pending_count(), ids.len());

        run(&mut breaker, &mut page, 400.0, 1400.0);
        assert_eq!(breaker.pending_count(), 0);
        assert_eq!(breaker.falling().len(), ids.len());
        for id in &ids {
            assert!(page.is_hidden(*id));
            assert!(page.clone_of(*id).is_some());
        }
    }

    #[test]
    fn test_batches_are_spread_over_frames() {
        let (mut page, _) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 1);
        breaker.activate(&mut page, 0.0);
        breaker.update(&mut page, 400.0);
        breaker.update(&mut page, 416.0);
        assert_eq!(breaker.falling().len(), BATCH_SIZE);
        // Next batch not due yet
        breaker.update(&mut page, 432.0);
        assert_eq!(breaker.falling().len(), BATCH_SIZE);
    }

    #[test]
    fn test_clones_follow_bodies_down() {
        let (mut page, ids) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 3);
        breaker.activate(&mut page, 0.0);
        run(&mut breaker, &mut page, 400.0, 900.0);
        let clone = page.clone_of(ids[1]).expect("cloned");
        assert!(clone.transform.dy > 20.0);
    }

    #[test]
    fn test_reset_before_first_batch_leaves_nothing() {
        let (mut page, _) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(true), 5);
        breaker.activate(&mut page, 0.0);
        breaker.update(&mut page, 400.0);
        assert_eq!(breaker.phase(), BreakerPhase::Fall);
        assert!(breaker.pending_count() > 0);

        breaker.reset(&mut page);
        assert_eq!(page.clone_count(), 0);
        assert_eq!(page.hidden_count(), 0);
        assert_eq!(breaker.phase(), BreakerPhase::Idle);
        assert!(!page.controls_visible());
        // Batches in flight are gone
        assert_eq!(breaker.update(&mut page, 500.0), FrameStatus::Idle);
        assert_eq!(page.clone_count(), 0);
    }

    #[test]
    fn test_reset_is_idempotent_and_rearms() {
        let (mut page, ids) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(true), 9);
        breaker.reset(&mut page);

        breaker.activate(&mut page, 0.0);
        run(&mut breaker, &mut page, 400.0, 1000.0);
        breaker.reset(&mut page);
        breaker.reset(&mut page);
        assert_eq!(page.clone_count(), 0);
        assert_eq!(page.hidden_count(), 0);
        assert_eq!(breaker.dynamic_body_count(), 0);

        // Claimed set was cleared, so everything breaks again
        assert!(breaker.activate(&mut page, 2000.0));
        run(&mut breaker, &mut page, 2400.0, 3400.0);
        assert!(ids.iter().all(|id| page.is_hidden(*id)));
    }

    #[test]
    fn test_physics_failure_returns_to_idle_untouched() {
        let (mut page, _) = page();
        let cfg = BreakerConfig {
            gravity: f32::NAN,
            ..config(true)
        };
        let mut breaker: PageBreaker = PageBreaker::new(cfg, 2);
        breaker.activate(&mut page, 0.0);
        assert_eq!(breaker.update(&mut page, 400.0), FrameStatus::Idle);
        assert_eq!(breaker.phase(), BreakerPhase::Idle);
        assert!(!page.is_shaking());
        assert_eq!(page.clone_count(), 0);
        assert_eq!(page.hidden_count(), 0);
    }

    #[test]
    fn test_unclonable_and_vanished_elements_stay_visible() {
        let (mut page, ids) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 4);
        breaker.activate(&mut page, 0.0);
        breaker.update(&mut page, 400.0);

        page.set_rect(ids[0], None);
        page.refuse_clones(true);
        breaker.update(&mut page, 416.0);
        assert_eq!(page.hidden_count(), 0);
        assert!(breaker.falling().is_empty());

        page.refuse_clones(false);
        run(&mut breaker, &mut page, 432.0, 1200.0);
        assert!(!page.is_hidden(ids[0]));
        assert!(page.is_hidden(ids[ids.len() - 1]));
    }

    #[test]
    fn test_scrollbar_parts_fall_too() {
        let (mut page, _) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(true), 6);
        breaker.activate(&mut page, 0.0);
        breaker.update(&mut page, 400.0);
        let parts: Vec<_> = page.clones().filter_map(|(_, c)| c.part).collect();
        assert_eq!(parts, vec![SyntheticPart::ScrollTrack, SyntheticPart::ScrollThumb]);
        assert_eq!(breaker.falling().len(), 2);
    }

    #[test]
    fn test_scrollbar_thumb_tracks_scroll() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let (track, top) = scrollbar_rects(
            viewport,
            ScrollMetrics {
                document_height: 3200.0,
                scroll_y: 0.0,
            },
        );
        assert_eq!(track.height, 800.0);
        assert_eq!(top.top, 0.0);
        assert_eq!(top.height, 200.0);

        let (_, bottom) = scrollbar_rects(
            viewport,
            ScrollMetrics {
                document_height: 3200.0,
                scroll_y: 2400.0,
            },
        );
        assert_eq!(bottom.bottom(), 800.0);
    }

    #[test]
    fn test_drag_grabs_falling_body() {
        let (mut page, _) = page();
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 8);
        assert!(!breaker.pointer_down(Vec2::new(240.0, 140.0)));
        breaker.activate(&mut page, 0.0);
        breaker.update(&mut page, 400.0);
        breaker.update(&mut page, 416.0);

        // First paragraph; the header is falling[0]
        let grabbed = breaker.falling()[1];
        let origin = grabbed.origin;
        assert!(breaker.pointer_down(origin));
        breaker.pointer_move(origin + Vec2::new(300.0, 0.0));
        run(&mut breaker, &mut page, 432.0, 800.0);
        breaker.pointer_up();

        let clone = page.clone_of(grabbed.source.unwrap()).unwrap();
        assert!(clone.transform.dx > 50.0, "dx = {}", clone.transform.dx);
    }

    #[test]
    fn test_thin_lines_settle_inside_the_viewport() {
        let mut page = MemorySurface::new(1024.0, 768.0);
        for i in 0..48 {
            let (col, row) = ((i % 4) as f32, (i / 4) as f32);
            page.add_element(None, &["p"], Rect::new(20.0 + col * 250.0, 20.0 + row * 60.0, 230.0, 12.0));
        }
        let mut breaker: PageBreaker = PageBreaker::new(config(false), 11);
        breaker.activate(&mut page, 0.0);
        run(&mut breaker, &mut page, 400.0, 15_400.0);
        assert_eq!(breaker.falling().len(), 48);

        for f in breaker.falling() {
            let pose = breaker.body_pose(f).expect("live body");
            assert!(pose.position.y < 768.0, "center below floor top: {:?}", pose.position);
            assert!(
                pose.position.x > 0.0 && pose.position.x < 1024.0,
                "center outside walls: {:?}",
                pose.position
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_pairing_holds_until_reset(
            seed in any::<u64>(),
            gaps in proptest::collection::vec(4.0f64..60.0, 10..80),
            scrollbar in any::<bool>(),
        ) {
            let (mut page, _) = page();
            let mut breaker: PageBreaker = PageBreaker::new(config(scrollbar), seed);
            breaker.activate(&mut page, 0.0);

            let mut t = 0.0;
            for gap in &gaps {
                t += gap;
                breaker.update(&mut page, t);
                prop_assert_eq!(breaker.falling().len(), breaker.dynamic_body_count());
                prop_assert_eq!(page.clone_count(), breaker.falling().len());
                for f in breaker.falling() {
                    let pose = breaker.body_pose(f);
                    prop_assert!(pose.is_some());
                    let expected = pose.map(|pose| CloneTransform::from_pose(f.origin, pose));
                    let actual = page.clones().find(|(id, _)| *id == f.clone).map(|(_, c)| c.transform);
                    prop_assert_eq!(actual, expected);
                    if let Some(t) = actual {
                        prop_assert!(t.dx.is_finite() && t.dy.is_finite() && t.angle.is_finite());
                    }
                    if let Some(source) = f.source {
                        prop_assert!(page.is_hidden(source));
                    }
                }
            }

            breaker.reset(&mut page);
            prop_assert_eq!(breaker.phase(), BreakerPhase::Idle);
            prop_assert_eq!(page.clone_count(), 0);
            prop_assert_eq!(page.hidden_count(), 0);
            prop_assert_eq!(breaker.dynamic_body_count(), 0);
            prop_assert!(!page.is_shaking());
        }
    }
}
