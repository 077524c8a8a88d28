//! Cursor tracking service
//!
//! One listener feeds one shared sample; every effect reads the same value.
//! State sits in `Cell`s so subscribers can call back into the service
//! (e.g. `latest()`) while a sample is being published.

use std::cell::Cell;

use glam::Vec2;

use super::events::{EventBus, SubscriptionId};
use crate::Rect;
use crate::consts::POINTER_THROTTLE_MS;

/// Latest pointer position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    /// Viewport pixels
    pub x: f32,
    pub y: f32,
    /// [-1, 1] across the viewport, 0 at the center
    pub normalized_x: f32,
    pub normalized_y: f32,
    /// False once the pointer leaves the document (coordinates are kept)
    pub in_viewport: bool,
}

impl PointerSample {
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Position while the pointer is on the page, `None` once it left
    #[inline]
    pub fn active_position(&self) -> Option<Vec2> {
        self.in_viewport.then(|| self.position())
    }

    /// Offset of the pointer from the center of `rect`
    #[inline]
    pub fn relative_to(&self, rect: &Rect) -> Vec2 {
        self.position() - rect.center()
    }
}

fn normalize(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        0.0
    } else {
        (value / extent * 2.0 - 1.0).clamp(-1.0, 1.0)
    }
}

/// Process-wide pointer tracker with throttled fan-out
pub struct CursorService {
    sample: Cell<PointerSample>,
    viewport: Cell<Vec2>,
    throttle_ms: f64,
    last_publish_ms: Cell<Option<f64>>,
    /// A throttled move is waiting for the trailing publish
    trailing: Cell<bool>,
    bus: EventBus<PointerSample>,
}

impl CursorService {
    pub fn new(viewport_width: f32, viewport_height: f32, throttle_ms: f64) -> Self {
        Self {
            sample: Cell::new(PointerSample::default()),
            viewport: Cell::new(Vec2::new(viewport_width, viewport_height)),
            throttle_ms: if throttle_ms > 0.0 { throttle_ms } else { POINTER_THROTTLE_MS },
            last_publish_ms: Cell::new(None),
            trailing: Cell::new(false),
            bus: EventBus::new(),
        }
    }

    /// Latest sample. Never blocks, never fails.
    pub fn latest(&self) -> PointerSample {
        self.sample.get()
    }

    pub fn subscribe(&self, handler: impl FnMut(&PointerSample) + 'static) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    pub fn set_viewport(&self, width: f32, height: f32) {
        self.viewport.set(Vec2::new(width, height));
        let mut sample = self.sample.get();
        sample.normalized_x = normalize(sample.x, width);
        sample.normalized_y = normalize(sample.y, height);
        self.sample.set(sample);
    }

    /// Record a pointer move. Returns true if subscribers were notified.
    ///
    /// The sample is always updated; fan-out happens at most once per
    /// throttle window. A move swallowed by the window is owed a trailing
    /// publish, delivered by `flush`.
    pub fn handle_move(&self, x: f32, y: f32, now_ms: f64) -> bool {
        let viewport = self.viewport.get();
        let sample = PointerSample {
            x,
            y,
            normalized_x: normalize(x, viewport.x),
            normalized_y: normalize(y, viewport.y),
            in_viewport: true,
        };
        self.sample.set(sample);

        if let Some(last) = self.last_publish_ms.get() {
            if now_ms - last < self.throttle_ms {
                self.trailing.set(true);
                return false;
            }
        }
        self.publish(sample, now_ms);
        true
    }

    /// True while a throttled move has not been published yet
    pub fn has_trailing(&self) -> bool {
        self.trailing.get()
    }

    /// Publish the owed trailing sample once its window has closed.
    /// Returns true if subscribers were notified.
    pub fn flush(&self, now_ms: f64) -> bool {
        if !self.trailing.get() {
            return false;
        }
        if let Some(last) = self.last_publish_ms.get() {
            if now_ms - last < self.throttle_ms {
                return false;
            }
        }
        self.publish(self.sample.get(), now_ms);
        true
    }

    fn publish(&self, sample: PointerSample, now_ms: f64) {
        self.trailing.set(false);
        self.last_publish_ms.set(Some(now_ms));
        self.bus.publish(&sample);
    }

    /// Pointer left the document. Coordinates stay where they were.
    pub fn handle_leave(&self) {
        let mut sample = self.sample.get();
        if !sample.in_viewport {
            return;
        }
        sample.in_viewport = false;
        self.sample.set(sample);
        self.trailing.set(false);
        self.bus.publish(&sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_normalized_coordinates() {
        let svc = CursorService::new(800.0, 600.0, 16.0);
        svc.handle_move(400.0, 0.0, 0.0);
        let s = svc.latest();
        assert!(s.normalized_x.abs() < 1e-6);
        assert!((s.normalized_y + 1.0).abs() < 1e-6);
        assert!(s.in_viewport);

        svc.handle_move(2000.0, 600.0, 100.0);
        assert_eq!(svc.latest().normalized_x, 1.0);
        assert_eq!(svc.latest().normalized_y, 1.0);
    }

    #[test]
    fn test_throttle_limits_fanout_but_keeps_latest() {
        let svc = CursorService::new(800.0, 600.0, 16.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        svc.subscribe(move |_| h.set(h.get() + 1));

        assert!(svc.handle_move(10.0, 10.0, 0.0));
        assert!(!svc.handle_move(20.0, 20.0, 5.0));
        assert!(!svc.handle_move(30.0, 30.0, 15.9));
        assert_eq!(hits.get(), 1);
        // Throttled moves still overwrite the shared sample
        assert_eq!(svc.latest().x, 30.0);

        assert!(svc.handle_move(40.0, 40.0, 16.0));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_last_move_in_window_is_published_on_flush() {
        let svc = CursorService::new(800.0, 600.0, 16.0);
        let seen = Rc::new(Cell::new(PointerSample::default()));
        let s = seen.clone();
        svc.subscribe(move |sample| s.set(*sample));

        assert!(svc.handle_move(100.0, 100.0, 0.0));
        assert!(!svc.handle_move(300.0, 100.0, 5.0));
        assert!(svc.has_trailing());
        // Window still open
        assert!(!svc.flush(10.0));
        assert_eq!(seen.get().x, 100.0);

        assert!(svc.flush(16.0));
        assert_eq!(seen.get().position(), Vec2::new(300.0, 100.0));
        assert!(!svc.has_trailing());
        assert!(!svc.flush(40.0));
    }

    #[test]
    fn test_leave_cancels_trailing_publish() {
        let svc = CursorService::new(800.0, 600.0, 16.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        svc.subscribe(move |_| h.set(h.get() + 1));

        svc.handle_move(10.0, 10.0, 0.0);
        svc.handle_move(20.0, 20.0, 4.0);
        svc.handle_leave();
        assert_eq!(hits.get(), 2);
        assert!(!svc.flush(50.0));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_leave_keeps_coordinates() {
        let svc = CursorService::new(800.0, 600.0, 16.0);
        svc.handle_move(120.0, 80.0, 0.0);
        svc.handle_leave();
        let s = svc.latest();
        assert!(!s.in_viewport);
        assert_eq!((s.x, s.y), (120.0, 80.0));
        assert_eq!(s.active_position(), None);
    }

    #[test]
    fn test_subscriber_can_read_latest() {
        let svc = Rc::new(CursorService::new(800.0, 600.0, 16.0));
        let seen = Rc::new(Cell::new(0.0));
        let (svc2, seen2) = (svc.clone(), seen.clone());
        svc.subscribe(move |_| seen2.set(svc2.latest().x));
        svc.handle_move(42.0, 1.0, 0.0);
        assert_eq!(seen.get(), 42.0);
    }

    #[test]
    fn test_relative_to_rect_center() {
        let sample = PointerSample {
            x: 250.0,
            y: 125.0,
            in_viewport: true,
            ..Default::default()
        };
        let rect = Rect::new(100.0, 100.0, 100.0, 50.0);
        assert_eq!(sample.relative_to(&rect), Vec2::new(100.0, 0.0));
    }
}
