//! Fleeing button
//!
//! The button jumps away whenever the cursor gets close, staying inside its
//! container, and gives up after a few escapes.

use glam::Vec2;

use crate::Rect;
use crate::settings::FleeConfig;

#[derive(Debug, Clone)]
pub struct FleeField {
    config: FleeConfig,
    escapes: u32,
    offset: Vec2,
}

impl FleeField {
    pub fn new(config: FleeConfig) -> Self {
        Self {
            config,
            escapes: 0,
            offset: Vec2::ZERO,
        }
    }

    pub fn config(&self) -> &FleeConfig {
        &self.config
    }

    /// Offset from the home position the button should move to
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn escapes(&self) -> u32 {
        self.escapes
    }

    pub fn gave_up(&self) -> bool {
        self.escapes >= self.config.max_escapes
    }

    /// React to the cursor. `home` is the button's untransformed rect and
    /// `bounds` the container it may not leave. Returns the new target offset
    /// when the button jumps.
    pub fn react(&mut self, home: &Rect, bounds: &Rect, cursor: Option<Vec2>) -> Option<Vec2> {
        if self.config.disabled || self.gave_up() {
            return None;
        }
        let cursor = cursor?;
        let center = home.center() + self.offset;
        let away = center - cursor;
        let dist = away.length();
        if dist > self.config.flee_radius {
            return None;
        }

        let dir = if dist > 1e-3 { away / dist } else { Vec2::X };
        let (min, max) = allowed_centers(home, bounds);
        let mut next = (center + dir * self.config.flee_distance).clamp(min, max);

        // Pinned against the container: take the corner farthest from the cursor
        if next.distance(cursor) < self.config.flee_radius {
            next = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
                .into_iter()
                .max_by(|a, b| {
                    a.distance_squared(cursor)
                        .partial_cmp(&b.distance_squared(cursor))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(next);
        }

        self.offset = next - home.center();
        self.escapes += 1;
        if self.gave_up() {
            log::debug!("Fleeing button gave up after {} escapes", self.escapes);
        }
        Some(self.offset)
    }

    pub fn reset(&mut self) {
        self.escapes = 0;
        self.offset = Vec2::ZERO;
    }
}

/// Range of button centers that keep the button inside `bounds`
fn allowed_centers(home: &Rect, bounds: &Rect) -> (Vec2, Vec2) {
    let half = home.half_size();
    let mut min = Vec2::new(bounds.left, bounds.top) + half;
    let mut max = Vec2::new(bounds.right(), bounds.bottom()) - half;
    // Container smaller than the button: pin to its center on that axis
    let mid = bounds.center();
    if min.x > max.x {
        min.x = mid.x;
        max.x = mid.x;
    }
    if min.y > max.y {
        min.y = mid.y;
        max.y = mid.y;
    }
    (min, max)
}
