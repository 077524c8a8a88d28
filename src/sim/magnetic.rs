//! Magnetic field targets
//!
//! Single element: linear falloff, the element leans toward the cursor and
//! grows slightly. Word field: the same law squared, evaluated per word with
//! its own spring so a dense headline ripples instead of lurching.

use glam::{Vec2, Vec3};

use super::spring::{FrameStatus, SpringFollow};
use crate::Rect;
use crate::settings::{MagneticConfig, WordsConfig};

/// Rest pose for the magnetic button: no offset, scale 1
pub const MAGNETIC_REST: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// 1 at the center, 0 at and beyond `max_distance`
#[inline]
pub fn linear_pull(distance: f32, max_distance: f32) -> f32 {
    if max_distance <= 0.0 || distance >= max_distance {
        0.0
    } else {
        1.0 - distance / max_distance
    }
}

/// Sharper near the cursor, calmer farther out
#[inline]
pub fn squared_pull(distance: f32, max_distance: f32) -> f32 {
    let pull = linear_pull(distance, max_distance);
    pull * pull
}

/// Target `(x, y, scale)` for a magnetic element centered in `rect`
pub fn magnetic_target(rect: &Rect, cursor: Option<Vec2>, config: &MagneticConfig) -> Vec3 {
    let Some(cursor) = cursor else {
        return MAGNETIC_REST;
    };
    let delta = cursor - rect.center();
    let pull = linear_pull(delta.length(), config.max_distance);
    if pull <= 0.0 {
        return MAGNETIC_REST;
    }
    let offset = delta * config.strength * pull;
    Vec3::new(offset.x, offset.y, 1.0 + (config.scale - 1.0) * pull)
}

/// Target offset for one word
pub fn word_target(rect: &Rect, cursor: Option<Vec2>, config: &WordsConfig) -> Vec2 {
    let Some(cursor) = cursor else {
        return Vec2::ZERO;
    };
    let delta = cursor - rect.center();
    let pull = squared_pull(delta.length(), config.max_distance);
    if pull <= 0.0 {
        return Vec2::ZERO;
    }
    delta * config.strength * pull
}

/// Index of a word inside a `WordField`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordHandle(usize);

impl WordHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Independent springs for every word of a block of text
#[derive(Debug, Clone)]
pub struct WordField {
    springs: Vec<SpringFollow<Vec2>>,
    config: WordsConfig,
}

impl WordField {
    pub fn new(config: WordsConfig) -> Self {
        Self {
            springs: Vec::new(),
            config,
        }
    }

    pub fn add_word(&mut self) -> WordHandle {
        self.springs.push(SpringFollow::new(Vec2::ZERO, self.config.ease));
        WordHandle(self.springs.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.springs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.springs.is_empty()
    }

    /// Retarget one word from its untransformed rect.
    /// Returns true if that word's spring woke up.
    pub fn retarget(&mut self, word: WordHandle, rect: &Rect, cursor: Option<Vec2>) -> bool {
        let target = word_target(rect, cursor, &self.config);
        match self.springs.get_mut(word.0) {
            Some(spring) => spring.set_target(target),
            None => false,
        }
    }

    /// Relax every word home
    pub fn release_all(&mut self) -> bool {
        let mut woke = false;
        for spring in &mut self.springs {
            woke |= spring.release();
        }
        woke
    }

    /// Step every word; the returned status covers the whole field
    pub fn step(&mut self) -> FrameStatus {
        self.springs
            .iter_mut()
            .fold(FrameStatus::Idle, |acc, spring| acc.merge(spring.step()))
    }

    pub fn offset(&self, word: WordHandle) -> Vec2 {
        self.springs
            .get(word.0)
            .map(|s| s.current())
            .unwrap_or(Vec2::ZERO)
    }

    pub fn is_running(&self, word: WordHandle) -> bool {
        self.springs.get(word.0).is_some_and(|s| s.is_running())
    }

    pub fn snap_all(&mut self) {
        for spring in &mut self.springs {
            spring.snap_to_rest();
        }
    }
}
