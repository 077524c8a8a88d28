//! Tilt and glare
//!
//! Cursor offset inside a card maps to a 3D rotation plus a fake specular
//! highlight that follows the cursor and brightens with the tilt.

use glam::Vec2;

use super::spring::Springable;
use crate::settings::TiltConfig;
use crate::{Rect, clamp01};

/// Everything the tilt effect animates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltPose {
    /// Degrees
    pub rotate_x: f32,
    /// Degrees
    pub rotate_y: f32,
    pub scale: f32,
    /// Glare center, percent of the card width
    pub glare_x: f32,
    /// Glare center, percent of the card height
    pub glare_y: f32,
    pub glare_opacity: f32,
}

impl TiltPose {
    pub const NEUTRAL: TiltPose = TiltPose {
        rotate_x: 0.0,
        rotate_y: 0.0,
        scale: 1.0,
        glare_x: 50.0,
        glare_y: 50.0,
        glare_opacity: 0.0,
    };

    fn to_array(self) -> [f32; 6] {
        [
            self.rotate_x,
            self.rotate_y,
            self.scale,
            self.glare_x,
            self.glare_y,
            self.glare_opacity,
        ]
    }

    fn from_array(a: [f32; 6]) -> Self {
        Self {
            rotate_x: a[0],
            rotate_y: a[1],
            scale: a[2],
            glare_x: a[3],
            glare_y: a[4],
            glare_opacity: a[5],
        }
    }
}

impl Default for TiltPose {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl Springable for TiltPose {
    fn ease_toward(self, target: Self, t: f32) -> Self {
        let a = self.to_array();
        let b = target.to_array();
        Self::from_array(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
    }

    fn max_delta(self, other: Self) -> f32 {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

/// Target pose for a card occupying `rect`
pub fn tilt_target(rect: &Rect, cursor: Option<Vec2>, config: &TiltConfig) -> TiltPose {
    let Some(cursor) = cursor else {
        return TiltPose::NEUTRAL;
    };
    if rect.width <= 0.0 || rect.height <= 0.0 || !rect.contains(cursor) {
        return TiltPose::NEUTRAL;
    }

    let half = rect.half_size();
    let rel = cursor - rect.center();
    let nx = (rel.x / half.x).clamp(-1.0, 1.0);
    let ny = (rel.y / half.y).clamp(-1.0, 1.0);

    // Cursor up tilts the top edge away from the viewer
    let rotate_y = nx * config.max_tilt_y;
    let rotate_x = -ny * config.max_tilt_x;

    let max_tilt = Vec2::new(config.max_tilt_x, config.max_tilt_y).length();
    let glare_opacity = if config.glare_enabled && max_tilt > 0.0 {
        clamp01(Vec2::new(rotate_x, rotate_y).length() / max_tilt) * config.glare_max_opacity
    } else {
        0.0
    };

    TiltPose {
        rotate_x,
        rotate_y,
        scale: config.scale,
        glare_x: (cursor.x - rect.left) / rect.width * 100.0,
        glare_y: (cursor.y - rect.top) / rect.height * 100.0,
        glare_opacity,
    }
}
