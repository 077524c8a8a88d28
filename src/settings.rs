//! Effect settings
//!
//! Every effect reads its knobs from here. The page can override any subset
//! through a JSON blob in `<script type="application/json" id="fx-config">`;
//! missing fields fall back to the documented defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Particle reaction to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleMode {
    /// Pushed away from the cursor
    #[default]
    #[serde(alias = "repel")]
    Scatter,
    /// Pulled toward the cursor
    Attract,
}

/// Magnetic button
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    /// Fraction of the cursor offset the element travels at full pull
    pub strength: f32,
    /// Radius (px) around the element center where the field acts
    pub max_distance: f32,
    /// Scale at full pull
    pub scale: f32,
    /// Spring ease factor per frame
    pub ease: f32,
    pub disabled: bool,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            strength: 0.35,
            max_distance: 100.0,
            scale: 1.05,
            ease: 0.15,
            disabled: false,
        }
    }
}

/// Magnetic words in a headline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordsConfig {
    pub strength: f32,
    pub max_distance: f32,
    pub ease: f32,
    pub disabled: bool,
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            strength: 0.25,
            max_distance: 120.0,
            ease: 0.12,
            disabled: false,
        }
    }
}

/// Tilt card with glare
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Degrees around X at the top/bottom edge
    pub max_tilt_x: f32,
    /// Degrees around Y at the left/right edge
    pub max_tilt_y: f32,
    /// CSS perspective distance (px)
    pub perspective: f32,
    /// Scale while hovered
    pub scale: f32,
    pub glare_enabled: bool,
    pub glare_max_opacity: f32,
    pub ease: f32,
    pub disabled: bool,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max_tilt_x: 10.0,
            max_tilt_y: 10.0,
            perspective: 1000.0,
            scale: 1.02,
            glare_enabled: true,
            glare_max_opacity: 0.35,
            ease: 0.1,
            disabled: false,
        }
    }
}

/// Ambient particle canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// CSS color used for every particle
    pub color: String,
    pub min_size: f32,
    pub max_size: f32,
    pub cursor_radius: f32,
    pub cursor_force: f32,
    pub mode: ParticleMode,
    /// Spring constant pulling particles home (per frame)
    pub home_spring: f32,
    /// Amplitude of the sinusoidal drift (px per frame²)
    pub drift: f32,
    pub disabled: bool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 80,
            color: "#6366f1".to_string(),
            min_size: 1.0,
            max_size: 3.0,
            cursor_radius: 150.0,
            cursor_force: 0.8,
            mode: ParticleMode::Scatter,
            home_spring: 0.02,
            drift: 0.02,
            disabled: false,
        }
    }
}

/// Page breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub shake_ms: f64,
    pub batch_size: usize,
    pub batch_interval_ms: f64,
    pub min_element_size: f32,
    pub viewport_margin: f32,
    pub gravity: f32,
    /// Synthesize the falling scrollbar track and thumb
    pub scrollbar: bool,
    /// Debris particles spawned per detached element
    pub debris_per_element: usize,
    pub disabled: bool,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            shake_ms: SHAKE_DURATION_MS,
            batch_size: BATCH_SIZE,
            batch_interval_ms: BATCH_INTERVAL_MS,
            min_element_size: MIN_ELEMENT_SIZE,
            viewport_margin: VIEWPORT_MARGIN,
            gravity: GRAVITY,
            scrollbar: true,
            debris_per_element: 8,
            disabled: false,
        }
    }
}

/// Button that runs away from the cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeConfig {
    /// Cursor distance (px) from the button center that triggers an escape
    pub flee_radius: f32,
    /// How far (px) one escape moves the button
    pub flee_distance: f32,
    /// Escapes before the button gives up and lets itself be clicked
    pub max_escapes: u32,
    pub ease: f32,
    pub disabled: bool,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            flee_radius: 90.0,
            flee_distance: 120.0,
            max_escapes: 6,
            ease: 0.2,
            disabled: false,
        }
    }
}

/// Scramble-to-reveal text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrambleConfig {
    /// Frames spent revealing each character
    pub frames_per_char: u32,
    /// Glyphs shown for unresolved characters
    pub glyphs: String,
    pub disabled: bool,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            frames_per_char: 3,
            glyphs: "!<>-_\\/[]{}=+*^?#".to_string(),
            disabled: false,
        }
    }
}

/// Card castle on the 404 page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CastleConfig {
    /// Pairs of leaning cards on the bottom level; one fewer per level up
    pub levels: u32,
    pub card_height: f32,
    pub card_thickness: f32,
    /// Lean of each card from vertical (radians)
    pub lean: f32,
    /// Speed (px/s) given to a card right at the knock point
    pub knock_speed: f32,
    /// Downward acceleration in px/s²
    pub gravity: f32,
    /// How long the collapse is simulated before the cards freeze
    pub settle_ms: f64,
    pub disabled: bool,
}

impl Default for CastleConfig {
    fn default() -> Self {
        Self {
            levels: 4,
            card_height: 90.0,
            card_thickness: 4.0,
            lean: 0.3,
            knock_speed: 700.0,
            gravity: GRAVITY,
            settle_ms: 4000.0,
            disabled: false,
        }
    }
}

/// All effect settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FxSettings {
    pub magnetic: MagneticConfig,
    pub words: WordsConfig,
    pub tilt: TiltConfig,
    pub particles: ParticleConfig,
    pub breaker: BreakerConfig,
    pub flee: FleeConfig,
    pub scramble: ScrambleConfig,
    pub castle: CastleConfig,
    /// Pointer sample throttle in ms
    pub pointer_throttle_ms: f64,
}

impl Default for FxSettings {
    fn default() -> Self {
        Self {
            magnetic: MagneticConfig::default(),
            words: WordsConfig::default(),
            tilt: TiltConfig::default(),
            particles: ParticleConfig::default(),
            breaker: BreakerConfig::default(),
            flee: FleeConfig::default(),
            scramble: ScrambleConfig::default(),
            castle: CastleConfig::default(),
            pointer_throttle_ms: POINTER_THROTTLE_MS,
        }
    }
}

impl FxSettings {
    /// Id of the inline JSON config element
    #[allow(dead_code)]
    const CONFIG_ELEMENT_ID: &'static str = "fx-config";

    /// Parse settings, filling anything missing with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Clamp values that would break the integrators
    fn sanitize(&mut self) {
        if self.pointer_throttle_ms <= 0.0 {
            self.pointer_throttle_ms = POINTER_THROTTLE_MS;
        }
        self.magnetic.ease = self.magnetic.ease.clamp(0.01, 1.0);
        self.words.ease = self.words.ease.clamp(0.01, 1.0);
        self.tilt.ease = self.tilt.ease.clamp(0.01, 1.0);
        self.flee.ease = self.flee.ease.clamp(0.01, 1.0);
        self.magnetic.max_distance = self.magnetic.max_distance.max(1.0);
        self.words.max_distance = self.words.max_distance.max(1.0);
        self.particles.cursor_radius = self.particles.cursor_radius.max(1.0);
        if self.particles.max_size < self.particles.min_size {
            std::mem::swap(&mut self.particles.min_size, &mut self.particles.max_size);
        }
        self.breaker.batch_size = self.breaker.batch_size.max(1);
        self.scramble.frames_per_char = self.scramble.frames_per_char.max(1);
        self.castle.levels = self.castle.levels.clamp(1, 8);
        self.castle.card_height = self.castle.card_height.max(10.0);
        self.castle.card_thickness = self.castle.card_thickness.max(1.0);
        self.castle.lean = self.castle.lean.clamp(0.05, 1.2);
    }

    /// Load settings from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = json {
            match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded effect settings from #{}", Self::CONFIG_ELEMENT_ID);
                    return settings;
                }
                Err(e) => log::warn!("Ignoring effect settings: {}", e),
            }
        }

        log::info!("Using default effect settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
