//! Environment capability detection
//!
//! Queried once at startup and handed to every mount, so no effect re-runs
//! `matchMedia` or reads `maxTouchPoints` on its own.

/// What the current device/browser supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Touch-capable device (coarse pointer or touch points reported)
    pub touch: bool,
    /// `prefers-reduced-motion: reduce` is active
    pub reduced_motion: bool,
    /// Pointer events are available at all
    pub pointer_events: bool,
}

impl Default for Capabilities {
    /// Desktop browser with a mouse and no motion preference
    fn default() -> Self {
        Self {
            touch: false,
            reduced_motion: false,
            pointer_events: true,
        }
    }
}

impl Capabilities {
    /// Cursor-driven effects (magnetic, tilt, flee) need a hovering pointer
    pub fn allows_pointer_effects(&self) -> bool {
        self.pointer_events && !self.touch && !self.reduced_motion
    }

    /// Purely time-driven motion (particles, scramble, page breaker)
    pub fn allows_motion(&self) -> bool {
        !self.reduced_motion
    }

    /// Particle pool size for this device
    pub fn particle_count(&self, requested: usize) -> usize {
        if self.touch { requested / 2 } else { requested }
    }

    /// Detect from the browser environment
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        let Some(window) = web_sys::window() else {
            return Self {
                touch: false,
                reduced_motion: true,
                pointer_events: false,
            };
        };

        let matches = |query: &str| {
            window
                .match_media(query)
                .ok()
                .flatten()
                .map(|mql| mql.matches())
                .unwrap_or(false)
        };

        let touch = window.navigator().max_touch_points() > 0 || matches("(pointer: coarse)");
        let reduced_motion = matches("(prefers-reduced-motion: reduce)");
        let pointer_events = js_sys::Reflect::has(&window, &"PointerEvent".into()).unwrap_or(false);

        let caps = Self {
            touch,
            reduced_motion,
            pointer_events,
        };
        log::info!("Capabilities: {:?}", caps);
        caps
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Self {
        Self::default()
    }
}
