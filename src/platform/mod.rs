//! Platform abstraction layer
//!
//! The engine reaches the page through two seams:
//! - `RenderTarget`: an owned handle to one element that effects write
//!   transforms/styles to directly, outside any view framework
//! - `PageSurface`: the live document as the page breaker sees it
//!
//! `web` implements both on top of `web-sys`; `memory` is an in-process
//! stand-in used by tests and the native demo.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::rc::Rc;

use crate::Rect;
use crate::renderer::css::Transform;
use crate::sim::{CloneTransform, Debris};

/// Element registered with a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Overlay copy created by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloneId(pub u32);

/// Visible area in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Document scroll state, for the fake scrollbar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub document_height: f32,
    pub scroll_y: f32,
}

/// Purpose-built elements that fall alongside the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPart {
    ScrollTrack,
    ScrollThumb,
}

/// Owned handle to one element an effect animates
pub trait RenderTarget {
    /// Current bounding box; `None` if detached or unmeasurable
    fn measure(&self) -> Option<Rect>;
    fn set_transform(&self, transform: &Transform);
    fn set_style(&self, property: &str, value: &str);
    fn clear_style(&self, property: &str);
    /// Lets page CSS react to an engaged effect (glow, cursor changes)
    fn set_active(&self, active: bool);
    fn set_text(&self, text: &str);
}

impl<T: RenderTarget + ?Sized> RenderTarget for Rc<T> {
    fn measure(&self) -> Option<Rect> {
        (**self).measure()
    }
    fn set_transform(&self, transform: &Transform) {
        (**self).set_transform(transform)
    }
    fn set_style(&self, property: &str, value: &str) {
        (**self).set_style(property, value)
    }
    fn clear_style(&self, property: &str) {
        (**self).clear_style(property)
    }
    fn set_active(&self, active: bool) {
        (**self).set_active(active)
    }
    fn set_text(&self, text: &str) {
        (**self).set_text(text)
    }
}

/// The live page, as seen by the page breaker
pub trait PageSurface {
    fn viewport(&self) -> Viewport;
    fn scroll_metrics(&self) -> ScrollMetrics;

    /// Elements currently matching `selector`, in document order
    fn query_all(&mut self, selector: &str) -> Vec<ElementId>;
    /// `node` is `ancestor` or one of its descendants
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;
    /// Part of the effect's own overlay
    fn in_overlay(&self, element: ElementId) -> bool;
    fn measure(&self, element: ElementId) -> Option<Rect>;

    /// Deep-copy `element` into the overlay at `rect`
    fn attach_clone(&mut self, element: ElementId, rect: Rect) -> Option<CloneId>;
    fn attach_synthetic(&mut self, part: SyntheticPart, rect: Rect) -> Option<CloneId>;
    fn set_clone_transform(&mut self, clone: CloneId, transform: &CloneTransform);
    fn remove_clone(&mut self, clone: CloneId);

    /// Hide without removing from layout
    fn hide(&mut self, element: ElementId);
    /// Undo `hide`
    fn restore(&mut self, element: ElementId);

    fn set_shaking(&mut self, shaking: bool);
    /// Show or hide the overlay controls (reset button)
    fn set_controls_visible(&mut self, visible: bool);
    fn draw_debris(&mut self, _debris: &[Debris]) {}
    /// Drop any element registrations held for this run
    fn forget_elements(&mut self) {}
}
