//! Browser platform
//!
//! `web-sys` implementations of the platform seams plus the small amount of
//! plumbing every mount needs: event listeners that detach on drop, a
//! self-stopping frame loop, and the process-wide engine slot behind the
//! exported JS controls.

pub mod frame;
pub mod mount;
pub mod surface;

pub use frame::FrameLoop;
pub use mount::{Engine, start};
pub use surface::WebSurface;

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, EventTarget, HtmlElement, Window};

use super::RenderTarget;
use crate::Rect;
use crate::error::{FxError, Result};
use crate::renderer::css::Transform;
use crate::sim::FxSignal;

/// Class toggled on engaged elements
pub const ACTIVE_CLASS: &str = "fx-active";

pub fn window() -> Result<Window> {
    web_sys::window().ok_or(FxError::Unsupported("window"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or(FxError::Unsupported("document"))
}

/// High-resolution timestamp in ms, same clock as rAF
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Map a thrown JS value into a DOM error with some context
pub(crate) fn dom_err(context: &'static str) -> impl Fn(JsValue) -> FxError {
    move |value| FxError::Dom(format!("{}: {:?}", context, value))
}

/// Bounding client rect, `None` when detached or degenerate
pub fn rect_of(element: &Element) -> Option<Rect> {
    if !element.is_connected() {
        return None;
    }
    let r = element.get_bounding_client_rect();
    Some(Rect::new(
        r.left() as f32,
        r.top() as f32,
        r.width() as f32,
        r.height() as f32,
    ))
    .filter(Rect::is_measurable)
}

/// One page element an effect writes to
pub struct DomTarget {
    element: HtmlElement,
}

impl DomTarget {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    /// `None` for non-HTML elements (e.g. SVG)
    pub fn from_element(element: Element) -> Option<Self> {
        element.dyn_into::<HtmlElement>().ok().map(Self::new)
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl RenderTarget for DomTarget {
    fn measure(&self) -> Option<Rect> {
        rect_of(&self.element)
    }

    fn set_transform(&self, transform: &Transform) {
        let _ = self
            .element
            .style()
            .set_property("transform", &transform.to_css());
    }

    fn set_style(&self, property: &str, value: &str) {
        let _ = self.element.style().set_property(property, value);
    }

    fn clear_style(&self, property: &str) {
        let _ = self.element.style().remove_property(property);
    }

    fn set_active(&self, active: bool) {
        let _ = self
            .element
            .class_list()
            .toggle_with_force(ACTIVE_CLASS, active);
    }

    fn set_text(&self, text: &str) {
        self.element.set_text_content(Some(text));
    }
}

/// Event listener that detaches itself when dropped
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self> {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(dom_err("addEventListener"))?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

/// Keep `engine` alive for the page lifetime, replacing any previous one
pub fn install(engine: Engine) {
    let previous = ENGINE.with(|slot| slot.borrow_mut().replace(engine));
    if let Some(previous) = previous {
        previous.teardown();
    }
}

fn publish(signal: FxSignal) {
    let bus = ENGINE.with(|slot| slot.borrow().as_ref().map(|e| e.signals().clone()));
    match bus {
        Some(bus) => {
            bus.publish(&signal);
        }
        None => log::warn!("{:?} ignored: effects not mounted", signal),
    }
}

/// Unmount every effect and restore the page
#[wasm_bindgen(js_name = fxTeardown)]
pub fn teardown() {
    let engine = ENGINE.with(|slot| slot.borrow_mut().take());
    if let Some(engine) = engine {
        engine.teardown();
    }
}

#[wasm_bindgen(js_name = fxBreakPage)]
pub fn break_page() {
    publish(FxSignal::BreakPage);
}

#[wasm_bindgen(js_name = fxResetPage)]
pub fn reset_page() {
    publish(FxSignal::ResetPage);
}
