//! The live document as a `PageSurface`
//!
//! Elements get a `data-fx-id` while registered so repeated queries resolve
//! to the same id. Clones live in a fixed, click-through overlay that also
//! holds the reset button and the debris canvas.

use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, Node, Window};

use super::{Listener, dom_err, rect_of};
use crate::Rect;
use crate::error::Result;
use crate::platform::{CloneId, ElementId, PageSurface, ScrollMetrics, SyntheticPart, Viewport};
use crate::renderer::CanvasLayer;
use crate::renderer::css::{Transform, shake_stylesheet};
use crate::sim::{CloneTransform, Debris, EventBus, FxSignal};

const ID_ATTR: &str = "data-fx-id";
const OVERLAY_ATTR: &str = "data-fx-overlay";
const SHAKE_CLASS: &str = "fx-shake";
/// One shake cycle; the class stays on for the whole pre-roll
const SHAKE_CYCLE_MS: u32 = 80;
const DEBRIS_COLOR: &str = "rgba(120, 120, 140, 0.9)";

/// Inherited styles a clone loses when it leaves its ancestors
const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "line-height",
    "letter-spacing",
    "text-align",
];

pub struct WebSurface {
    window: Window,
    document: Document,
    overlay: HtmlElement,
    /// Keyframes behind `SHAKE_CLASS`
    shake_style: HtmlElement,
    controls: HtmlElement,
    debris: Option<CanvasLayer>,
    elements: Vec<Element>,
    /// Inline `visibility` before `hide`, restored verbatim
    hidden: HashMap<ElementId, String>,
    clones: HashMap<CloneId, HtmlElement>,
    next_clone: u32,
    _reset_click: Listener,
}

impl WebSurface {
    /// Builds the overlay; the reset button publishes `ResetPage` on `signals`
    pub fn new(window: Window, signals: EventBus<FxSignal>) -> Result<Self> {
        let document = super::document()?;
        let body = document.body().ok_or(crate::FxError::Unsupported("document body"))?;

        let overlay = create_html(&document, "div")?;
        overlay
            .set_attribute(OVERLAY_ATTR, "")
            .map_err(dom_err("overlay attribute"))?;
        set_styles(
            &overlay,
            &[
                ("position", "fixed"),
                ("inset", "0"),
                ("pointer-events", "none"),
                ("z-index", "2147483000"),
                ("overflow", "hidden"),
            ],
        );

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(dom_err("create canvas"))?
            .dyn_into()
            .map_err(|_| crate::FxError::Dom("canvas is not a canvas".into()))?;
        set_styles(
            &canvas,
            &[("position", "absolute"), ("inset", "0"), ("width", "100%"), ("height", "100%")],
        );
        overlay
            .append_child(&canvas)
            .map_err(dom_err("append debris canvas"))?;
        let debris = match CanvasLayer::new(canvas) {
            Ok(layer) => Some(layer),
            Err(e) => {
                log::warn!("Debris layer unavailable: {}", e);
                None
            }
        };

        let controls = create_html(&document, "button")?;
        controls.set_text_content(Some("Put it back"));
        controls.set_class_name("fx-reset");
        set_styles(
            &controls,
            &[
                ("position", "fixed"),
                ("right", "24px"),
                ("bottom", "24px"),
                ("pointer-events", "auto"),
                ("display", "none"),
                ("z-index", "1"),
            ],
        );
        overlay
            .append_child(&controls)
            .map_err(dom_err("append reset button"))?;
        let reset_click = Listener::new(&controls, "click", move |_event| {
            signals.publish(&FxSignal::ResetPage);
        })?;

        let shake_style = create_html(&document, "style")?;
        shake_style.set_text_content(Some(&shake_stylesheet(SHAKE_CLASS, SHAKE_CYCLE_MS)));
        body.append_child(&shake_style)
            .map_err(dom_err("append shake style"))?;

        body.append_child(&overlay)
            .map_err(dom_err("append overlay"))?;

        Ok(Self {
            window,
            document,
            overlay,
            shake_style,
            controls,
            debris,
            elements: Vec::new(),
            hidden: HashMap::new(),
            clones: HashMap::new(),
            next_clone: 0,
            _reset_click: reset_click,
        })
    }

    fn register(&mut self, element: Element) -> ElementId {
        if let Some(index) = element
            .get_attribute(ID_ATTR)
            .and_then(|v| v.parse::<usize>().ok())
        {
            if self
                .elements
                .get(index)
                .is_some_and(|known| known.is_same_node(Some(as_node(&element))))
            {
                return ElementId(index as u32);
            }
        }
        let id = ElementId(self.elements.len() as u32);
        let _ = element.set_attribute(ID_ATTR, &id.0.to_string());
        self.elements.push(element);
        id
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    fn fit_debris_canvas(&mut self) {
        let viewport = self.viewport();
        let dpr = self.window.device_pixel_ratio() as f32;
        if let Some(layer) = self.debris.as_mut() {
            let backing = (
                (viewport.width * dpr).round() as u32,
                (viewport.height * dpr).round() as u32,
            );
            layer.resize(backing, dpr);
        }
    }

    fn place(&mut self, clone: HtmlElement, rect: Rect) -> Option<CloneId> {
        let (left, top) = (format!("{}px", rect.left), format!("{}px", rect.top));
        let (width, height) = (format!("{}px", rect.width), format!("{}px", rect.height));
        set_styles(
            &clone,
            &[
                ("position", "absolute"),
                ("left", left.as_str()),
                ("top", top.as_str()),
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("margin", "0"),
                ("box-sizing", "border-box"),
                ("transform-origin", "center center"),
                ("visibility", "visible"),
                ("will-change", "transform"),
            ],
        );
        // Keep the reset button above every clone
        self.overlay
            .insert_before(&clone, Some(as_node(&self.controls)))
            .ok()?;
        let id = CloneId(self.next_clone);
        self.next_clone += 1;
        self.clones.insert(id, clone);
        Some(id)
    }
}

impl PageSurface for WebSurface {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: js_px(self.window.inner_width()),
            height: js_px(self.window.inner_height()),
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        let document_height = self
            .document
            .document_element()
            .map(|root| root.scroll_height() as f32)
            .unwrap_or(0.0);
        ScrollMetrics {
            document_height,
            scroll_y: self.window.scroll_y().unwrap_or(0.0) as f32,
        }
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            log::warn!("Bad selector {:?}", selector);
            return Vec::new();
        };
        let mut ids = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            if let Some(element) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                ids.push(self.register(element));
            }
        }
        ids
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(a), Some(n)) => a.contains(Some(as_node(n))),
            _ => false,
        }
    }

    fn in_overlay(&self, element: ElementId) -> bool {
        self.element(element)
            .is_some_and(|e| self.overlay.contains(Some(as_node(e))))
    }

    fn measure(&self, element: ElementId) -> Option<Rect> {
        rect_of(self.element(element)?)
    }

    fn attach_clone(&mut self, element: ElementId, rect: Rect) -> Option<CloneId> {
        let source = self.element(element)?.clone();
        let clone: HtmlElement = source.clone_node_with_deep(true).ok()?.dyn_into().ok()?;
        let _ = clone.remove_attribute("id");
        let _ = clone.remove_attribute(ID_ATTR);

        if let Ok(Some(computed)) = self.window.get_computed_style(&source) {
            for property in INHERITED {
                if let Ok(value) = computed.get_property_value(property) {
                    let _ = clone.style().set_property(property, &value);
                }
            }
        }
        self.place(clone, rect)
    }

    fn attach_synthetic(&mut self, part: SyntheticPart, rect: Rect) -> Option<CloneId> {
        let el = create_html(&self.document, "div").ok()?;
        let (class, background, radius) = match part {
            SyntheticPart::ScrollTrack => ("fx-scroll-track", "rgba(0, 0, 0, 0.06)", "0"),
            SyntheticPart::ScrollThumb => ("fx-scroll-thumb", "rgba(0, 0, 0, 0.35)", "4px"),
        };
        el.set_class_name(class);
        set_styles(&el, &[("background", background), ("border-radius", radius)]);
        self.place(el, rect)
    }

    fn set_clone_transform(&mut self, clone: CloneId, transform: &CloneTransform) {
        if let Some(el) = self.clones.get(&clone) {
            let _ = el
                .style()
                .set_property("transform", &Transform::clone_pose(transform).to_css());
        }
    }

    fn remove_clone(&mut self, clone: CloneId) {
        if let Some(el) = self.clones.remove(&clone) {
            el.remove();
        }
    }

    fn hide(&mut self, element: ElementId) {
        let Some(el) = self.element(element).and_then(|e| e.dyn_ref::<HtmlElement>()) else {
            return;
        };
        let style = el.style();
        let previous = style.get_property_value("visibility").unwrap_or_default();
        let _ = style.set_property("visibility", "hidden");
        self.hidden.entry(element).or_insert(previous);
    }

    fn restore(&mut self, element: ElementId) {
        let Some(previous) = self.hidden.remove(&element) else {
            return;
        };
        let Some(el) = self.element(element).and_then(|e| e.dyn_ref::<HtmlElement>()) else {
            return;
        };
        let style = el.style();
        if previous.is_empty() {
            let _ = style.remove_property("visibility");
        } else {
            let _ = style.set_property("visibility", &previous);
        }
    }

    fn set_shaking(&mut self, shaking: bool) {
        if let Some(root) = self.document.document_element() {
            let _ = root.class_list().toggle_with_force(SHAKE_CLASS, shaking);
        }
    }

    fn set_controls_visible(&mut self, visible: bool) {
        if visible {
            self.fit_debris_canvas();
        }
        let _ = self
            .controls
            .style()
            .set_property("display", if visible { "block" } else { "none" });
    }

    fn draw_debris(&mut self, debris: &[Debris]) {
        if let Some(layer) = self.debris.as_ref() {
            layer.draw_debris(debris, DEBRIS_COLOR);
        }
    }

    fn forget_elements(&mut self) {
        for element in self.elements.drain(..) {
            let _ = element.remove_attribute(ID_ATTR);
        }
        self.hidden.clear();
    }
}

impl Drop for WebSurface {
    fn drop(&mut self) {
        for (_, clone) in self.clones.drain() {
            clone.remove();
        }
        self.overlay.remove();
        self.shake_style.remove();
    }
}

fn create_html(document: &Document, tag: &str) -> Result<HtmlElement> {
    document
        .create_element(tag)
        .map_err(dom_err("createElement"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| crate::FxError::Dom(format!("<{}> is not an HTML element", tag)))
}

fn as_node(element: &Element) -> &Node {
    element
}

fn js_px(value: std::result::Result<JsValue, JsValue>) -> f32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) {
    let style = element.style();
    for (property, value) in styles {
        let _ = style.set_property(property, value);
    }
}
