//! Mounting effects onto the page
//!
//! Elements opt in with `data-fx="magnetic" | "magnetic-words" | "tilt" |
//! "flee" | "scramble" | "particles" | "card-castle"`; `data-fx-disabled`
//! opts back out.
//! Break/reset triggers use `data-fx-trigger="break-page" | "reset-page"`.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlCanvasElement, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, MouseEvent, ResizeObserver, ResizeObserverEntry, Window,
};

use super::{DomTarget, FrameLoop, Listener, WebSurface, document, dom_err, now_ms, rect_of, window};
use crate::Capabilities;
use crate::effects::{
    CardCastleEffect, FleeingButton, Interactive, MagneticButton, MagneticWords, ScrambleText, TiltCard,
};
use crate::error::{FxError, Result};
use crate::renderer::CanvasLayer;
use crate::settings::{BreakerConfig, CastleConfig, FxSettings, ParticleConfig};
use crate::sim::{CursorService, EventBus, FrameStatus, FxSignal, PageBreaker, ParticleField};

/// Undo for one mounted effect
pub struct Mounted {
    name: &'static str,
    teardown: Box<dyn FnOnce()>,
}

impl Mounted {
    fn new(name: &'static str, teardown: impl FnOnce() + 'static) -> Self {
        Self {
            name,
            teardown: Box::new(teardown),
        }
    }
}

/// Everything mounted on the page
pub struct Engine {
    cursor: Rc<CursorService>,
    signals: EventBus<FxSignal>,
    mounted: Vec<Mounted>,
    _listeners: Vec<Listener>,
    /// Delivers the last throttled pointer move
    _trailing: FrameLoop,
}

impl Engine {
    pub fn cursor(&self) -> &Rc<CursorService> {
        &self.cursor
    }

    /// Bus the page breaker listens on
    pub fn signals(&self) -> &EventBus<FxSignal> {
        &self.signals
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Unmount in reverse order
    pub fn teardown(self) {
        let count = self.mounted.len();
        for mounted in self.mounted.into_iter().rev() {
            log::debug!("Unmounting {}", mounted.name);
            (mounted.teardown)();
        }
        log::info!("Unmounted {} effects", count);
    }
}

/// Wire the cursor feed and mount every opted-in element
pub fn start(settings: FxSettings, caps: Capabilities) -> Result<Engine> {
    let window = window()?;
    let document = document()?;
    let (vw, vh) = viewport_size(&window);

    let cursor = Rc::new(CursorService::new(vw, vh, settings.pointer_throttle_ms));
    let signals = EventBus::new();
    let mut listeners = Vec::new();

    let trailing = {
        let cursor = cursor.clone();
        FrameLoop::new(move |_| {
            cursor.flush(now_ms());
            if cursor.has_trailing() {
                FrameStatus::Running
            } else {
                FrameStatus::Idle
            }
        })
    };
    {
        let (cursor, trailing) = (cursor.clone(), trailing.clone());
        let event = if caps.pointer_events { "pointermove" } else { "mousemove" };
        listeners.push(Listener::new(&window, event, move |event| {
            if let Some(e) = event.dyn_ref::<MouseEvent>() {
                if !cursor.handle_move(e.client_x() as f32, e.client_y() as f32, now_ms()) {
                    trailing.ensure_running();
                }
            }
        })?);
    }
    if let Some(root) = document.document_element() {
        let cursor = cursor.clone();
        listeners.push(Listener::new(&root, "mouseleave", move |_event| {
            cursor.handle_leave();
        })?);
    }
    {
        let cursor = cursor.clone();
        let win = window.clone();
        listeners.push(Listener::new(&window, "resize", move |_event| {
            let (w, h) = viewport_size(&win);
            cursor.set_viewport(w, h);
        })?);
    }

    let mut mounted = Vec::new();
    let seed = js_sys::Date::now() as u64;
    let mut mount = |result: Result<Mounted>| match result {
        Ok(m) => mounted.push(m),
        Err(e) => log::warn!("Effect not mounted: {}", e),
    };

    if caps.allows_pointer_effects() {
        if !settings.magnetic.disabled {
            for el in opted_in(&document, "magnetic") {
                let effect = MagneticButton::new(DomTarget::new(el), settings.magnetic.clone());
                mount(Ok(mount_interactive("magnetic", effect, &cursor, false)));
            }
        }
        if !settings.words.disabled {
            for el in opted_in(&document, "magnetic-words") {
                mount(mount_words(&document, el, &settings, &cursor));
            }
        }
        if !settings.tilt.disabled {
            for el in opted_in(&document, "tilt") {
                let effect = TiltCard::new(DomTarget::new(el), settings.tilt.clone());
                mount(Ok(mount_interactive("tilt", effect, &cursor, false)));
            }
        }
        if !settings.flee.disabled {
            for el in opted_in(&document, "flee") {
                let container = el
                    .closest("[data-fx-bounds]")
                    .ok()
                    .flatten()
                    .or_else(|| el.parent_element())
                    .and_then(|c| c.dyn_into::<HtmlElement>().ok());
                let Some(container) = container else {
                    mount(Err(FxError::Unmeasurable("flee button has no container".into())));
                    continue;
                };
                let effect = FleeingButton::new(
                    DomTarget::new(el),
                    DomTarget::new(container),
                    settings.flee.clone(),
                );
                mount(Ok(mount_interactive("flee", effect, &cursor, false)));
            }
        }
    }

    // Disabled scramble leaves the final text the page already shows
    if !settings.scramble.disabled {
        for (i, el) in opted_in(&document, "scramble").into_iter().enumerate() {
            let text = el.text_content().unwrap_or_default();
            let mut effect = ScrambleText::new(
                DomTarget::new(el),
                &text,
                &settings.scramble,
                seed.wrapping_add(i as u64),
                caps.allows_motion(),
            );
            let kick = effect.start();
            mount(Ok(mount_interactive("scramble", effect, &cursor, kick)));
        }
    }

    if !settings.particles.disabled {
        for (i, el) in opted_in(&document, "particles").into_iter().enumerate() {
            match el.dyn_into::<HtmlCanvasElement>() {
                Ok(canvas) => mount(mount_particles(
                    canvas,
                    &settings.particles,
                    &caps,
                    &cursor,
                    seed.wrapping_add(1000 + i as u64),
                )),
                Err(_) => mount(Err(FxError::Unsupported("data-fx=\"particles\" needs a <canvas>"))),
            }
        }
    }

    if !settings.castle.disabled && caps.allows_pointer_effects() && caps.allows_motion() {
        for (i, el) in opted_in(&document, "card-castle").into_iter().enumerate() {
            mount(mount_castle(
                &document,
                el,
                settings.castle.clone(),
                &cursor,
                seed.wrapping_add(2000 + i as u64),
            ));
        }
    }

    if !settings.breaker.disabled {
        mount(mount_breaker(
            &window,
            &document,
            settings.breaker.clone(),
            &signals,
            &caps,
            seed,
        ));
    }

    log::info!(
        "Mounted {} effects (touch: {}, reduced motion: {})",
        mounted.len(),
        caps.touch,
        caps.reduced_motion
    );

    Ok(Engine {
        cursor,
        signals,
        mounted,
        _listeners: listeners,
        _trailing: trailing,
    })
}

fn viewport_size(window: &Window) -> (f32, f32) {
    let px = |v: std::result::Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
    (px(window.inner_width()), px(window.inner_height()))
}

/// HTML elements with `data-fx="<kind>"` and no `data-fx-disabled`
fn opted_in(document: &Document, kind: &str) -> Vec<HtmlElement> {
    let selector = format!("[data-fx=\"{}\"]:not([data-fx-disabled])", kind);
    let Ok(nodes) = document.query_selector_all(&selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
        .collect()
}

/// Pointer-driven effect on its own frame loop
fn mount_interactive<E: Interactive + 'static>(
    name: &'static str,
    effect: E,
    cursor: &Rc<CursorService>,
    kick: bool,
) -> Mounted {
    let effect = Rc::new(RefCell::new(effect));

    let frame_loop = {
        let effect = effect.clone();
        FrameLoop::new(move |_time| match effect.try_borrow_mut() {
            Ok(mut e) => e.frame(),
            Err(_) => FrameStatus::Running,
        })
    };

    let subscription = {
        let effect = effect.clone();
        let frame_loop = frame_loop.clone();
        cursor.subscribe(move |sample| {
            let wake = effect
                .try_borrow_mut()
                .map(|mut e| e.on_pointer(sample))
                .unwrap_or(false);
            if wake {
                frame_loop.ensure_running();
            }
        })
    };

    if kick {
        frame_loop.ensure_running();
    }

    let cursor = cursor.clone();
    Mounted::new(name, move || {
        cursor.unsubscribe(subscription);
        frame_loop.cancel();
        effect.borrow_mut().teardown();
    })
}

/// Card castle: one generated `div.fx-card` per card inside the stage
fn mount_castle(
    document: &Document,
    stage: HtmlElement,
    config: CastleConfig,
    cursor: &Rc<CursorService>,
    seed: u64,
) -> Result<Mounted> {
    let _ = stage.style().set_property("position", "relative");
    let mut created: Vec<HtmlElement> = Vec::new();
    let effect = CardCastleEffect::new(DomTarget::new(stage.clone()), config, seed, |_| {
        let card = document
            .create_element("div")
            .map_err(dom_err("create card"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| FxError::Dom("card is not an HTML element".into()))?;
        card.set_class_name("fx-card");
        stage.append_child(&card).map_err(dom_err("append card"))?;
        created.push(card.clone());
        Ok(DomTarget::new(card))
    });
    let effect = match effect {
        Ok(effect) => effect,
        Err(e) => {
            for card in created {
                card.remove();
            }
            return Err(e);
        }
    };

    let inner = mount_interactive("card-castle", effect, cursor, false);
    Ok(Mounted::new("card-castle", move || {
        (inner.teardown)();
        for card in created {
            card.remove();
        }
    }))
}

/// Split the headline into word spans unless the page already marked them
fn mount_words(
    document: &Document,
    host: HtmlElement,
    settings: &FxSettings,
    cursor: &Rc<CursorService>,
) -> Result<Mounted> {
    let marked = host
        .query_selector_all("[data-fx-word]")
        .map_err(dom_err("query words"))?;

    let mut original_text = None;
    let mut words = Vec::new();
    if marked.length() > 0 {
        for i in 0..marked.length() {
            if let Some(el) = marked.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                words.extend(DomTarget::from_element(el));
            }
        }
    } else {
        let text = host.text_content().unwrap_or_default();
        host.set_text_content(None);
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                host.append_with_str_1(" ").map_err(dom_err("append space"))?;
            }
            let span: HtmlElement = document
                .create_element("span")
                .map_err(dom_err("create word span"))?
                .dyn_into()
                .map_err(|_| FxError::Dom("span is not an HTML element".into()))?;
            span.set_class_name("fx-word");
            span.set_text_content(Some(word));
            let _ = span.style().set_property("display", "inline-block");
            host.append_child(&span).map_err(dom_err("append word span"))?;
            words.push(DomTarget::new(span));
        }
        original_text = Some(text);
    }

    if words.is_empty() {
        return Err(FxError::Unmeasurable("magnetic headline has no words".into()));
    }
    let effect = MagneticWords::new(words, settings.words.clone());
    let inner = mount_interactive("magnetic-words", effect, cursor, false);
    Ok(Mounted::new("magnetic-words", move || {
        (inner.teardown)();
        if let Some(text) = original_text {
            host.set_text_content(Some(&text));
        }
    }))
}

fn mount_particles(
    canvas: HtmlCanvasElement,
    config: &ParticleConfig,
    caps: &Capabilities,
    cursor: &Rc<CursorService>,
    seed: u64,
) -> Result<Mounted> {
    let count = caps.particle_count(config.count);
    let field = Rc::new(RefCell::new(ParticleField::new(config.clone(), count, seed)));
    let layer = Rc::new(RefCell::new(CanvasLayer::new(canvas.clone())?));
    let animate = caps.allows_motion();
    let color = config.color.clone();

    let frame_loop = {
        let (field, layer, cursor, canvas, color) =
            (field.clone(), layer.clone(), cursor.clone(), canvas.clone(), color.clone());
        FrameLoop::new(move |_time| {
            // Cursor in canvas-local CSS pixels
            let local = match (cursor.latest().active_position(), rect_of(&canvas)) {
                (Some(p), Some(r)) => Some(p - Vec2::new(r.left, r.top)),
                _ => None,
            };
            let Ok(mut field) = field.try_borrow_mut() else {
                return FrameStatus::Running;
            };
            let status = field.step(local);
            if status.wrote_frame() {
                layer.borrow().draw_particles(field.particles(), &color);
            }
            status
        })
    };

    let on_resize = {
        let (field, layer, frame_loop) = (field.clone(), layer.clone(), frame_loop.clone());
        Closure::<dyn FnMut(js_sys::Array, JsValue)>::new(move |entries: js_sys::Array, _observer: JsValue| {
            let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() else {
                return;
            };
            let rect = entry.content_rect();
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio()) as f32;
            let mut field = field.borrow_mut();
            field.resize(rect.width() as f32, rect.height() as f32, dpr);
            layer.borrow_mut().resize(field.backing_size(), dpr);
            // Resizing wipes the canvas
            if animate {
                if field.is_running() {
                    frame_loop.ensure_running();
                }
            } else {
                layer.borrow().draw_particles(field.particles(), &color);
            }
        })
    };
    let resize_observer =
        ResizeObserver::new(on_resize.as_ref().unchecked_ref()).map_err(dom_err("ResizeObserver"))?;
    resize_observer.observe(&canvas);

    let on_visibility = {
        let (field, frame_loop) = (field.clone(), frame_loop.clone());
        Closure::<dyn FnMut(js_sys::Array, JsValue)>::new(move |entries: js_sys::Array, _observer: JsValue| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let start = field.borrow_mut().set_visible(entry.is_intersecting());
                if start && animate {
                    frame_loop.ensure_running();
                }
            }
        })
    };
    let intersection_observer = IntersectionObserver::new(on_visibility.as_ref().unchecked_ref())
        .map_err(dom_err("IntersectionObserver"))?;
    intersection_observer.observe(&canvas);

    Ok(Mounted::new("particles", move || {
        resize_observer.disconnect();
        intersection_observer.disconnect();
        frame_loop.cancel();
        layer.borrow().clear();
        drop((on_resize, on_visibility, field));
    }))
}

struct BreakerMount {
    breaker: PageBreaker,
    surface: WebSurface,
}

fn mount_breaker(
    window: &Window,
    document: &Document,
    config: BreakerConfig,
    signals: &EventBus<FxSignal>,
    caps: &Capabilities,
    seed: u64,
) -> Result<Mounted> {
    let surface = WebSurface::new(window.clone(), signals.clone())?;
    let state = Rc::new(RefCell::new(BreakerMount {
        breaker: PageBreaker::new(config, seed),
        surface,
    }));

    let frame_loop = {
        let state = state.clone();
        FrameLoop::new(move |time| match state.try_borrow_mut() {
            Ok(mut s) => {
                let s = &mut *s;
                s.breaker.update(&mut s.surface, time)
            }
            Err(_) => FrameStatus::Running,
        })
    };

    let subscription = {
        let state = state.clone();
        let frame_loop = frame_loop.clone();
        signals.subscribe(move |signal| {
            let Ok(mut s) = state.try_borrow_mut() else {
                log::warn!("{:?} dropped: page breaker busy", signal);
                return;
            };
            let s = &mut *s;
            match signal {
                FxSignal::BreakPage => {
                    if s.breaker.activate(&mut s.surface, now_ms()) {
                        frame_loop.ensure_running();
                    }
                }
                FxSignal::ResetPage => {
                    s.breaker.reset(&mut s.surface);
                    frame_loop.cancel();
                }
            }
        })
    };

    let mut listeners = Vec::new();
    let (down, moved, up) = if caps.pointer_events {
        ("pointerdown", "pointermove", "pointerup")
    } else {
        ("mousedown", "mousemove", "mouseup")
    };
    {
        let state = state.clone();
        listeners.push(Listener::new(window, down, move |event| {
            let Some(e) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let point = Vec2::new(e.client_x() as f32, e.client_y() as f32);
            if let Ok(mut s) = state.try_borrow_mut() {
                if s.breaker.pointer_down(point) {
                    event.prevent_default();
                }
            }
        })?);
    }
    {
        let state = state.clone();
        listeners.push(Listener::new(window, moved, move |event| {
            if let (Some(e), Ok(mut s)) = (event.dyn_ref::<MouseEvent>(), state.try_borrow_mut()) {
                s.breaker
                    .pointer_move(Vec2::new(e.client_x() as f32, e.client_y() as f32));
            }
        })?);
    }
    {
        let state = state.clone();
        listeners.push(Listener::new(window, up, move |_event| {
            if let Ok(mut s) = state.try_borrow_mut() {
                s.breaker.pointer_up();
            }
        })?);
    }

    for (selector, signal) in [
        ("[data-fx-trigger=\"break-page\"]", FxSignal::BreakPage),
        ("[data-fx-trigger=\"reset-page\"]", FxSignal::ResetPage),
    ] {
        let Ok(nodes) = document.query_selector_all(selector) else {
            continue;
        };
        for i in 0..nodes.length() {
            let Some(node) = nodes.get(i) else {
                continue;
            };
            let signals = signals.clone();
            listeners.push(Listener::new(&node, "click", move |_event| {
                signals.publish(&signal);
            })?);
        }
    }

    let signals = signals.clone();
    Ok(Mounted::new("page-breaker", move || {
        signals.unsubscribe(subscription);
        drop(listeners);
        frame_loop.cancel();
        let mut s = state.borrow_mut();
        let s = &mut *s;
        s.breaker.reset(&mut s.surface);
    }))
}
