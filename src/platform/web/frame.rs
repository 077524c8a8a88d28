//! Self-stopping requestAnimationFrame loop
//!
//! The tick runs once per frame and returns a `FrameStatus`; the loop only
//! reschedules while the tick reports `Running`. `ensure_running` wakes it
//! again. Dropping the last handle cancels any pending frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::sim::FrameStatus;

type Tick = Box<dyn FnMut(f64) -> FrameStatus>;

struct Inner {
    tick: RefCell<Tick>,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Inner {
    fn request(&self) {
        if self.handle.get().is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(cb) = self.callback.borrow().as_ref() {
            if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                self.handle.set(Some(id));
            }
        }
    }

    fn cancel(&self) {
        if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Clone)]
pub struct FrameLoop {
    inner: Rc<Inner>,
}

impl FrameLoop {
    /// `tick` receives the rAF timestamp in milliseconds
    pub fn new(tick: impl FnMut(f64) -> FrameStatus + 'static) -> Self {
        let inner = Rc::new(Inner {
            tick: RefCell::new(Box::new(tick)),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let callback = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.handle.set(None);
            let status = match inner.tick.try_borrow_mut() {
                Ok(mut tick) => tick(time),
                // Tick re-entered itself; try again next frame
                Err(_) => FrameStatus::Running,
            };
            if status.wants_next_frame() {
                inner.request();
            }
        });
        *inner.callback.borrow_mut() = Some(callback);

        Self { inner }
    }

    /// Schedule the next frame unless one is already pending
    pub fn ensure_running(&self) {
        self.inner.request();
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner.handle.get().is_some()
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
