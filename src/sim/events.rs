//! Page-wide signals
//!
//! A small observer list shared by handle. Whoever fires a signal and whoever
//! reacts to it both receive the bus explicitly; nothing listens on a global.

use std::cell::RefCell;
use std::rc::Rc;

/// Signals understood by the page breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxSignal {
    /// Start the shake -> fall sequence
    BreakPage,
    /// Put the page back together
    ResetPage,
}

/// Identifies one subscription for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct BusInner<E> {
    next_id: u32,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

/// Single-threaded broadcast channel. Clones share the same subscriber list.
pub struct EventBus<E> {
    inner: Rc<RefCell<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.handlers.push((id, Rc::new(RefCell::new(handler))));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.handlers.len();
        inner.handlers.retain(|(h, _)| *h != id);
        inner.handlers.len() != before
    }

    /// Deliver to every subscriber, returns how many received it.
    ///
    /// Handlers may subscribe, unsubscribe or publish from inside the call.
    /// A handler that is already running (re-entrant publish) is skipped.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();

        let mut delivered = 0;
        for handler in snapshot {
            match handler.try_borrow_mut() {
                Ok(mut f) => {
                    f(event);
                    delivered += 1;
                }
                Err(_) => log::debug!("Skipping re-entrant event handler"),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            bus.subscribe(move |signal: &FxSignal| {
                if *signal == FxSignal::BreakPage {
                    hits.set(hits.get() + 1);
                }
            });
        }
        assert_eq!(bus.publish(&FxSignal::BreakPage), 3);
        assert_eq!(hits.get(), 3);
        bus.publish(&FxSignal::ResetPage);
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let bus: EventBus<FxSignal> = EventBus::new();
        let id = bus.subscribe(|_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(&FxSignal::BreakPage), 0);
    }

    #[test]
    fn test_reentrant_publish_does_not_panic() {
        let bus: EventBus<FxSignal> = EventBus::new();
        let inner_bus = bus.clone();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        bus.subscribe(move |signal| {
            c.set(c.get() + 1);
            if *signal == FxSignal::BreakPage {
                inner_bus.publish(&FxSignal::ResetPage);
            }
        });
        bus.publish(&FxSignal::BreakPage);
        // The nested publish skips the handler that is still running
        assert_eq!(count.get(), 1);
    }
}
