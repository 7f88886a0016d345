#![forbid(unsafe_code)]

//! Value-less change events with weak, guard-owned subscribers.
//!
//! # Design
//!
//! A [`Signal<E>`] keeps its subscribers as `Weak<dyn Fn(&E)>`. The strong
//! side lives in the [`Subscription`] guard returned by
//! [`Signal::subscribe`], so dropping the guard is the unsubscribe
//! operation. Dead entries are pruned lazily on the next emit.
//!
//! # Re-entrancy
//!
//! `emit` collects the live callbacks and releases its borrow before calling
//! any of them. A callback may therefore emit on the same signal, subscribe
//! new callbacks, or drop guards. Callbacks added during an emit are first
//! called on the following emit.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

struct SignalInner<E> {
    subscribers: Vec<CallbackWeak<E>>,
    emitted: u64,
}

/// A shared event source.
///
/// Cloning a `Signal` creates a new handle to the **same** subscriber list.
///
/// # Invariants
///
/// 1. Subscribers are called in registration order.
/// 2. A callback whose guard has been dropped is never called again.
pub struct Signal<E> {
    inner: Rc<RefCell<SignalInner<E>>>,
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("subscriber_count", &inner.subscribers.len())
            .field("emitted", &inner.emitted)
            .finish()
    }
}

impl<E: 'static> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Signal<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                subscribers: Vec::new(),
                emitted: 0,
            })),
        }
    }

    /// Register `callback`. It stays registered while the returned guard
    /// is alive.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        // `Rc<dyn Fn(&E)>` cannot coerce to `Rc<dyn Any>`; box it instead.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Call every live subscriber with `event`.
    pub fn emit(&self, event: &E) {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut inner = self.inner.borrow_mut();
            inner.emitted += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(|w| w.upgrade())
                .collect()
        };

        if callbacks.is_empty() {
            return;
        }

        let _span = tracing::trace_span!("signal.emit", subscribers = callbacks.len()).entered();
        for cb in &callbacks {
            cb(event);
        }
    }
}

impl<E> Signal<E> {
    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Number of emits so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.borrow().emitted
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it makes the callback unreachable. The dead `Weak` entry is
/// removed on the next emit.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
