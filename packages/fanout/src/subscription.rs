//! Disposable registration handles and teardown composition.
//!
//! Every subscribe call produces a [`Subscription`]. Disposing it runs the
//! attached teardown actions, which is how a registration is released - both
//! directly on an emitter and transitively through any number of pipeline
//! stages layered on top of it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::trace;

type TeardownAction = Box<dyn FnOnce()>;

/// A disposable handle for one registration.
///
/// A subscription owns an ordered list of teardown actions and runs them
/// exactly once, in attachment order, when [`unsubscribe`][Self::unsubscribe]
/// is first called. Later calls are no-ops. An action attached after the
/// subscription has already closed runs immediately instead of being
/// deferred, so teardown is never lost to a race between attachment and an
/// upstream completion.
///
/// Teardown ownership forms a strict tree: a parent subscription owns its
/// child actions and children hold no references back, so composed chains
/// cannot form cycles.
///
/// Clones share the same underlying state; disposing any clone disposes the
/// registration.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use fanout::Subscription;
///
/// let subscription = Subscription::new();
///
/// let released = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&released);
/// subscription.add(move || flag.set(true));
///
/// subscription.unsubscribe();
/// assert!(released.get());
///
/// // Attaching to an already-closed subscription runs immediately.
/// let late = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&late);
/// subscription.add(move || flag.set(true));
/// assert!(late.get());
/// ```
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

struct SubscriptionInner {
    closed: Cell<bool>,
    teardowns: RefCell<Vec<TeardownAction>>,
}

impl Subscription {
    /// Creates an open subscription with no teardown actions attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                closed: Cell::new(false),
                teardowns: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Creates a subscription that is already closed.
    ///
    /// Subscribing to an already-terminated emitter returns one of these:
    /// there is no registration to release, and any teardown attached later
    /// runs immediately.
    #[must_use]
    pub fn new_closed() -> Self {
        let subscription = Self::new();
        subscription.inner.closed.set(true);
        subscription
    }

    /// Whether this subscription has been disposed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Attaches a teardown action to run on disposal.
    ///
    /// If the subscription is already closed the action runs immediately
    /// instead of being deferred.
    pub fn add<F>(&self, teardown: F)
    where
        F: FnOnce() + 'static,
    {
        if self.inner.closed.get() {
            teardown();
        } else {
            self.inner.teardowns.borrow_mut().push(Box::new(teardown));
        }
    }

    /// Attaches a child subscription, to be disposed when this one is.
    ///
    /// This is how pipeline stages compose disposal: the derived
    /// subscription owns the upstream one, and disposing the derived handle
    /// transitively releases the upstream registration.
    pub fn add_subscription(&self, child: Self) {
        self.add(move || child.unsubscribe());
    }

    /// Disposes the subscription, running every attached teardown action
    /// exactly once, in attachment order.
    ///
    /// Idempotent: only the first call has any effect.
    ///
    /// # Panics
    ///
    /// A panic raised by one teardown action does not prevent the remaining
    /// actions from running; the first captured payload is re-raised once
    /// all of them have run.
    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }

        // Actions attached from inside a teardown see `closed` already set
        // and run immediately, so taking the whole list up front is safe.
        let actions = self.inner.teardowns.take();
        trace!(teardowns = actions.len(), "subscription disposed");

        let mut first_panic = None;
        for action in actions {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.inner.closed.get())
            .field("pending_teardowns", &self.inner.teardowns.borrow().len())
            .finish()
    }
}
