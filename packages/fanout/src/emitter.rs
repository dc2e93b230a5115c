//! The multicast emitter core.
//!
//! A [`LocalEmitter`] fans every notification out to all currently registered
//! observers, in registration order, either inline (synchronous mode) or on a
//! later turn of a cooperative scheduler (deferred mode). It does not replay:
//! an observer only ever hears what is emitted after it subscribed.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::registry::{ObserverEntry, Registry};
use crate::{Observer, Schedule, Subscription};

/// The retained terminal notification of an emitter.
///
/// Kept after termination so that a late subscriber can be told immediately
/// how the emitter ended.
enum Terminal<E> {
    Completed,
    Failed(Rc<E>),
}

impl<E> Clone for Terminal<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Completed => Self::Completed,
            Self::Failed(error) => Self::Failed(Rc::clone(error)),
        }
    }
}

struct EmitterInner<T, E> {
    registry: Registry<T, E>,
    terminal: RefCell<Option<Terminal<E>>>,

    /// Present in deferred mode; absent means deliver inline.
    scheduler: Option<Rc<dyn Schedule>>,
}

/// A multicast, non-replaying notification source.
///
/// Producers push notifications in with [`emit`][Self::emit],
/// [`error`][Self::error] and [`complete`][Self::complete]; consumers register
/// with [`subscribe`][Self::subscribe] or
/// [`subscribe_observer`][Self::subscribe_observer] and release their
/// registration through the returned [`Subscription`]. Delivery is always in
/// registration order, over a snapshot of the registry taken when the
/// notification is pushed, so handlers may freely subscribe, unsubscribe and
/// emit re-entrantly without corrupting the dispatch in progress.
///
/// The first [`error`][Self::error] or [`complete`][Self::complete] call moves
/// the emitter into its terminal state: the registry is cleared and every
/// later `emit`/`error`/`complete` call is a no-op. A subscriber arriving
/// after termination is not retained; it receives the stored terminal
/// notification immediately and its subscription is born closed.
///
/// # Delivery modes
///
/// An emitter created with [`new`][Self::new] delivers inline: `emit` has
/// notified every observer by the time it returns. One created with
/// [`with_scheduler`][Self::with_scheduler] defers instead, submitting one
/// task per observer to the scheduler; relative order between notifications
/// from the same emitter is preserved because the scheduler runs tasks in
/// submission order. Deferral is cooperative single-threaded scheduling, not
/// parallelism.
///
/// A registration that was explicitly unsubscribed is skipped even if a
/// deferred delivery to it was already queued; the delivery task re-checks
/// liveness when it fires. Termination does not cancel this way: deliveries
/// queued before the terminal notification still reach their observers.
///
/// # Cloning
///
/// Emitters are cheaply cloneable handles; all clones refer to the same
/// registry and terminal state.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use fanout::LocalEmitter;
///
/// let emitter = LocalEmitter::<i32>::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = Rc::clone(&log);
/// let subscription = emitter.subscribe(move |value| sink.borrow_mut().push(*value));
///
/// emitter.emit(1);
/// emitter.emit(2);
/// assert_eq!(*log.borrow(), vec![1, 2]);
///
/// subscription.unsubscribe();
/// emitter.emit(3);
/// assert_eq!(*log.borrow(), vec![1, 2]);
/// ```
pub struct LocalEmitter<T, E = ()> {
    inner: Rc<EmitterInner<T, E>>,
}

impl<T, E> Clone for LocalEmitter<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static, E: 'static> LocalEmitter<T, E> {
    /// Creates an emitter that delivers notifications inline.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(None)
    }

    /// Creates an emitter that defers every delivery to a scheduler turn.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use fanout::{LocalEmitter, LocalScheduler};
    ///
    /// let scheduler = Rc::new(LocalScheduler::new());
    /// let emitter = LocalEmitter::<i32>::with_scheduler(Rc::clone(&scheduler) as _);
    ///
    /// let log = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&log);
    /// let _subscription = emitter.subscribe(move |value| sink.borrow_mut().push(*value));
    ///
    /// emitter.emit(2);
    /// log.borrow_mut().push(3); // Runs before the deferred delivery of 2.
    ///
    /// scheduler.run_until_idle();
    /// assert_eq!(*log.borrow(), vec![3, 2]);
    /// ```
    #[must_use]
    pub fn with_scheduler(scheduler: Rc<dyn Schedule>) -> Self {
        Self::with_mode(Some(scheduler))
    }

    fn with_mode(scheduler: Option<Rc<dyn Schedule>>) -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                registry: Registry::new(),
                terminal: RefCell::new(None),
                scheduler,
            }),
        }
    }

    /// The number of currently registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether the emitter has delivered an error or completion.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.terminal.borrow().is_some()
    }

    /// Registers a value callback, ignoring errors and completion.
    ///
    /// Shorthand for [`subscribe_observer`][Self::subscribe_observer] with an
    /// observer that only has a value handler.
    #[must_use = "dropping the subscription handle leaves the registration in place with no way to release it"]
    pub fn subscribe<F>(&self, next: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe_observer(Observer::from_next(next))
    }

    /// Registers a full observer at the tail of the registry.
    ///
    /// The returned [`Subscription`] releases the registration when disposed.
    /// No past notifications are replayed.
    ///
    /// If the emitter has already terminated the observer is not retained:
    /// it receives the stored terminal notification immediately (inline or
    /// scheduled, per the delivery mode) and the returned subscription is
    /// already closed.
    #[must_use = "dropping the subscription handle leaves the registration in place with no way to release it"]
    pub fn subscribe_observer(&self, observer: Observer<T, E>) -> Subscription {
        let terminal = self.inner.terminal.borrow().clone();
        if let Some(terminal) = terminal {
            self.notify_late_subscriber(observer, terminal);
            return Subscription::new_closed();
        }

        let entry = Rc::new(ObserverEntry::new(observer));
        self.inner.registry.insert(Rc::clone(&entry));
        trace!(observers = self.observer_count(), "observer subscribed");

        let subscription = Subscription::new();
        let weak_inner = Rc::downgrade(&self.inner);
        subscription.add(move || {
            entry.cancel();
            if let Some(inner) = Weak::upgrade(&weak_inner) {
                inner.registry.remove(&entry);
            }
        });
        subscription
    }

    /// Creates an observer that forwards every notification into this
    /// emitter.
    ///
    /// This is how one emitter subscribes to another (or to any external
    /// source): values and errors are cloned out of the shared reference and
    /// re-emitted here.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use fanout::LocalEmitter;
    ///
    /// let upstream = LocalEmitter::<i32>::new();
    /// let downstream = LocalEmitter::<i32>::new();
    ///
    /// let log = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&log);
    /// let _subscription = downstream.subscribe(move |value| sink.borrow_mut().push(*value));
    ///
    /// let _forward = upstream.subscribe_observer(downstream.observer());
    ///
    /// upstream.emit(7);
    /// assert_eq!(*log.borrow(), vec![7]);
    /// ```
    #[must_use]
    pub fn observer(&self) -> Observer<T, E>
    where
        T: Clone,
        E: Clone,
    {
        let for_next = self.clone();
        let for_error = self.clone();
        let for_complete = self.clone();

        Observer::new()
            .on_next(move |value: &T| for_next.emit(value.clone()))
            .on_error(move |error: &E| for_error.error(error.clone()))
            .on_complete(move || for_complete.complete())
    }

    /// Delivers a value to every observer registered at call time.
    ///
    /// Observers are notified in registration order. In synchronous mode the
    /// deliveries have all happened by the time this returns; in deferred
    /// mode one task per observer is submitted to the scheduler, preserving
    /// order relative to other notifications from this emitter.
    ///
    /// A no-op after termination.
    ///
    /// # Panics
    ///
    /// In synchronous mode a panic in one observer's handler does not rob the
    /// remaining observers of their delivery; the first captured payload is
    /// re-raised once the dispatch loop has finished. In deferred mode a
    /// handler panic propagates out of the scheduler's drain instead, leaving
    /// the remaining queued deliveries intact.
    pub fn emit(&self, value: T) {
        if self.is_terminated() {
            return;
        }

        let snapshot = self.inner.registry.snapshot();
        match &self.inner.scheduler {
            None => {
                Self::dispatch_inline(&snapshot, |observer| observer.next(&value));
            }
            Some(scheduler) => {
                let value = Rc::new(value);
                for entry in snapshot {
                    let value = Rc::clone(&value);
                    scheduler.schedule(Box::new(move || {
                        if !entry.is_cancelled() {
                            entry.observer().next(&value);
                        }
                    }));
                }
            }
        }
    }

    /// Delivers an error to every observer, then terminates the emitter.
    ///
    /// The terminal state is recorded before delivery, so a handler that
    /// re-enters `emit`, `error` or `complete` finds the emitter already
    /// terminated. The registry is cleared; observers without an error
    /// handler drop the error silently. A no-op if already terminated.
    ///
    /// # Panics
    ///
    /// Handler faults are isolated the same way as in [`emit`][Self::emit].
    pub fn error(&self, error: E) {
        let error = Rc::new(error);
        self.terminate(Terminal::Failed(error));
    }

    /// Delivers the completion notification to every observer, then
    /// terminates the emitter.
    ///
    /// Symmetric to [`error`][Self::error]: terminal state first, registry
    /// cleared, no-op if already terminated.
    ///
    /// # Panics
    ///
    /// Handler faults are isolated the same way as in [`emit`][Self::emit].
    pub fn complete(&self) {
        self.terminate(Terminal::Completed);
    }

    fn terminate(&self, terminal: Terminal<E>) {
        {
            let mut slot = self.inner.terminal.borrow_mut();
            if slot.is_some() {
                return;
            }
            *slot = Some(terminal.clone());
        }

        // Drained, not cancelled: deferred deliveries already queued for
        // these registrations must still fire.
        let drained = self.inner.registry.drain();
        trace!(observers = drained.len(), "emitter terminated");

        match &self.inner.scheduler {
            None => match terminal {
                Terminal::Completed => {
                    Self::dispatch_inline(&drained, Observer::complete);
                }
                Terminal::Failed(error) => {
                    Self::dispatch_inline(&drained, |observer| observer.error(&error));
                }
            },
            Some(scheduler) => {
                for entry in drained {
                    let terminal = terminal.clone();
                    scheduler.schedule(Box::new(move || {
                        if entry.is_cancelled() {
                            return;
                        }
                        match &terminal {
                            Terminal::Completed => entry.observer().complete(),
                            Terminal::Failed(error) => entry.observer().error(error),
                        }
                    }));
                }
            }
        }
    }

    fn notify_late_subscriber(&self, observer: Observer<T, E>, terminal: Terminal<E>) {
        match &self.inner.scheduler {
            None => match terminal {
                Terminal::Completed => observer.complete(),
                Terminal::Failed(error) => observer.error(&error),
            },
            Some(scheduler) => {
                scheduler.schedule(Box::new(move || match terminal {
                    Terminal::Completed => observer.complete(),
                    Terminal::Failed(error) => observer.error(&error),
                }));
            }
        }
    }

    /// Walks a snapshot in order, skipping cancelled registrations and
    /// isolating each handler call so one fault cannot rob the remaining
    /// observers of delivery. The first captured panic payload is re-raised
    /// after the loop.
    fn dispatch_inline<F>(snapshot: &[Rc<ObserverEntry<T, E>>], deliver: F)
    where
        F: Fn(&Observer<T, E>),
    {
        let mut first_panic = None;
        for entry in snapshot {
            if entry.is_cancelled() {
                continue;
            }

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| deliver(entry.observer())))
            {
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

impl<T: 'static, E: 'static> crate::Subscribable for LocalEmitter<T, E> {
    type Item = T;
    type Error = E;

    fn subscribe_observer(&self, observer: Observer<T, E>) -> Subscription {
        LocalEmitter::subscribe_observer(self, observer)
    }
}

impl<T: 'static, E: 'static> Default for LocalEmitter<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for LocalEmitter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmitter")
            .field("observers", &self.inner.registry.len())
            .field("terminated", &self.inner.terminal.borrow().is_some())
            .field("deferred", &self.inner.scheduler.is_some())
            .finish()
    }
}
