//! Ordered observer registry backing an emitter.
//!
//! The registry is mutated freely while dispatch is in progress: dispatch
//! always iterates a snapshot taken at call start, and the live vector is
//! only ever borrowed for the duration of a single insert, remove or copy.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::Observer;

/// One registration: an observer plus its cancellation flag.
///
/// The flag is set only by explicit unsubscribe. Termination drains entries
/// from the registry without setting it, which is what allows a deferred
/// delivery queued before termination to still fire while a delivery queued
/// before an unsubscribe is skipped.
pub(crate) struct ObserverEntry<T, E> {
    observer: Observer<T, E>,
    cancelled: Cell<bool>,
}

impl<T, E> ObserverEntry<T, E> {
    pub(crate) fn new(observer: Observer<T, E>) -> Self {
        Self {
            observer,
            cancelled: Cell::new(false),
        }
    }

    /// Marks this registration as explicitly unsubscribed.
    pub(crate) fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub(crate) fn observer(&self) -> &Observer<T, E> {
        &self.observer
    }
}

impl<T, E> fmt::Debug for ObserverEntry<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("observer", &self.observer)
            .field("cancelled", &self.cancelled.get())
            .finish()
    }
}

/// Insertion-ordered collection of active registrations.
///
/// Insertion order is delivery order. Uniqueness is not required: the same
/// logical observer may be registered many times, each registration with its
/// own entry identity (the `Rc` pointer).
pub(crate) struct Registry<T, E> {
    entries: RefCell<Vec<Rc<ObserverEntry<T, E>>>>,
}

impl<T, E> Registry<T, E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Appends a registration at the tail.
    pub(crate) fn insert(&self, entry: Rc<ObserverEntry<T, E>>) {
        self.entries.borrow_mut().push(entry);
    }

    /// Removes the registration with the given identity, if still present.
    pub(crate) fn remove(&self, entry: &Rc<ObserverEntry<T, E>>) {
        self.entries
            .borrow_mut()
            .retain(|candidate| !Rc::ptr_eq(candidate, entry));
    }

    /// Copies the current registrations for iteration.
    ///
    /// The borrow on the live vector ends before this returns, so handlers
    /// invoked while walking the snapshot may re-enter subscribe and
    /// unsubscribe without conflict.
    pub(crate) fn snapshot(&self) -> Vec<Rc<ObserverEntry<T, E>>> {
        self.entries.borrow().clone()
    }

    /// Removes and returns every registration, in order.
    ///
    /// Unlike [`remove`][Self::remove] via cancellation this does not mark
    /// the entries; it is the terminal-state path, where already-queued
    /// deliveries must still reach their observers.
    pub(crate) fn drain(&self) -> Vec<Rc<ObserverEntry<T, E>>> {
        self.entries.take()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl<T, E> fmt::Debug for Registry<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .finish()
    }
}
