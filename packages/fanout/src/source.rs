//! The reactive interop contract.
//!
//! [`Subscribable`] is the capability every notification source exposes, and
//! [`Operator`] is the capability every pipeline stage exposes. Both sides of
//! the contract are open: externally authored sources can be piped through
//! the operators in this crate, and externally authored operators can wrap a
//! [`LocalEmitter`][crate::LocalEmitter], because nothing here depends on the
//! concrete emitter type.

use crate::{Observer, Subscription};

/// A source of notifications that observers can register with.
///
/// Implementors fan values of type [`Item`][Self::Item] (and errors of type
/// [`Error`][Self::Error]) out to registered observers. The returned
/// [`Subscription`] must release the registration when disposed; for derived
/// sources that means releasing the upstream registration, however many
/// stages sit in between.
pub trait Subscribable {
    /// The type of the values this source delivers.
    type Item;

    /// The type of the error this source may deliver.
    type Error;

    /// Registers a full observer with this source.
    #[must_use = "dropping the subscription handle leaves the registration in place with no way to release it"]
    fn subscribe_observer(&self, observer: Observer<Self::Item, Self::Error>) -> Subscription;
}

/// Convenience methods available on every [`Subscribable`].
pub trait SubscribableExt: Subscribable {
    /// Registers a value callback, ignoring errors and completion.
    #[must_use = "dropping the subscription handle leaves the registration in place with no way to release it"]
    fn subscribe<F>(&self, next: F) -> Subscription
    where
        F: Fn(&Self::Item) + 'static,
    {
        self.subscribe_observer(Observer::from_next(next))
    }

    /// Layers a pipeline stage over this source.
    ///
    /// The derived source subscribes through the stage: each of its
    /// subscriptions holds exactly one registration on this source, and
    /// disposing it releases that registration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// use fanout::{LocalEmitter, SubscribableExt, filter, map};
    ///
    /// let emitter = LocalEmitter::<i32>::new();
    /// let doubled_evens = emitter
    ///     .clone()
    ///     .pipe(filter(|value: &i32| value % 2 == 0))
    ///     .pipe(map(|value: &i32| value * 2));
    ///
    /// let log = Rc::new(RefCell::new(Vec::new()));
    /// let sink = Rc::clone(&log);
    /// let subscription = doubled_evens.subscribe(move |value| sink.borrow_mut().push(*value));
    ///
    /// emitter.emit(1);
    /// emitter.emit(2);
    /// assert_eq!(*log.borrow(), vec![4]);
    ///
    /// subscription.unsubscribe();
    /// assert_eq!(emitter.observer_count(), 0);
    /// ```
    fn pipe<O>(self, operator: O) -> O::Output
    where
        Self: Sized,
        O: Operator<Self>,
    {
        operator.apply(self)
    }
}

impl<S: Subscribable> SubscribableExt for S {}

/// A pipeline stage: a transformation layered over a subscribable source.
///
/// Applying an operator consumes the stage description and the source and
/// produces the derived source. Operators compose associatively through
/// [`SubscribableExt::pipe`].
pub trait Operator<S: Subscribable> {
    /// The derived source this stage produces.
    type Output: Subscribable;

    /// Wraps the source in this stage.
    fn apply(self, source: S) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// A minimal externally authored source: delivers a fixed set of values
    /// and completes at subscribe time.
    struct Replay {
        values: Vec<i32>,
    }

    impl Subscribable for Replay {
        type Item = i32;
        type Error = ();

        fn subscribe_observer(&self, observer: Observer<i32, ()>) -> Subscription {
            for value in &self.values {
                observer.next(value);
            }
            observer.complete();
            Subscription::new_closed()
        }
    }

    #[test]
    fn external_sources_implement_the_contract() {
        let source = Replay {
            values: vec![1, 2, 3],
        };

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let subscription = source.subscribe(move |value| sink.borrow_mut().push(*value));

        assert!(subscription.is_closed());
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn external_sources_compose_with_crate_operators() {
        let source = Replay {
            values: vec![1, 2, 3, 4],
        };

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let _subscription = source
            .pipe(crate::filter(|value: &i32| value % 2 == 0))
            .subscribe(move |value| sink.borrow_mut().push(*value));

        assert_eq!(*log.borrow(), vec![2, 4]);
    }
}
