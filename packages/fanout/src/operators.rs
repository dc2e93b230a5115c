//! Pipeline stages for transforming a notification source.
//!
//! A stage wraps an upstream [`Subscribable`] and produces a derived source.
//! Subscribing to the derived source builds an internal forwarding observer,
//! registers it upstream and hands back the upstream subscription, so
//! disposal through a chain of any length releases exactly one registration
//! on the original source.

use std::fmt;
use std::rc::Rc;

use crate::{Observer, Operator, Subscribable, Subscription};

/// Creates a stage that forwards only the values matching a predicate.
///
/// Errors and completion always pass through.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use fanout::{LocalEmitter, SubscribableExt, filter};
///
/// let emitter = LocalEmitter::<i32>::new();
/// let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&log);
/// let _subscription = evens.subscribe(move |value| sink.borrow_mut().push(*value));
///
/// for value in 1..=4 {
///     emitter.emit(value);
/// }
/// assert_eq!(*log.borrow(), vec![2, 4]);
/// ```
#[must_use]
pub fn filter<P>(predicate: P) -> FilterOperator<P> {
    FilterOperator { predicate }
}

/// Creates a stage that forwards every value through a transformation.
///
/// Errors and completion always pass through.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use fanout::{LocalEmitter, SubscribableExt, map};
///
/// let emitter = LocalEmitter::<i32>::new();
/// let labeled = emitter.clone().pipe(map(|value: &i32| format!("#{value}")));
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&log);
/// let _subscription = labeled.subscribe(move |label| sink.borrow_mut().push(label.clone()));
///
/// emitter.emit(7);
/// assert_eq!(*log.borrow(), vec!["#7".to_string()]);
/// ```
#[must_use]
pub fn map<F>(transform: F) -> MapOperator<F> {
    MapOperator { transform }
}

/// The stage description produced by [`filter`].
pub struct FilterOperator<P> {
    predicate: P,
}

impl<S, P> Operator<S> for FilterOperator<P>
where
    S: Subscribable,
    S::Item: 'static,
    S::Error: 'static,
    P: Fn(&S::Item) -> bool + 'static,
{
    type Output = Filtered<S, P>;

    fn apply(self, source: S) -> Self::Output {
        Filtered {
            source,
            predicate: Rc::new(self.predicate),
        }
    }
}

impl<P> fmt::Debug for FilterOperator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOperator").finish_non_exhaustive()
    }
}

/// A source derived by [`filter`]: the upstream source, seen through a
/// predicate.
pub struct Filtered<S, P> {
    source: S,
    predicate: Rc<P>,
}

impl<S, P> Subscribable for Filtered<S, P>
where
    S: Subscribable,
    S::Item: 'static,
    S::Error: 'static,
    P: Fn(&S::Item) -> bool + 'static,
{
    type Item = S::Item;
    type Error = S::Error;

    fn subscribe_observer(&self, observer: Observer<S::Item, S::Error>) -> Subscription {
        let downstream = Rc::new(observer);
        let predicate = Rc::clone(&self.predicate);

        let forwarding = Observer::new()
            .on_next({
                let downstream = Rc::clone(&downstream);
                move |value: &S::Item| {
                    if predicate(value) {
                        downstream.next(value);
                    }
                }
            })
            .on_error({
                let downstream = Rc::clone(&downstream);
                move |error: &S::Error| downstream.error(error)
            })
            .on_complete(move || downstream.complete());

        // The upstream subscription is the derived subscription: disposing
        // it releases the one registration this subscribe created.
        self.source.subscribe_observer(forwarding)
    }
}

impl<S: fmt::Debug, P> fmt::Debug for Filtered<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filtered")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// The stage description produced by [`map`].
pub struct MapOperator<F> {
    transform: F,
}

impl<S, F, U> Operator<S> for MapOperator<F>
where
    S: Subscribable,
    S::Item: 'static,
    S::Error: 'static,
    F: Fn(&S::Item) -> U + 'static,
    U: 'static,
{
    type Output = Mapped<S, F>;

    fn apply(self, source: S) -> Self::Output {
        Mapped {
            source,
            transform: Rc::new(self.transform),
        }
    }
}

impl<F> fmt::Debug for MapOperator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOperator").finish_non_exhaustive()
    }
}

/// A source derived by [`map`]: the upstream source, with every value
/// transformed.
pub struct Mapped<S, F> {
    source: S,
    transform: Rc<F>,
}

impl<S, F, U> Subscribable for Mapped<S, F>
where
    S: Subscribable,
    S::Item: 'static,
    S::Error: 'static,
    F: Fn(&S::Item) -> U + 'static,
    U: 'static,
{
    type Item = U;
    type Error = S::Error;

    fn subscribe_observer(&self, observer: Observer<U, S::Error>) -> Subscription {
        let downstream = Rc::new(observer);
        let transform = Rc::clone(&self.transform);

        let forwarding = Observer::new()
            .on_next({
                let downstream = Rc::clone(&downstream);
                move |value: &S::Item| downstream.next(&transform(value))
            })
            .on_error({
                let downstream = Rc::clone(&downstream);
                move |error: &S::Error| downstream.error(error)
            })
            .on_complete(move || downstream.complete());

        self.source.subscribe_observer(forwarding)
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Mapped<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::{LocalEmitter, LocalScheduler, SubscribableExt};

    use super::*;

    fn shared_log<V>() -> Rc<RefCell<Vec<V>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn filter_forwards_only_matching_values() {
        let emitter = LocalEmitter::<i32>::new();
        let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));

        let log = shared_log();
        let sink = Rc::clone(&log);
        let _retained = evens.subscribe(move |value| sink.borrow_mut().push(*value));

        for value in 1..=5 {
            emitter.emit(value);
        }

        assert_eq!(*log.borrow(), vec![2, 4]);
    }

    #[test]
    fn map_transforms_every_value() {
        let emitter = LocalEmitter::<i32>::new();
        let doubled = emitter.clone().pipe(map(|value: &i32| value * 2));

        let log = shared_log();
        let sink = Rc::clone(&log);
        let _retained = doubled.subscribe(move |value| sink.borrow_mut().push(*value));

        emitter.emit(1);
        emitter.emit(2);

        assert_eq!(*log.borrow(), vec![2, 4]);
    }

    #[test]
    fn unsubscribing_through_a_stage_releases_the_source_registration() {
        let emitter = LocalEmitter::<i32>::new();
        let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));

        let subscription = evens.subscribe(|_| {});
        assert_eq!(emitter.observer_count(), 1);

        subscription.unsubscribe();
        assert_eq!(emitter.observer_count(), 0);
    }

    #[test]
    fn chained_stages_hold_exactly_one_source_registration() {
        let emitter = LocalEmitter::<i32>::new();
        let derived = emitter
            .clone()
            .pipe(filter(|value: &i32| *value > 0))
            .pipe(map(|value: &i32| value * 10))
            .pipe(filter(|value: &i32| value % 20 == 0));

        let log = shared_log();
        let sink = Rc::clone(&log);
        let subscription = derived.subscribe(move |value| sink.borrow_mut().push(*value));

        assert_eq!(emitter.observer_count(), 1);

        emitter.emit(-2);
        emitter.emit(1);
        emitter.emit(2);
        assert_eq!(*log.borrow(), vec![20]);

        subscription.unsubscribe();
        assert_eq!(emitter.observer_count(), 0);
    }

    #[test]
    fn stages_forward_errors_and_completion() {
        let emitter = LocalEmitter::<i32, String>::new();
        let filtered = emitter.clone().pipe(filter(|_: &i32| false));

        let errors = shared_log();
        let completed = shared_log();
        {
            let error_sink = Rc::clone(&errors);
            let complete_sink = Rc::clone(&completed);
            let _retained = filtered.subscribe_observer(
                Observer::new()
                    .on_error(move |error: &String| error_sink.borrow_mut().push(error.clone()))
                    .on_complete(move || complete_sink.borrow_mut().push("done")),
            );
        }

        emitter.emit(1); // Filtered out.
        emitter.error("boom".to_string());

        assert_eq!(*errors.borrow(), vec!["boom".to_string()]);
        assert!(completed.borrow().is_empty());
    }

    #[test]
    fn each_stage_subscription_is_independent() {
        let emitter = LocalEmitter::<i32>::new();
        let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));

        let first = evens.subscribe(|_| {});
        let second = evens.subscribe(|_| {});
        assert_eq!(emitter.observer_count(), 2);

        first.unsubscribe();
        assert_eq!(emitter.observer_count(), 1);

        second.unsubscribe();
        assert_eq!(emitter.observer_count(), 0);
    }

    #[test]
    fn stages_compose_with_deferred_delivery() {
        let scheduler = Rc::new(LocalScheduler::new());
        let emitter = LocalEmitter::<i32>::with_scheduler(Rc::clone(&scheduler) as _);
        let derived = emitter.clone().pipe(map(|value: &i32| value + 100));

        let log = shared_log();
        let sink = Rc::clone(&log);
        let _retained = derived.subscribe(move |value| sink.borrow_mut().push(*value));

        emitter.emit(1);
        assert!(log.borrow().is_empty());

        scheduler.run_until_idle();
        assert_eq!(*log.borrow(), vec![101]);
    }
}
