//! Normalized observer sinks.
//!
//! Subscribers arrive in several shapes: a bare value callback, a full
//! three-capability sink, or another emitter acting as a sink. All of them
//! are normalized at subscribe time into an [`Observer`], with absent
//! capabilities defaulting to no-ops, so delivery code has a single uniform
//! shape to work with.

use std::fmt;

/// A sink for the notifications of one subscription.
///
/// Carries up to three handlers: a value handler, an error handler and a
/// completion handler. Any subset may be present; a missing handler silently
/// ignores its notification. Handlers receive values and errors by shared
/// reference, so one notification can fan out to many observers without
/// cloning the payload.
///
/// The invocation methods ([`next`][Self::next], [`error`][Self::error],
/// [`complete`][Self::complete]) are public so that externally authored
/// sources can drive an observer directly.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use fanout::Observer;
///
/// let seen = Rc::new(Cell::new(0));
/// let seen_by_observer = Rc::clone(&seen);
///
/// let observer = Observer::<i32, String>::new()
///     .on_next(move |value| seen_by_observer.set(*value))
///     .on_complete(|| println!("done"));
///
/// observer.next(&42);
/// assert_eq!(seen.get(), 42);
///
/// // No error handler was attached - this is a no-op, not a fault.
/// observer.error(&"ignored".to_string());
/// ```
pub struct Observer<T, E = ()> {
    next: Option<Box<dyn Fn(&T)>>,
    error: Option<Box<dyn Fn(&E)>>,
    complete: Option<Box<dyn Fn()>>,
}

impl<T, E> Observer<T, E> {
    /// Creates an observer with no handlers attached.
    ///
    /// Every notification is a no-op until handlers are attached via
    /// [`on_next`][Self::on_next], [`on_error`][Self::on_error] or
    /// [`on_complete`][Self::on_complete].
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// Creates an observer from a bare value callback.
    ///
    /// This is the shorthand for the most common subscriber shape: only
    /// interested in values, ignoring errors and completion.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fanout::Observer;
    ///
    /// let observer = Observer::<u64>::from_next(|value| println!("{value}"));
    /// observer.next(&123);
    /// ```
    #[must_use]
    pub fn from_next<F>(next: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self::new().on_next(next)
    }

    /// Attaches the value handler, replacing any previous one.
    #[must_use]
    pub fn on_next<F>(mut self, next: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        self.next = Some(Box::new(next));
        self
    }

    /// Attaches the error handler, replacing any previous one.
    #[must_use]
    pub fn on_error<F>(mut self, error: F) -> Self
    where
        F: Fn(&E) + 'static,
    {
        self.error = Some(Box::new(error));
        self
    }

    /// Attaches the completion handler, replacing any previous one.
    #[must_use]
    pub fn on_complete<F>(mut self, complete: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.complete = Some(Box::new(complete));
        self
    }

    /// Delivers a value to the value handler, if one is attached.
    pub fn next(&self, value: &T) {
        if let Some(next) = &self.next {
            next(value);
        }
    }

    /// Delivers an error to the error handler, if one is attached.
    ///
    /// An observer without an error handler drops the error silently rather
    /// than raising it as an unhandled fault.
    pub fn error(&self, error: &E) {
        if let Some(handler) = &self.error {
            handler(error);
        }
    }

    /// Delivers the completion notification, if a handler is attached.
    pub fn complete(&self) {
        if let Some(complete) = &self.complete {
            complete();
        }
    }
}

impl<T, E> Default for Observer<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Observer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("next", &self.next.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use static_assertions::assert_not_impl_any;

    use super::*;

    #[test]
    fn empty_observer_ignores_all_notifications() {
        let observer = Observer::<i32, String>::new();

        observer.next(&1);
        observer.error(&"boom".to_string());
        observer.complete();
    }

    #[test]
    fn from_next_delivers_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let observer = Observer::<i32>::from_next(move |value| sink.borrow_mut().push(*value));

        observer.next(&1);
        observer.next(&2);

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn all_three_handlers_receive_their_notifications() {
        let nexts = Rc::new(Cell::new(0_usize));
        let errors = Rc::new(Cell::new(0_usize));
        let completions = Rc::new(Cell::new(0_usize));

        let observer = {
            let nexts = Rc::clone(&nexts);
            let errors = Rc::clone(&errors);
            let completions = Rc::clone(&completions);

            Observer::<i32, String>::new()
                .on_next(move |_| nexts.set(nexts.get().saturating_add(1)))
                .on_error(move |_| errors.set(errors.get().saturating_add(1)))
                .on_complete(move || completions.set(completions.get().saturating_add(1)))
        };

        observer.next(&1);
        observer.next(&2);
        observer.error(&"boom".to_string());
        observer.complete();

        assert_eq!(nexts.get(), 2);
        assert_eq!(errors.get(), 1);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn later_handler_replaces_earlier_one() {
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);

        let observer = Observer::<i32>::new()
            .on_next(|_| panic!("replaced handler must not run"))
            .on_next(move |value| sink.set(*value));

        observer.next(&7);

        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn debug_reports_attached_capabilities() {
        let observer = Observer::<i32>::from_next(|_| {});
        let rendered = format!("{observer:?}");

        assert!(rendered.contains("next: true"));
        assert!(rendered.contains("complete: false"));
    }

    #[test]
    fn single_threaded_type() {
        assert_not_impl_any!(Observer<u32, String>: Send, Sync);
    }
}
