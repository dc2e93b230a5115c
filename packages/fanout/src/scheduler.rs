//! Cooperative task scheduling for deferred delivery.
//!
//! Deferred mode does not mean parallelism: a deferred delivery runs on a
//! later turn of a single-threaded cooperative scheduler, in the order it
//! was submitted. The [`Schedule`] trait is the only contract an emitter
//! needs; [`LocalScheduler`] is the queue-backed implementation used by the
//! tests and examples, and anything that runs closures later in FIFO order
//! can stand in for it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use scopeguard::defer;
use tracing::trace;

/// A cooperative scheduling contract: run a closure on a later turn,
/// preserving submission order.
///
/// Implementations must guarantee FIFO execution relative to submission
/// order from a single thread. No thread-safety is required; everything in
/// this crate is single-threaded.
pub trait Schedule {
    /// Enqueues a task to run on a later turn of the scheduler.
    fn schedule(&self, task: Box<dyn FnOnce()>);
}

/// A FIFO queue of pending tasks, drained on demand.
///
/// Whoever owns the scheduler decides when a "later turn" happens by
/// calling [`run_until_idle`][Self::run_until_idle]. Tasks scheduled while
/// a drain is in progress join the same drain, which is what preserves
/// relative ordering between deliveries queued from inside other
/// deliveries.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use fanout::{LocalScheduler, Schedule};
///
/// let scheduler = LocalScheduler::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// for label in ["first", "second"] {
///     let log = Rc::clone(&log);
///     scheduler.schedule(Box::new(move || log.borrow_mut().push(label)));
/// }
///
/// assert_eq!(log.borrow().len(), 0); // Nothing runs until the queue is pumped.
/// assert_eq!(scheduler.run_until_idle(), 2);
/// assert_eq!(*log.borrow(), vec!["first", "second"]);
/// ```
pub struct LocalScheduler {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    draining: Cell<bool>,
}

impl LocalScheduler {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
        }
    }

    /// The number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs queued tasks in submission order until the queue is empty,
    /// returning how many ran.
    ///
    /// Tasks scheduled while draining run in the same drain. A re-entrant
    /// call from inside a task returns 0 immediately rather than recursing
    /// into the queue.
    ///
    /// # Panics
    ///
    /// If a task panics, the panic propagates to the caller. The remaining
    /// tasks stay queued and a later call resumes where the drain stopped.
    pub fn run_until_idle(&self) -> usize {
        if self.draining.replace(true) {
            return 0;
        }
        defer! {
            self.draining.set(false);
        }

        let mut completed = 0_usize;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };

            task();
            completed = completed.saturating_add(1);
        }

        trace!(completed, "scheduler drained");
        completed
    }
}

impl Schedule for LocalScheduler {
    fn schedule(&self, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(task);
        trace!(pending = self.pending(), "task scheduled");
    }
}

impl Default for LocalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalScheduler")
            .field("pending", &self.pending())
            .field("draining", &self.draining.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::assert_not_impl_any;

    use super::*;

    #[test]
    fn tasks_run_in_submission_order() {
        let scheduler = LocalScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for value in 1..=3 {
            let log = Rc::clone(&log);
            scheduler.schedule(Box::new(move || log.borrow_mut().push(value)));
        }

        let completed = scheduler.run_until_idle();

        assert_eq!(completed, 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn nothing_runs_before_the_queue_is_pumped() {
        let scheduler = LocalScheduler::new();
        let ran = Rc::new(Cell::new(false));

        let flag = Rc::clone(&ran);
        scheduler.schedule(Box::new(move || flag.set(true)));

        assert!(!ran.get());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn tasks_scheduled_while_draining_join_the_same_drain() {
        let scheduler = Rc::new(LocalScheduler::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        {
            let inner_scheduler = Rc::clone(&scheduler);
            let outer_log = Rc::clone(&log);
            scheduler.schedule(Box::new(move || {
                outer_log.borrow_mut().push("outer");
                let log = Rc::clone(&outer_log);
                inner_scheduler.schedule(Box::new(move || log.borrow_mut().push("nested")));
            }));
        }

        let completed = scheduler.run_until_idle();

        assert_eq!(completed, 2);
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn reentrant_drain_is_a_no_op() {
        let scheduler = Rc::new(LocalScheduler::new());
        let inner_completed = Rc::new(Cell::new(usize::MAX));

        {
            let inner_scheduler = Rc::clone(&scheduler);
            let inner_completed = Rc::clone(&inner_completed);
            scheduler.schedule(Box::new(move || {
                inner_completed.set(inner_scheduler.run_until_idle());
            }));
        }

        let completed = scheduler.run_until_idle();

        assert_eq!(completed, 1);
        assert_eq!(inner_completed.get(), 0);
    }

    #[test]
    fn panicking_task_leaves_rest_of_queue_intact() {
        let scheduler = LocalScheduler::new();
        let survivor_ran = Rc::new(Cell::new(false));

        scheduler.schedule(Box::new(|| panic!("task fault")));
        {
            let flag = Rc::clone(&survivor_ran);
            scheduler.schedule(Box::new(move || flag.set(true)));
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| scheduler.run_until_idle()));
        assert!(outcome.is_err());
        assert!(!survivor_ran.get());
        assert_eq!(scheduler.pending(), 1);

        // The drain flag was restored, so pumping again picks up the rest.
        assert_eq!(scheduler.run_until_idle(), 1);
        assert!(survivor_ran.get());
    }

    #[test]
    fn single_threaded_type() {
        assert_not_impl_any!(LocalScheduler: Send, Sync);
    }
}
