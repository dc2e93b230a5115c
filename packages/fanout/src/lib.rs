//! Multicast event notification with synchronous and deferred delivery.
//!
//! This crate provides a small single-threaded notification primitive: a
//! [`LocalEmitter<T, E>`] fans every emitted value out to all currently
//! registered observers, in registration order, with a one-way terminal state
//! reached on the first error or completion. Registrations are released
//! through disposable [`Subscription`] handles, and sources compose with
//! pipeline stages ([`filter`], [`map`]) that preserve unsubscribe semantics
//! through any chain length.
//!
//! Delivery is either fully synchronous (every observer has been notified by
//! the time `emit` returns) or deferred through a cooperative scheduler
//! implementing [`Schedule`], such as [`LocalScheduler`]. Deferred means a
//! later turn of the same thread, never parallelism.
//!
//! # Synchronous Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use fanout::LocalEmitter;
//!
//! let emitter = LocalEmitter::<i32>::new();
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let subscription = emitter.subscribe(move |value| sink.borrow_mut().push(*value));
//!
//! emitter.emit(1);
//! emitter.emit(2);
//! assert_eq!(*log.borrow(), vec![1, 2]);
//!
//! subscription.unsubscribe();
//! assert_eq!(emitter.observer_count(), 0);
//! ```
//!
//! # Deferred Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use fanout::{LocalEmitter, LocalScheduler};
//!
//! let scheduler = Rc::new(LocalScheduler::new());
//! let emitter = LocalEmitter::<i32>::with_scheduler(Rc::clone(&scheduler) as _);
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let _subscription = emitter.subscribe(move |value| sink.borrow_mut().push(*value));
//!
//! emitter.emit(2);
//! log.borrow_mut().push(3);
//!
//! // Deliveries run on the next scheduler turn, in emission order.
//! scheduler.run_until_idle();
//! assert_eq!(*log.borrow(), vec![3, 2]);
//! ```
//!
//! # Pipeline Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use fanout::{LocalEmitter, SubscribableExt, filter};
//!
//! let emitter = LocalEmitter::<i32>::new();
//! let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let subscription = evens.subscribe(move |value| sink.borrow_mut().push(*value));
//!
//! emitter.emit(1);
//! emitter.emit(2);
//! assert_eq!(*log.borrow(), vec![2]);
//!
//! // Disposal propagates through the stage to the source registration.
//! subscription.unsubscribe();
//! assert_eq!(emitter.observer_count(), 0);
//! ```

mod emitter;
mod observer;
mod operators;
mod registry;
mod scheduler;
mod source;
mod subscription;

pub use emitter::*;
pub use observer::*;
pub use operators::*;
pub use scheduler::*;
pub use source::*;
pub use subscription::*;
