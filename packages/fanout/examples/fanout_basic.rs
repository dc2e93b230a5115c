//! Example demonstrating basic synchronous multicast.
//!
//! This example shows how a `LocalEmitter` fans values out to several
//! observers inline, how registrations are released, and how the terminal
//! state works.

use std::cell::RefCell;
use std::rc::Rc;

use fanout::{LocalEmitter, Observer};

fn main() {
    println!("=== Basic Fanout Example ===");

    // Example 1: Multicast to several observers.
    println!("\n1. Multicast to several observers:");
    let emitter = LocalEmitter::<i32>::new();

    let first = emitter.subscribe(|value| println!("  first observer saw {value}"));
    let second = emitter.subscribe(|value| println!("  second observer saw {value}"));

    emitter.emit(1);
    emitter.emit(2);
    println!("Currently registered: {}", emitter.observer_count());

    // Example 2: Releasing a registration.
    println!("\n2. Releasing a registration:");
    first.unsubscribe();
    emitter.emit(3); // Only the second observer sees this.
    println!("Currently registered: {}", emitter.observer_count());

    // Example 3: Full observers with error and completion handlers.
    println!("\n3. Full observers:");
    let emitter = LocalEmitter::<i32, String>::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let value_sink = Rc::clone(&log);
    let complete_sink = Rc::clone(&log);
    let _subscription = emitter.subscribe_observer(
        Observer::new()
            .on_next(move |value| value_sink.borrow_mut().push(format!("value {value}")))
            .on_error(|error: &String| println!("  error delivered: {error}"))
            .on_complete(move || complete_sink.borrow_mut().push("completed".to_string())),
    );

    emitter.emit(10);
    emitter.complete();
    println!("Observer log: {:?}", log.borrow());

    // Example 4: Terminal state is one-way.
    println!("\n4. Terminal state:");
    println!("Terminated: {}", emitter.is_terminated());
    emitter.emit(99); // Inert - the emitter already completed.
    println!("Registered after termination: {}", emitter.observer_count());

    drop(second);
    println!("\nBasic fanout example completed successfully!");
}
