//! Example demonstrating deferred delivery through a cooperative scheduler.
//!
//! In deferred mode `emit` queues one delivery task per observer and returns
//! immediately; nothing reaches a handler until the scheduler is pumped.
//! Relative order between notifications from the same emitter is preserved.

use std::cell::RefCell;
use std::rc::Rc;

use fanout::{LocalEmitter, LocalScheduler};

fn main() {
    println!("=== Deferred Fanout Example ===");

    let scheduler = Rc::new(LocalScheduler::new());
    let emitter = LocalEmitter::<i32>::with_scheduler(Rc::clone(&scheduler) as _);

    let log = Rc::new(RefCell::new(Vec::new()));

    // Example 1: Deliveries wait for the scheduler.
    println!("\n1. Deliveries wait for the scheduler:");
    log.borrow_mut().push(1);
    let sink = Rc::clone(&log);
    let _subscription = emitter.subscribe(move |value| sink.borrow_mut().push(*value));

    emitter.emit(2);
    log.borrow_mut().push(3);
    println!("Before pumping: {:?} ({} task pending)", log.borrow(), scheduler.pending());

    let completed = scheduler.run_until_idle();
    println!("After pumping {completed} task(s): {:?}", log.borrow());

    // Example 2: Emission order is preserved across queued deliveries.
    println!("\n2. Emission order is preserved:");
    emitter.emit(4);
    emitter.emit(5);
    scheduler.run_until_idle();
    println!("Log: {:?}", log.borrow());

    // Example 3: Termination is deferred too.
    println!("\n3. Deferred termination:");
    emitter.emit(6);
    emitter.complete();
    println!("Terminated immediately: {}", emitter.is_terminated());
    println!("Registered observers: {}", emitter.observer_count());

    // The delivery of 6 was queued before complete(), so it still fires.
    scheduler.run_until_idle();
    println!("Final log: {:?}", log.borrow());

    println!("\nDeferred fanout example completed successfully!");
}
