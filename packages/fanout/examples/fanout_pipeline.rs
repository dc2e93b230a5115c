//! Example demonstrating pipeline stages over an emitter.
//!
//! Stages wrap a source and derive a new one; subscribing through a chain
//! holds exactly one registration on the original emitter, and disposing the
//! derived subscription releases it, however many stages sit in between.

use std::cell::RefCell;
use std::rc::Rc;

use fanout::{LocalEmitter, SubscribableExt, filter, map};

fn main() {
    println!("=== Fanout Pipeline Example ===");

    let emitter = LocalEmitter::<i32>::new();

    // Example 1: A single filter stage.
    println!("\n1. Filtering:");
    let evens = emitter.clone().pipe(filter(|value: &i32| value % 2 == 0));

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let subscription = evens.subscribe(move |value| sink.borrow_mut().push(*value));

    for value in 1..=6 {
        emitter.emit(value);
    }
    println!("Even values seen: {:?}", log.borrow());

    // Example 2: Chained stages.
    println!("\n2. Chained stages:");
    let labeled = emitter
        .clone()
        .pipe(filter(|value: &i32| *value > 0))
        .pipe(map(|value: &i32| format!("#{value}")));

    let labels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&labels);
    let chained = labeled.subscribe(move |label| sink.borrow_mut().push(label.clone()));

    println!(
        "Source registrations (one per chain, one from example 1): {}",
        emitter.observer_count()
    );

    emitter.emit(-1);
    emitter.emit(7);
    println!("Labels seen: {:?}", labels.borrow());

    // Example 3: Disposal propagates through the whole chain.
    println!("\n3. Disposal through the chain:");
    chained.unsubscribe();
    subscription.unsubscribe();
    println!("Source registrations after disposal: {}", emitter.observer_count());

    println!("\nFanout pipeline example completed successfully!");
}
