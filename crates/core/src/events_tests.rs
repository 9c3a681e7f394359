// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use std::sync::atomic::AtomicUsize;

fn removed(id: &str) -> QueueEvent {
    QueueEvent::Removed { id: id.to_string() }
}

#[test]
fn listeners_receive_events_until_removed() {
    let listeners = Listeners::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let id = listeners.add(move |event| {
        sink.lock().unwrap().push(event.operation_id().to_string());
    });

    listeners.emit(&removed("op-1"));
    assert!(listeners.remove(id));
    assert!(!listeners.remove(id));
    listeners.emit(&removed("op-2"));

    assert_eq!(*seen.lock().unwrap(), vec!["op-1".to_string()]);
    assert!(listeners.is_empty());
}

#[test]
fn panicking_listener_does_not_stop_delivery() {
    let listeners = Listeners::new();
    let count = Arc::new(AtomicUsize::new(0));

    listeners.add(|_| panic!("listener failure"));
    let counter = Arc::clone(&count);
    listeners.add(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    listeners.emit(&removed("op-1"));
    listeners.emit(&removed("op-2"));

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(listeners.len(), 2);
}

#[test]
fn listener_can_unregister_itself() {
    let listeners = Arc::new(Listeners::new());
    let own_id = Arc::new(Mutex::new(None));

    let registry = Arc::clone(&listeners);
    let slot = Arc::clone(&own_id);
    let id = listeners.add(move |_| {
        if let Some(id) = *slot.lock().unwrap() {
            registry.remove(id);
        }
    });
    *own_id.lock().unwrap() = Some(id);

    listeners.emit(&removed("op-1"));
    assert!(listeners.is_empty());
}
