//! Integration tests for signals and stores used across threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use inflight_core::{Readable, Signal, StopHandle, Writable};
use parking_lot::Mutex;

#[test]
fn test_writable_shared_between_threads() {
    let store = Writable::new(0usize);
    let last = Arc::new(Mutex::new(0usize));

    let last_clone = last.clone();
    let _sub = store.subscribe(move |&v| {
        let mut last = last_clone.lock();
        // Serialized notification keeps delivery monotonic.
        assert!(v >= *last);
        *last = v;
    });

    let mut handles = vec![];
    for _ in 0..4 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..250 {
                store.update(|v| *v += 1);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get(), 1000);
    assert_eq!(*last.lock(), 1000);
}

#[test]
fn test_derived_chain_counts_each_change_once() {
    let source = Writable::new(Vec::<u8>::new());
    let count = Readable::derived(&source, |v: &Vec<u8>| v.len());
    let notifications = Arc::new(AtomicUsize::new(0));

    let notifications_clone = notifications.clone();
    let sub = count.subscribe(move |_| {
        notifications_clone.fetch_add(1, Ordering::SeqCst);
    });

    for byte in 0..10u8 {
        source.update(|v| v.push(byte));
    }

    // One initial delivery plus one per length change.
    assert_eq!(notifications.load(Ordering::SeqCst), 11);
    assert_eq!(count.get(), 10);
    sub.unsubscribe();
    assert_eq!(source.subscriber_count(), 0);
}

#[test]
fn test_many_subscribers_start_feed_once() {
    let starts = Arc::new(AtomicUsize::new(0));
    let starts_clone = starts.clone();
    let readable = Readable::new(false, move |set| {
        starts_clone.fetch_add(1, Ordering::SeqCst);
        set.set(true);
        StopHandle::noop()
    });

    let subs: Vec<_> = (0..16).map(|_| readable.subscribe(|&v| assert!(v))).collect();
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(readable.subscriber_count(), 16);

    drop(subs);
    assert_eq!(readable.subscriber_count(), 0);
    assert!(!readable.is_started());
}

#[test]
fn test_signal_clone_shares_connections() {
    let signal = Signal::<&'static str>::new();
    let clone = signal.clone();
    let received = Arc::new(Mutex::new(Vec::new()));

    let received_clone = received.clone();
    signal.connect(move |s| received_clone.lock().push(*s));

    clone.emit("from clone");
    assert_eq!(*received.lock(), vec!["from clone"]);
    assert_eq!(clone.connection_count(), 1);
}
