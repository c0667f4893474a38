#![no_main]

//! Fuzz target for concurrent container operations
//!
//! Many threads race on first resolution of singletons and lazy handles;
//! every factory must run at most once.

use arbitrary::Arbitrary;
use inject_container::{Container, LazyInject};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

struct SharedConfig {
    value: u32,
}

struct Tagged {
    tag: u8,
}

/// Thread operation
#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    Resolve,
    ResolveTagged(u8),
    Lazy,
    Optional,
    Contains,
}

/// Concurrent test scenario
#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    // Tags to register Tagged singletons under (clamped)
    tags: Vec<u8>,
    // Number of threads (clamped to 1-8)
    thread_count: u8,
    // Operations per thread (clamped)
    ops_per_thread: Vec<ThreadOp>,
    value: u32,
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let container = Container::new();
    let constructions = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&constructions);
    let value = scenario.value;
    container.singleton(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        SharedConfig { value }
    });

    let mut registered: Vec<u8> = Vec::new();
    for tag in scenario.tags.into_iter().take(10) {
        if !registered.contains(&tag) {
            registered.push(tag);
        }
        let counter = Arc::clone(&constructions);
        container.singleton_tagged(u32::from(tag), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Tagged { tag }
        });
    }
    container.lock();

    let lazy = Arc::new(LazyInject::<SharedConfig>::new(&container));

    // Clamp thread count
    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops = scenario.ops_per_thread;

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let container = container.clone();
            let lazy = Arc::clone(&lazy);
            let ops = ops.clone();

            thread::spawn(move || {
                for op in ops.into_iter().take(50) {
                    match op {
                        ThreadOp::Resolve => {
                            let config = container.resolve::<SharedConfig>().unwrap();
                            assert_eq!(config.value, value);
                        }
                        ThreadOp::ResolveTagged(tag) => {
                            match container.resolve_tagged::<Tagged>(u32::from(tag)) {
                                Ok(tagged) => assert_eq!(tagged.tag, tag),
                                Err(err) => assert!(err.is_not_found()),
                            }
                        }
                        ThreadOp::Lazy => {
                            assert_eq!(lazy.get().unwrap().value, value);
                        }
                        ThreadOp::Optional => {
                            let missing = container.resolve_optional::<Tagged>().unwrap();
                            assert!(missing.is_none());
                        }
                        ThreadOp::Contains => {
                            assert!(container.contains::<SharedConfig>());
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // One SharedConfig plus at most one per distinct tag
    assert!(constructions.load(Ordering::SeqCst) <= 1 + registered.len());
    assert!(container.cached_count() <= 1 + registered.len());
});
