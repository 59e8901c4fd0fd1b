mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use probe_core::{Accessible, Member, Modifiers, Structure, Value};
use probe_resolve::{CacheRef, Reflector};

#[test]
fn test_same_key_resolves_once() {
    common::init_tracing();
    let loader = Arc::new(common::CountingLoader::new(common::loader()));
    let reflector = Reflector::new(loader.clone());
    let threads = 16;
    let barrier = Barrier::new(threads);

    let handles: Vec<_> = thread::scope(|s| {
        let barrier = &barrier;
        let reflector = &reflector;
        let spawned: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move || {
                    barrier.wait();
                    reflector
                        .resolve_attribute("app.Widget", Some("count"), None, Modifiers::empty())
                        .unwrap()
                })
            })
            .collect();
        spawned.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(handles.iter().all(|h| CacheRef::ptr_eq(h, &handles[0])));
    assert_eq!(loader.loads(), 1);
    let stats = reflector.stats();
    assert_eq!(stats.fields.misses, 1);
    assert_eq!(stats.fields.hits, threads as u64 - 1);
}

#[test]
fn test_shared_handle_across_threads() {
    let (loader, reflector) = common::reflector();
    let widget = reflector
        .resolve_constructor("app.Widget", None, Modifiers::empty())
        .unwrap()
        .construct_default()
        .unwrap();
    let bump = reflector
        .resolve_operation("app.Widget", Some("bump"), None, None, Modifiers::empty())
        .unwrap();

    thread::scope(|s| {
        for _ in 0..8 {
            let (bump, widget) = (&bump, &widget);
            s.spawn(move || {
                for _ in 0..10 {
                    bump.invoke(widget, &[]).unwrap();
                }
            });
        }
    });

    let count = reflector
        .resolve_attribute("app.Widget", Some("count"), None, Modifiers::empty())
        .unwrap();
    // Bump is an unsynchronized read-modify-write, so updates may be lost.
    assert!(matches!(count.read(&widget).unwrap(), Value::Int(n) if n > 0));

    // Every overlapping invocation has left; the member is back at its baseline.
    let class = loader.defined("app.Widget").unwrap();
    let method = class
        .declared_methods()
        .into_iter()
        .find(|m| m.name() == "bump")
        .unwrap();
    assert!(!method.is_accessible());
}

#[test]
fn test_distinct_keys_resolve_in_parallel() {
    let (_loader, reflector) = common::reflector();
    thread::scope(|s| {
        for name in ["x", "y"] {
            let reflector = &reflector;
            s.spawn(move || {
                for _ in 0..50 {
                    let field = reflector
                        .resolve_attribute("geo.Point", Some(name), None, Modifiers::empty())
                        .unwrap();
                    assert_eq!(field.name(), name);
                }
            });
        }
    });
}
