//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use inject_container::{Container, DiError, LazyInject, OptionalInject, Scope};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
}

#[allow(dead_code)]
struct RequestContext {
    request_id: u64,
}

struct Metrics;

fn main() {
    inject_container::logging::init();

    println!("=== Inject Container Logging Demo ===\n");

    // logs: "Creating new container"
    let container = Container::new();

    // logs: "Registered component" (x4, the last one shadowed)
    container.singleton_tagged("primary", || Database {
        url: "postgres://localhost/mydb".into(),
    });
    container.transient(|| RequestContext {
        request_id: NEXT_REQUEST.fetch_add(1, Ordering::SeqCst),
    });

    let c = container.clone();
    container.register(None, Scope::Singleton, move || {
        println!("  [App] UserService being constructed...");
        Ok::<_, DiError>(UserService {
            db: c.resolve_tagged::<Database>("primary")?,
        })
    });
    container.singleton_tagged("primary", || Database {
        url: "postgres://shadowed/never-used".into(),
    });

    // logs: "Container locked"
    container.lock();

    // logs: "Constructed singleton" for UserService and its Database
    let _users = container.resolve::<UserService>().unwrap();
    // logs: "Singleton resolved from cache"
    let _users_again = container.resolve::<UserService>().unwrap();

    // logs: "Invoking component factory" on each call
    let _r1 = container.resolve::<RequestContext>().unwrap();
    let _r2 = container.resolve::<RequestContext>().unwrap();

    // logs: "Component not found"
    let missing = container.try_resolve::<Metrics>();
    assert!(missing.is_none());

    // logs: "Lazy handle resolving on first access", then "already resolved"
    let lazy = LazyInject::<UserService>::new(&container);
    let _ = lazy.get().unwrap();
    let _ = lazy.get().unwrap();

    // Absence tolerated: resolves to None
    let metrics = OptionalInject::<Metrics>::new(&container);
    assert!(metrics.get().unwrap().is_none());

    // logs: "Rejected registration on locked container"
    let rejected = container.try_register_descriptor(inject_container::ComponentDescriptor::new(
        None,
        Scope::Singleton,
        || Metrics,
    ));
    assert!(rejected.is_err());

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
