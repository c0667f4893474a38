//! # Inject Container - Dependency Resolution for Rust
//!
//! A registry that maps a component identity (a type, optionally qualified
//! by a tag) to a factory, and resolves instances on demand according to
//! the component's scope.
//!
//! ## Features
//!
//! - 🔑 **Tagged identities** - Register several components of one type under different tags
//! - 🏭 **Singletons** - Constructed on first resolution, exactly once, even under contention
//! - ♻️ **Transients** - Fresh instance on every resolve
//! - 💤 **Lazy handles** - Resolve on first access, memoized once across threads
//! - 🧯 **Typed errors** - Missing registrations and failing factories are distinct errors
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use inject_container::Container;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//!
//! container.singleton(|| Database { url: "postgres://localhost".into() });
//!
//! let c = container.clone();
//! container.register(None, inject_container::Scope::Singleton, move || {
//!     Ok::<_, inject_container::DiError>(UserService { db: c.resolve::<Database>()? })
//! });
//!
//! let users = container.resolve::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```
//!
//! ## Injection Handles
//!
//! ```rust
//! use inject_container::{Container, Inject, LazyInject, OptionalInject};
//!
//! struct Config { debug: bool }
//! struct Metrics;
//!
//! let container = Container::new();
//! container.singleton(|| Config { debug: true });
//!
//! // Eager - resolved now, fails now
//! let config = Inject::<Config>::new(&container).unwrap();
//! assert!(config.debug);
//!
//! // Lazy - resolved on first access
//! let lazy = LazyInject::<Config>::new(&container);
//! assert!(lazy.get().unwrap().debug);
//!
//! // Optional - a missing registration is `None`, not an error
//! let metrics = OptionalInject::<Metrics>::new(&container);
//! assert!(metrics.get().unwrap().is_none());
//! ```
//!
//! ## Wiring Discipline
//!
//! Register everything up front, then [`Container::lock`] so that late
//! registrations fail loudly. Resolve required dependencies eagerly at
//! wiring time so a missing registration surfaces at startup.

mod cell;
mod container;
mod descriptor;
mod error;
mod inject;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod storage;

pub use cell::*;
pub use container::*;
pub use descriptor::*;
pub use error::*;
pub use inject::*;
pub use key::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ComponentDescriptor, ComponentKey, Container, DiError, Inject, LazyInject,
        OptionalInject, Result, Scope, Tag,
    };
    pub use std::sync::Arc;
}
