#![no_main]

//! Fuzz target for registration and resolution
//!
//! Checks first-registration-wins, singleton identity and not-found behavior
//! against a simple model of what was registered.

use arbitrary::Arbitrary;
use inject_container::{ComponentKey, Container, Scope};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Service {
    marker: u32,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzScope {
    Singleton,
    Transient,
}

impl From<FuzzScope> for Scope {
    fn from(scope: FuzzScope) -> Self {
        match scope {
            FuzzScope::Singleton => Scope::Singleton,
            FuzzScope::Transient => Scope::Transient,
        }
    }
}

/// Operations to perform on the container
#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Register {
        tag: Option<u8>,
        scope: FuzzScope,
        marker: u32,
        fails: bool,
    },
    Resolve {
        tag: Option<u8>,
    },
    ResolveOptional {
        tag: Option<u8>,
    },
    Lock,
}

fn key(tag: Option<u8>) -> ComponentKey {
    match tag {
        Some(tag) => ComponentKey::tagged::<Service>(u32::from(tag)),
        None => ComponentKey::of::<Service>(),
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();

    // tag -> (scope, marker, fails) of the first registration
    let mut model: HashMap<Option<u8>, (FuzzScope, u32, bool)> = HashMap::new();
    let mut singletons: HashMap<Option<u8>, Arc<Service>> = HashMap::new();

    for op in ops.into_iter().take(256) {
        match op {
            ContainerOp::Register {
                tag,
                scope,
                marker,
                fails,
            } => {
                if container.is_locked() {
                    continue;
                }
                let tag_value = key(tag).tag().cloned();
                container.register(tag_value, scope.into(), move || {
                    if fails {
                        Err("fuzz failure")
                    } else {
                        Ok(Service { marker })
                    }
                });
                model.entry(tag).or_insert((scope, marker, fails));
            }
            ContainerOp::Resolve { tag } => {
                let result = container.resolve_key::<Service>(&key(tag));
                match (model.get(&tag), result) {
                    (None, Err(err)) => assert!(err.is_not_found()),
                    (None, Ok(_)) => panic!("resolved an unregistered identity"),
                    (Some((_, _, true)), result) => assert!(result.is_err()),
                    (Some((scope, marker, false)), Ok(service)) => {
                        assert_eq!(service.marker, *marker);
                        if let FuzzScope::Singleton = scope {
                            let first = singletons.entry(tag).or_insert_with(|| Arc::clone(&service));
                            assert!(Arc::ptr_eq(first, &service));
                        }
                    }
                    (Some(_), Err(err)) => panic!("registered identity failed: {err}"),
                }
            }
            ContainerOp::ResolveOptional { tag } => {
                let result = container.resolve_optional_key::<Service>(&key(tag));
                match model.get(&tag) {
                    None => assert!(matches!(result, Ok(None))),
                    Some((_, _, true)) => assert!(result.is_err()),
                    Some(_) => assert!(matches!(result, Ok(Some(_)))),
                }
            }
            ContainerOp::Lock => container.lock(),
        }
    }

    assert_eq!(container.registered_keys().len(), model.len());
});
