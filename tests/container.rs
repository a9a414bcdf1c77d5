use slim_di::{DiError, Injectable, ServiceContainer, ServiceManager};
use std::sync::{Arc, Mutex};

struct Config {
    name: &'static str,
}
impl Injectable for Config {}

struct Telemetry;
impl Injectable for Telemetry {}

#[test]
fn test_add_and_get_service() {
    let container = ServiceContainer::new();
    container
        .add_service(Arc::new(Config { name: "app" }), false)
        .unwrap();

    let config = container.get_service::<Config>().unwrap().unwrap();
    assert_eq!(config.name, "app");

    // Repeated lookups return the registered instance.
    let again = container.get_service::<Config>().unwrap().unwrap();
    assert!(Arc::ptr_eq(&config, &again));
}

#[test]
fn test_get_service_for_unknown_type_fails() {
    let container = ServiceContainer::new();
    assert!(container.get_service::<Config>().is_err());
}

#[test]
fn test_callback_runs_lazily_and_once() {
    let calls = Arc::new(Mutex::new(0));
    let calls_clone = calls.clone();

    let container = ServiceContainer::new();
    container
        .add_service_with::<Telemetry, _>(
            move |_| {
                *calls_clone.lock().unwrap() += 1;
                Telemetry
            },
            false,
        )
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), 0);

    let a = container.get_service::<Telemetry>().unwrap().unwrap();
    let b = container.get_service::<Telemetry>().unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*calls.lock().unwrap(), 1); // singleton: built once
}

#[test]
fn test_promotion_registers_at_every_ancestor() {
    let root = ServiceManager::new();
    root.set_allow_scoped_modifications(true);
    let scope = root.create_scope();
    scope.set_allow_scoped_modifications(true);
    let inner = scope.create_scope();

    let container = ServiceContainer::with_manager(inner.clone());
    let instance = Arc::new(Config { name: "promoted" });
    container.add_service(instance.clone(), true).unwrap();

    // The whole ancestor chain resolves the same value.
    let from_inner = inner.get_required::<Config>();
    let from_scope = scope.get_required::<Config>();
    let from_root = root.get_required::<Config>();
    assert!(Arc::ptr_eq(&from_inner, &instance));
    assert!(Arc::ptr_eq(&from_scope, &instance));
    assert!(Arc::ptr_eq(&from_root, &instance));
}

#[test]
fn test_without_promotion_parents_stay_unaware() {
    let root = ServiceManager::new();
    root.set_allow_scoped_modifications(true);
    let scope = root.create_scope();

    let container = ServiceContainer::with_manager(scope.clone());
    container
        .add_service(Arc::new(Config { name: "local" }), false)
        .unwrap();

    assert!(scope.get::<Config>().is_ok());
    assert!(root.get::<Config>().is_err());
}

#[test]
fn test_remove_service_is_unsupported() {
    let container = ServiceContainer::new();
    container
        .add_service(Arc::new(Config { name: "app" }), false)
        .unwrap();

    match container.remove_service::<Config>() {
        Err(DiError::InvalidOperation(msg)) => assert!(msg.contains("not supported")),
        other => panic!("expected invalid operation, got {:?}", other),
    }

    // Only bulk clear exists on the underlying container.
    container.manager().clear().unwrap();
    assert!(container.get_service::<Config>().is_err());
}
