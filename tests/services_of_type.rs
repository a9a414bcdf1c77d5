use slim_di::{Capability, Constructor, DiResult, Injectable, ServiceManager};
use std::sync::{Arc, Mutex};

trait Greeter: Send + Sync {
    fn language(&self) -> &'static str;
}

macro_rules! greeter {
    ($name:ident, $language:literal) => {
        struct $name;
        impl Greeter for $name {
            fn language(&self) -> &'static str {
                $language
            }
        }
        impl Injectable for $name {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![Constructor::new(|_| Ok($name))]
            }
            fn capabilities() -> Vec<Capability<Self>> {
                vec![Capability::of::<dyn Greeter>(|it| it)]
            }
        }
    };
}

greeter!(English, "en");
greeter!(French, "fr");
greeter!(German, "de");

#[test]
fn test_scan_yields_one_instance_per_matching_registration() {
    // Scenario: two singletons implementing the same capability.
    let manager = ServiceManager::new();
    manager.register_singleton_self::<English>().unwrap();
    manager.register_singleton_self::<French>().unwrap();

    let greeters: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();

    assert_eq!(greeters.len(), 2);
    let mut languages: Vec<_> = greeters.iter().map(|g| g.language()).collect();
    languages.sort();
    assert_eq!(languages, vec!["en", "fr"]);
}

#[test]
fn test_scan_respects_singleton_cache() {
    let builds = Arc::new(Mutex::new(0));
    let builds_clone = builds.clone();

    let manager = ServiceManager::new();
    manager
        .register_singleton_factory::<English, English, _>(move |_| {
            *builds_clone.lock().unwrap() += 1;
            English
        })
        .unwrap();

    let _ = manager.get_required::<English>();
    let scanned: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();

    assert_eq!(scanned.len(), 1);
    assert_eq!(*builds.lock().unwrap(), 1); // cache hit, no rebuild
}

#[test]
fn test_each_call_rescans_current_registrations() {
    let manager = ServiceManager::new();
    manager.register_singleton_self::<English>().unwrap();

    let first: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();
    assert_eq!(first.len(), 1);

    manager.register_singleton_self::<German>().unwrap();

    let second: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();
    assert_eq!(second.len(), 2);
}

#[test]
fn test_scan_matches_concrete_type() {
    let manager = ServiceManager::new();
    manager.register_singleton_self::<English>().unwrap();
    manager.register_singleton_self::<French>().unwrap();

    let english: Vec<Arc<English>> = manager
        .get_services_of_type::<English>()
        .collect::<DiResult<_>>()
        .unwrap();
    assert_eq!(english.len(), 1);
    assert!(Arc::ptr_eq(&english[0], &manager.get_required::<English>()));
}

#[test]
fn test_scan_sees_trait_keyed_registrations() {
    let manager = ServiceManager::new();
    manager.register_singleton_all::<English>().unwrap();

    // Registered against itself and against the declared capability; the
    // scan surfaces both entries, backed by one shared instance.
    let greeters: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();
    assert_eq!(greeters.len(), 2);

    let direct = manager.get_required::<dyn Greeter>();
    assert_eq!(direct.language(), "en");
}

#[test]
fn test_register_all_shares_one_instance() {
    let builds = Arc::new(Mutex::new(0));
    let builds_clone = builds.clone();

    let manager = ServiceManager::new();
    manager
        .register_singleton_all_factory::<English, _>(move |_| {
            *builds_clone.lock().unwrap() += 1;
            English
        })
        .unwrap();

    let as_trait = manager.get_required::<dyn Greeter>();
    let as_self = manager.get_required::<English>();

    assert_eq!(as_trait.language(), "en");
    assert_eq!(as_self.language(), "en");
    assert_eq!(*builds.lock().unwrap(), 1); // one cached instance behind both
}

#[test]
fn test_scan_with_no_matches_is_empty() {
    let manager = ServiceManager::new();
    let greeters: Vec<Arc<dyn Greeter>> = manager
        .get_services_of_type::<dyn Greeter>()
        .collect::<DiResult<_>>()
        .unwrap();
    assert!(greeters.is_empty());
}
