use slim_di::{
    erase_service, AnyService, Constructor, DependencyResolver, DiResult, Injectable, Key,
    ServiceManager,
};
use std::sync::{Arc, Mutex};

struct Token {
    issued_by: &'static str,
}
impl Injectable for Token {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Token {
            issued_by: "constructor",
        }))]
    }
}

struct TokenResolver {
    label: &'static str,
    calls: Arc<Mutex<usize>>,
}

impl DependencyResolver for TokenResolver {
    fn can_resolve(&self, key: &Key) -> bool {
        key.is::<Token>()
    }

    fn resolve(&self, _manager: &ServiceManager, _key: &Key) -> DiResult<AnyService> {
        *self.calls.lock().unwrap() += 1;
        Ok(erase_service(Arc::new(Token {
            issued_by: self.label,
        })))
    }
}

fn counting_resolver(label: &'static str) -> (Arc<TokenResolver>, Arc<Mutex<usize>>) {
    let calls = Arc::new(Mutex::new(0));
    (
        Arc::new(TokenResolver {
            label,
            calls: calls.clone(),
        }),
        calls,
    )
}

#[test]
fn test_resolver_supplies_unregistered_type() {
    let (resolver, calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    manager.register_resolver(resolver).unwrap();

    // No registration backs the type, so nothing is ever cached.
    let a = manager.get_required::<Token>();
    let b = manager.get_required::<Token>();

    assert_eq!(a.issued_by, "resolver");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn test_resolver_wins_over_registration() {
    let (resolver, calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    manager.register_transient_self::<Token>().unwrap();
    manager.register_resolver(resolver).unwrap();

    // Transient registration: the resolver runs again on every request.
    let a = manager.get_required::<Token>();
    let b = manager.get_required::<Token>();

    assert_eq!(a.issued_by, "resolver");
    assert_eq!(b.issued_by, "resolver");
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn test_resolver_output_cached_per_singleton_lifetime() {
    let (resolver, calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    manager.register_singleton_self::<Token>().unwrap();
    manager.register_resolver(resolver).unwrap();

    // Singleton registration: only the first call reaches the resolver.
    let a = manager.get_required::<Token>();
    let b = manager.get_required::<Token>();

    assert_eq!(a.issued_by, "resolver");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_first_matching_resolver_wins() {
    let (first, first_calls) = counting_resolver("first");
    let (second, second_calls) = counting_resolver("second");

    let manager = ServiceManager::new();
    manager.register_resolver(first).unwrap();
    manager.register_resolver(second).unwrap();

    let token = manager.get_required::<Token>();
    assert_eq!(token.issued_by, "first");
    assert_eq!(*first_calls.lock().unwrap(), 1);
    assert_eq!(*second_calls.lock().unwrap(), 0);
}

#[test]
fn test_resolver_claim_counts_as_registered() {
    let (resolver, _calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    assert!(!manager.is_registered::<Token>());

    manager.register_resolver(resolver).unwrap();
    assert!(manager.is_registered::<Token>());
}

#[test]
fn test_resolvers_copied_into_scopes() {
    let (resolver, calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    manager.register_resolver(resolver).unwrap();

    let scope = manager.create_scope();
    let token = scope.get_required::<Token>();

    assert_eq!(token.issued_by, "resolver");
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_read_only_scope_rejects_resolver_registration() {
    let (resolver, _calls) = counting_resolver("resolver");

    let manager = ServiceManager::new();
    let scope = manager.create_scope();

    assert!(scope.register_resolver(resolver).is_err());
}

#[test]
fn test_resolver_can_reenter_container() {
    struct Seed(u32);
    impl Injectable for Seed {}

    struct Derived(u32);
    impl Injectable for Derived {}

    struct DerivingResolver;
    impl DependencyResolver for DerivingResolver {
        fn can_resolve(&self, key: &Key) -> bool {
            key.is::<Derived>()
        }

        fn resolve(&self, manager: &ServiceManager, _key: &Key) -> DiResult<AnyService> {
            // Reentrant resolution through the requesting container.
            let seed = manager.resolve::<Seed>()?;
            Ok(erase_service(Arc::new(Derived(seed.0 * 2))))
        }
    }

    let manager = ServiceManager::new();
    manager
        .register_singleton_instance::<Seed, Seed>(Arc::new(Seed(21)))
        .unwrap();
    manager.register_resolver(Arc::new(DerivingResolver)).unwrap();

    let derived = manager.get_required::<Derived>();
    assert_eq!(derived.0, 42);
}
