//! The service manager: registration store, resolution engine, instance
//! cache, exception interception and disposal ownership.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use crate::error::{DiError, DiResult, ErrorKind};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{
    erase_service, unerase, AnyService, Registration, ServiceFactory,
};
use crate::traits::{DependencyResolver, Implements, Injectable};

mod scope;

/// Handler consulted when an error of its kind is intercepted. Returning
/// `true` rethrows the error; returning `false` swallows it.
pub type ExceptionHandler = Arc<dyn Fn(&ServiceManager, &DiError) -> bool + Send + Sync>;

pub(crate) struct ManagerState {
    pub(crate) mappings: HashMap<Key, Vec<Registration>>,
    pub(crate) instances: HashMap<Key, AnyService>,
    pub(crate) factories: HashMap<Key, Vec<ServiceFactory>>,
    pub(crate) handlers: HashMap<ErrorKind, ExceptionHandler>,
    pub(crate) resolvers: Vec<Arc<dyn DependencyResolver>>,
    pub(crate) disposed: bool,
}

impl ManagerState {
    fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            instances: HashMap::new(),
            factories: HashMap::new(),
            handlers: HashMap::new(),
            resolvers: Vec::new(),
            disposed: false,
        }
    }
}

struct ManagerInner {
    // Reentrant: user factories and resolvers run under the container lock
    // and are allowed to call back into the same container.
    state: ReentrantMutex<RefCell<ManagerState>>,
    parent: Option<ServiceManager>,
    scoped: bool,
    read_only: bool,
    allow_scoped_modifications: AtomicBool,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().get_mut();
        if !state.disposed && !state.instances.is_empty() {
            warn!("service manager dropped with undisposed cached instances; call dispose() for deterministic cleanup");
        }
    }
}

/// The service container: stores registrations and resolves services.
///
/// `ServiceManager` is a cheaply clonable handle; clones share the same
/// underlying container. It is thread-safe: each mutation and each top-level
/// resolution is atomic relative to other calls on the same container, while
/// reentrant calls from inside user factories and resolvers are supported.
///
/// # Examples
///
/// ```rust
/// use slim_di::{Constructor, Injectable, ServiceManager};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// impl Injectable for Database {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Database { url: "postgres://localhost".into() }))]
///     }
/// }
///
/// struct UserService { db: Arc<Database> }
/// impl Injectable for UserService {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|sm| Ok(UserService { db: sm.resolve::<Database>()? }))]
///     }
/// }
///
/// let manager = ServiceManager::new();
/// manager.register_singleton_self::<Database>().unwrap();
/// manager.register_transient_self::<UserService>().unwrap();
///
/// let service = manager.get_required::<UserService>();
/// assert_eq!(service.db.url, "postgres://localhost");
/// ```
pub struct ServiceManager {
    inner: Arc<ManagerInner>,
}

impl Clone for ServiceManager {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    /// Creates an empty root container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                state: ReentrantMutex::new(RefCell::new(ManagerState::new())),
                parent: None,
                scoped: false,
                read_only: false,
                allow_scoped_modifications: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn scope_of(parent: ServiceManager, state: ManagerState, read_only: bool) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                state: ReentrantMutex::new(RefCell::new(state)),
                parent: Some(parent),
                scoped: true,
                read_only,
                allow_scoped_modifications: AtomicBool::new(false),
            }),
        }
    }

    /// The container that created this one through
    /// [`create_scope`](Self::create_scope); `None` on roots.
    pub fn parent(&self) -> Option<ServiceManager> {
        self.inner.parent.clone()
    }

    /// True when this container rejects registrations. Scopes are read-only
    /// unless their creator had
    /// [`set_allow_scoped_modifications`](Self::set_allow_scoped_modifications)
    /// enabled at creation time.
    pub fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    /// Whether scopes created from this container accept registrations.
    pub fn allow_scoped_modifications(&self) -> bool {
        self.inner.allow_scoped_modifications.load(Ordering::Relaxed)
    }

    /// Allow or forbid modifications on scopes created from this container
    /// after this call.
    pub fn set_allow_scoped_modifications(&self, allow: bool) {
        self.inner
            .allow_scoped_modifications
            .store(allow, Ordering::Relaxed);
    }

    pub(crate) fn is_scope(&self) -> bool {
        self.inner.scoped
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ManagerState) -> R) -> R {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    // ----- Registration API -----

    /// Registers `C` as the Singleton implementation of `S`.
    ///
    /// Duplicate registrations for the same requested type coexist; the
    /// first one is the primary resolution target.
    pub fn register_singleton<S, C>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Singleton, None)
    }

    /// Registers `C` as the Scoped implementation of `S`.
    pub fn register_scoped<S, C>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Scoped, None)
    }

    /// Registers `C` as the Transient implementation of `S`.
    pub fn register_transient<S, C>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Transient, None)
    }

    /// Registers `C` for `S` with a Singleton lifetime and a factory that
    /// replaces constructor discovery entirely.
    pub fn register_singleton_factory<S, C, F>(&self, factory: F) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service::<S, C>(Lifetime::Singleton, Some(Self::erase_factory(factory)))
    }

    /// Registers `C` for `S` with a Scoped lifetime and a factory.
    pub fn register_scoped_factory<S, C, F>(&self, factory: F) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service::<S, C>(Lifetime::Scoped, Some(Self::erase_factory(factory)))
    }

    /// Registers `C` for `S` with a Transient lifetime and a factory.
    pub fn register_transient_factory<S, C, F>(&self, factory: F) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service::<S, C>(Lifetime::Transient, Some(Self::erase_factory(factory)))
    }

    /// Registers an existing instance as the Singleton implementation of `S`.
    pub fn register_singleton_instance<S, C>(&self, value: Arc<C>) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Singleton, Some(Self::erase_instance(value)))
    }

    /// Registers an existing instance as the Scoped implementation of `S`.
    pub fn register_scoped_instance<S, C>(&self, value: Arc<C>) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Scoped, Some(Self::erase_instance(value)))
    }

    /// Registers an existing instance for `S`; every resolution returns the
    /// same handle despite the Transient lifetime tag.
    pub fn register_transient_instance<S, C>(&self, value: Arc<C>) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        self.register_service::<S, C>(Lifetime::Transient, Some(Self::erase_instance(value)))
    }

    /// Registers `C` against itself as a Singleton.
    pub fn register_singleton_self<C: Injectable>(&self) -> DiResult<()> {
        self.register_singleton::<C, C>()
    }

    /// Registers `C` against itself as Scoped.
    pub fn register_scoped_self<C: Injectable>(&self) -> DiResult<()> {
        self.register_scoped::<C, C>()
    }

    /// Registers `C` against itself as Transient.
    pub fn register_transient_self<C: Injectable>(&self) -> DiResult<()> {
        self.register_transient::<C, C>()
    }

    /// Registers `C` against itself and against every declared capability,
    /// as a Singleton.
    pub fn register_singleton_all<C: Injectable>(&self) -> DiResult<()> {
        self.register_service_all::<C>(Lifetime::Singleton, None)
    }

    /// Registers `C` against itself and against every declared capability,
    /// as Scoped.
    pub fn register_scoped_all<C: Injectable>(&self) -> DiResult<()> {
        self.register_service_all::<C>(Lifetime::Scoped, None)
    }

    /// Registers `C` against itself and against every declared capability,
    /// as Transient.
    pub fn register_transient_all<C: Injectable>(&self) -> DiResult<()> {
        self.register_service_all::<C>(Lifetime::Transient, None)
    }

    /// Factory variant of [`register_singleton_all`](Self::register_singleton_all).
    pub fn register_singleton_all_factory<C, F>(&self, factory: F) -> DiResult<()>
    where
        C: Injectable,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service_all::<C>(Lifetime::Singleton, Some(Self::erase_factory(factory)))
    }

    /// Factory variant of [`register_scoped_all`](Self::register_scoped_all).
    pub fn register_scoped_all_factory<C, F>(&self, factory: F) -> DiResult<()>
    where
        C: Injectable,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service_all::<C>(Lifetime::Scoped, Some(Self::erase_factory(factory)))
    }

    /// Factory variant of [`register_transient_all`](Self::register_transient_all).
    pub fn register_transient_all_factory<C, F>(&self, factory: F) -> DiResult<()>
    where
        C: Injectable,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        self.register_service_all::<C>(Lifetime::Transient, Some(Self::erase_factory(factory)))
    }

    fn erase_factory<C, F>(factory: F) -> ServiceFactory
    where
        C: Send + Sync + 'static,
        F: Fn(&ServiceManager) -> C + Send + Sync + 'static,
    {
        Arc::new(move |sm: &ServiceManager| Ok(erase_service(Arc::new(factory(sm)))))
    }

    fn erase_instance<C: Send + Sync + 'static>(value: Arc<C>) -> ServiceFactory {
        Arc::new(move |_: &ServiceManager| Ok(erase_service(value.clone())))
    }

    pub(crate) fn register_service<S, C>(
        &self,
        lifetime: Lifetime,
        factory: Option<ServiceFactory>,
    ) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        let key = Key::of::<S>();
        let registration = Registration::of::<S, C>(lifetime);
        self.guard_unit(move || self.map_service(key, registration, factory))
    }

    fn register_service_all<C: Injectable>(
        &self,
        lifetime: Lifetime,
        factory: Option<ServiceFactory>,
    ) -> DiResult<()> {
        let registration = Registration::of::<C, C>(lifetime);
        self.guard_unit(move || {
            for capability in registration.caps.iter() {
                self.map_service(
                    capability.key,
                    registration.for_capability(capability),
                    factory.clone(),
                )?;
            }
            self.map_service(Key::of::<C>(), registration.clone(), factory)
        })
    }

    fn map_service(
        &self,
        key: Key,
        registration: Registration,
        factory: Option<ServiceFactory>,
    ) -> DiResult<()> {
        if self.inner.read_only {
            return Err(DiError::InvalidOperation(
                "cannot register service: container is read-only".into(),
            ));
        }
        debug!(
            service = key.display_name(),
            implementation = registration.impl_key.display_name(),
            lifetime = ?registration.lifetime,
            "registering service"
        );
        self.with_state(|state| {
            state.mappings.entry(key).or_default().push(registration);
            if let Some(factory) = factory {
                state.factories.entry(key).or_default().push(factory);
            }
        });
        Ok(())
    }

    /// Registers a resolver consulted before automatic resolution.
    /// Resolvers run in registration order; the first match wins.
    pub fn register_resolver(&self, resolver: Arc<dyn DependencyResolver>) -> DiResult<()> {
        self.guard_unit(move || {
            if self.inner.read_only {
                return Err(DiError::InvalidOperation(
                    "cannot register resolver: container is read-only".into(),
                ));
            }
            self.with_state(|state| state.resolvers.push(resolver));
            Ok(())
        })
    }

    /// Registers the handler for one error kind. At most one handler per
    /// kind per container; the handler returns true to rethrow and false to
    /// swallow.
    pub fn handle_exception<F>(&self, kind: ErrorKind, handler: F) -> DiResult<()>
    where
        F: Fn(&ServiceManager, &DiError) -> bool + Send + Sync + 'static,
    {
        let handler: ExceptionHandler = Arc::new(handler);
        self.with_state(|state| {
            use std::collections::hash_map::Entry;
            match state.handlers.entry(kind) {
                Entry::Occupied(_) => Err(DiError::InvalidOperation(format!(
                    "a handler for {:?} errors is already registered",
                    kind
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(handler);
                    Ok(())
                }
            }
        })
    }

    /// True if at least one registration exists for `S`, a resolver claims
    /// it, or `S` denotes the container itself.
    pub fn is_registered<S>(&self) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.is_registered_key(&Key::of::<S>())
    }

    /// Key-based form of [`is_registered`](Self::is_registered).
    pub fn is_registered_key(&self, key: &Key) -> bool {
        let key = *key;
        self.guard(move || {
            if key.is::<ServiceManager>() {
                return Ok(true);
            }
            let (mapped, resolvers) = self.with_state(|state| {
                (state.mappings.contains_key(&key), state.resolvers.clone())
            });
            Ok(mapped || resolvers.iter().any(|r| r.can_resolve(&key)))
        })
        .map(|outcome| outcome.unwrap_or(false))
        .unwrap_or(false)
    }

    // ----- Resolution -----

    /// Resolves the service registered for `S`.
    ///
    /// The call runs under the exception interception layer: `Ok(None)`
    /// means a registered handler swallowed the failure. Inside factories
    /// and constructor candidates prefer [`resolve`](Self::resolve), which
    /// propagates errors directly.
    pub fn get<S>(&self) -> DiResult<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.guard(|| self.resolve::<S>())
    }

    /// Resolves the service registered for `S`, panicking on failure.
    pub fn get_required<S>(&self) -> Arc<S>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        match self.get::<S>() {
            Ok(Some(service)) => service,
            Ok(None) => panic!(
                "failed to resolve {}: suppressed by exception handler",
                std::any::type_name::<S>()
            ),
            Err(err) => panic!("failed to resolve {}: {}", std::any::type_name::<S>(), err),
        }
    }

    /// Resolves the service registered for `S`, propagating errors.
    ///
    /// This is the accessor constructor candidates and factories use for
    /// their parameters: a failure makes the enclosing candidate fail, which
    /// moves resolution on to the next one.
    pub fn resolve<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let _lock = self.inner.state.lock();
        let key = Key::of::<S>();
        let raw = self.resolve_key(&key)?;
        let coerce = self.with_state(|state| {
            state
                .mappings
                .get(&key)
                .and_then(|regs| regs.first())
                .map(|reg| reg.coerce.clone())
        });
        let shaped = match coerce {
            Some(coerce) => coerce(&raw),
            None => raw,
        };
        unerase::<S>(&shaped).ok_or_else(|| {
            DiError::Resolution(format!(
                "resolved instance for {} has an unexpected concrete type",
                key.display_name()
            ))
        })
    }

    /// Core resolution: returns the raw (implementation-shaped) erased value
    /// for a requested key, honoring cache and lifetime.
    pub(crate) fn resolve_key(&self, key: &Key) -> DiResult<AnyService> {
        let _lock = self.inner.state.lock();

        // Self-marker: the container resolves itself.
        if key.is::<ServiceManager>() {
            return Ok(erase_service(Arc::new(self.clone())));
        }

        let (first, resolvers) = self.with_state(|state| {
            (
                state.mappings.get(key).and_then(|regs| regs.first()).cloned(),
                state.resolvers.clone(),
            )
        });

        if first.is_none() && !resolvers.iter().any(|r| r.can_resolve(key)) {
            return Err(DiError::Resolution(format!(
                "service {} is not registered",
                key.display_name()
            )));
        }

        match &first {
            Some(reg) if matches!(reg.lifetime, Lifetime::Singleton | Lifetime::Scoped) => {
                if let Some(cached) = self.with_state(|state| state.instances.get(&reg.impl_key).cloned()) {
                    trace!(service = key.display_name(), "cache hit");
                    return Ok(cached);
                }
                let built = self.try_implement(key, Some(reg), &resolvers)?;
                // A reentrant call may have populated the slot meanwhile;
                // the first stored instance wins.
                let stored = self.with_state(|state| {
                    state
                        .instances
                        .entry(reg.impl_key)
                        .or_insert_with(|| built.clone())
                        .clone()
                });
                debug!(service = key.display_name(), "instantiated");
                Ok(stored)
            }
            _ => self.try_implement(key, first.as_ref(), &resolvers),
        }
    }

    fn try_implement(
        &self,
        key: &Key,
        registration: Option<&Registration>,
        resolvers: &[Arc<dyn DependencyResolver>],
    ) -> DiResult<AnyService> {
        for resolver in resolvers {
            if resolver.can_resolve(key) {
                trace!(service = key.display_name(), "claimed by resolver");
                return resolver.resolve(self, key);
            }
        }

        let Some(reg) = registration else {
            return Err(DiError::Resolution(format!(
                "no registered service for type {}",
                key.display_name()
            )));
        };

        let factory = self.with_state(|state| {
            state.factories.get(key).and_then(|factories| factories.first()).cloned()
        });
        if let Some(factory) = factory {
            return factory(self);
        }

        self.call_constructors(key, reg)
    }

    /// Constructor resolution: candidates run in priority order; the first
    /// fully satisfied candidate produces the instance.
    pub(crate) fn call_constructors(
        &self,
        requested: &Key,
        registration: &Registration,
    ) -> DiResult<AnyService> {
        for ctor in registration.ctors.iter() {
            match (ctor.build)(self) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    trace!(
                        service = requested.display_name(),
                        error = %err,
                        "constructor candidate rejected"
                    );
                }
            }
        }
        Err(DiError::Resolution(format!(
            "no suitable constructor was found for type {}",
            requested.display_name()
        )))
    }

    /// Returns a lazy sequence of every registered service whose
    /// implementation type is assignable to `S`. Each call re-scans the
    /// current registrations; resolution is cache-respecting and guarded,
    /// with handler-swallowed failures skipped.
    pub fn get_services_of_type<S>(&self) -> ServicesOfType<S>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        ServicesOfType {
            manager: self.clone(),
            capability: Key::of::<S>(),
            matches: None,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Eagerly forces every Singleton registration, for fail-fast startup.
    pub fn build_singletons(&self) -> DiResult<()> {
        let _lock = self.inner.state.lock();
        let keys: Vec<Key> = self.with_state(|state| {
            state
                .mappings
                .iter()
                .filter(|(_, regs)| regs.iter().any(|r| r.lifetime == Lifetime::Singleton))
                .map(|(key, _)| *key)
                .collect()
        });
        for key in keys {
            self.guard(|| self.resolve_key(&key))?;
        }
        Ok(())
    }

    // ----- Exception interception -----

    /// Runs `f` under the interception layer: a `DiError` consults the
    /// handler registered for its kind, and an error raised in user code is
    /// reduced to its payload message for the same consultation before being
    /// resumed unchanged.
    pub(crate) fn guard<T>(&self, f: impl FnOnce() -> DiResult<T>) -> DiResult<Option<T>> {
        let _lock = self.inner.state.lock();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(err)) => {
                let handler = self.with_state(|state| state.handlers.get(&err.kind()).cloned());
                match handler {
                    Some(handler) if !handler(self, &err) => {
                        debug!(error = %err, "error swallowed by handler");
                        Ok(None)
                    }
                    _ => Err(err),
                }
            }
            Err(payload) => {
                let err = DiError::External(panic_message(payload.as_ref()));
                let handler =
                    self.with_state(|state| state.handlers.get(&ErrorKind::External).cloned());
                match handler {
                    Some(handler) if !handler(self, &err) => {
                        debug!(error = %err, "user-code error swallowed by handler");
                        Ok(None)
                    }
                    _ => panic::resume_unwind(payload),
                }
            }
        }
    }

    fn guard_unit(&self, f: impl FnOnce() -> DiResult<()>) -> DiResult<()> {
        self.guard(f).map(|_| ())
    }

    // ----- Teardown -----

    /// Clears all registered types, cached instances, factories and
    /// exception handlers, disposing every cached instance that declares a
    /// disposal hook. Fails on read-only containers.
    pub fn clear(&self) -> DiResult<()> {
        self.guard_unit(|| {
            if self.inner.read_only {
                return Err(DiError::InvalidOperation(
                    "cannot clear container: container is read-only".into(),
                ));
            }
            let hooks = self.with_state(|state| {
                let hooks = collect_dispose_hooks(state, |_| true);
                state.mappings.clear();
                state.instances.clear();
                state.factories.clear();
                state.handlers.clear();
                hooks
            });
            run_dispose_hooks(hooks);
            Ok(())
        })
    }

    /// Disposes the container: runs the disposal hook of every cached Scoped
    /// instance and, on roots, every cached Singleton instance, then clears
    /// all internal tables. Idempotent and non-throwing; operations after
    /// disposal fail through the now-empty registration store.
    pub fn dispose(&self) {
        let _lock = self.inner.state.lock();
        let scoped = self.is_scope();
        let hooks = self.with_state(|state| {
            if state.disposed {
                return Vec::new();
            }
            state.disposed = true;
            let hooks = collect_dispose_hooks(state, |lifetime| {
                lifetime == Lifetime::Scoped || (!scoped && lifetime == Lifetime::Singleton)
            });
            state.mappings.clear();
            state.instances.clear();
            state.factories.clear();
            state.handlers.clear();
            state.resolvers.clear();
            hooks
        });
        run_dispose_hooks(hooks);
        debug!(scoped, "container disposed");
    }
}

fn collect_dispose_hooks(
    state: &ManagerState,
    eligible: impl Fn(Lifetime) -> bool,
) -> Vec<(AnyService, crate::registration::DisposeHook)> {
    let mut seen = HashSet::new();
    let mut hooks = Vec::new();
    for registrations in state.mappings.values() {
        for reg in registrations {
            if eligible(reg.lifetime) && seen.insert(reg.impl_key) {
                if let Some(instance) = state.instances.get(&reg.impl_key) {
                    hooks.push((instance.clone(), reg.dispose.clone()));
                }
            }
        }
    }
    hooks
}

fn run_dispose_hooks(hooks: Vec<(AnyService, crate::registration::DisposeHook)>) {
    for (instance, hook) in hooks {
        if panic::catch_unwind(AssertUnwindSafe(|| hook(&instance))).is_err() {
            warn!("disposal hook panicked; continuing teardown");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Lazy, restartable sequence over the services assignable to `S`.
///
/// Produced by [`ServiceManager::get_services_of_type`]; the registration
/// scan happens on the first `next()` call, so a freshly obtained sequence
/// observes registrations added since the previous one.
pub struct ServicesOfType<S: ?Sized> {
    manager: ServiceManager,
    capability: Key,
    matches: Option<Vec<(Key, Registration)>>,
    index: usize,
    _marker: PhantomData<fn() -> Arc<S>>,
}

impl<S> Iterator for ServicesOfType<S>
where
    S: ?Sized + Send + Sync + 'static,
{
    type Item = DiResult<Arc<S>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.matches.is_none() {
            let capability = self.capability;
            self.matches = Some(self.manager.with_state(|state| {
                let mut found = Vec::new();
                for (key, registrations) in &state.mappings {
                    for reg in registrations {
                        let assignable = reg.impl_key == capability
                            || *key == capability
                            || reg.caps.iter().any(|cap| cap.key == capability);
                        if assignable {
                            found.push((*key, reg.clone()));
                        }
                    }
                }
                found
            }));
        }

        let matches = self.matches.as_ref().expect("scan performed above");
        while self.index < matches.len() {
            let (key, reg) = matches[self.index].clone();
            self.index += 1;
            match self.manager.guard(|| self.manager.resolve_key(&key)) {
                Ok(Some(raw)) => {
                    let shaped = if reg.impl_key == self.capability {
                        raw
                    } else if let Some(cap) =
                        reg.caps.iter().find(|cap| cap.key == self.capability)
                    {
                        match (cap.cast)(&raw) {
                            Some(shaped) => shaped,
                            None => continue,
                        }
                    } else {
                        (reg.coerce)(&raw)
                    };
                    match unerase::<S>(&shaped) {
                        Some(service) => return Some(Ok(service)),
                        None => continue,
                    }
                }
                // A handler swallowed the failure for this entry.
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}
