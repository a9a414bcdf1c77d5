//! Scope creation and cross-container singleton delegation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyService, Registration, ServiceFactory};

use super::{ManagerState, ServiceManager};

impl ServiceManager {
    /// Creates a scoped child container.
    ///
    /// The child copies the registration store, resolver list and exception
    /// handler table by value and starts with an empty instance cache.
    /// Singleton registrations are replaced with forwarding factories that
    /// delegate resolution to this container, so a scope never builds a
    /// singleton independently; Scoped and Transient factories are copied
    /// and run per scope. The child is read-only unless
    /// [`allow_scoped_modifications`](Self::allow_scoped_modifications) was
    /// enabled here when the scope was created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use slim_di::{Constructor, Injectable, ServiceManager};
    /// use std::sync::Arc;
    ///
    /// struct RequestContext;
    /// impl Injectable for RequestContext {
    ///     fn constructors() -> Vec<Constructor<Self>> {
    ///         vec![Constructor::new(|_| Ok(RequestContext))]
    ///     }
    /// }
    ///
    /// let manager = ServiceManager::new();
    /// manager.register_scoped_self::<RequestContext>().unwrap();
    ///
    /// let scope_a = manager.create_scope();
    /// let scope_b = manager.create_scope();
    ///
    /// let a1 = scope_a.get_required::<RequestContext>();
    /// let a2 = scope_a.get_required::<RequestContext>();
    /// let b = scope_b.get_required::<RequestContext>();
    ///
    /// assert!(Arc::ptr_eq(&a1, &a2)); // cached within the scope
    /// assert!(!Arc::ptr_eq(&a1, &b)); // isolated across scopes
    /// ```
    pub fn create_scope(&self) -> ServiceManager {
        let _lock = self.inner.state.lock();
        let read_only = !self.allow_scoped_modifications();
        let (mappings, handlers, resolvers, parent_factories) = self.with_state(|state| {
            (
                state.mappings.clone(),
                state.handlers.clone(),
                state.resolvers.clone(),
                state.factories.clone(),
            )
        });

        let mut factories: HashMap<Key, Vec<ServiceFactory>> = HashMap::new();
        for (key, registrations) in &mappings {
            for registration in registrations {
                if registration.lifetime == Lifetime::Singleton {
                    // Singletons reference the creating container; the scope
                    // obtains (and lazily triggers) the parent's instance.
                    let parent = self.clone();
                    let requested = *key;
                    let registration = registration.clone();
                    let forward: ServiceFactory = Arc::new(move |scope: &ServiceManager| {
                        parent.resolve_singleton_for_scope(scope, &requested, &registration)
                    });
                    factories.entry(*key).or_default().push(forward);
                } else if let Some(existing) = parent_factories.get(key) {
                    let copied = factories.entry(*key).or_default();
                    copied.extend(existing.iter().cloned());
                }
            }
        }

        debug!(read_only, "creating scope");
        let state = ManagerState {
            mappings,
            instances: HashMap::new(),
            factories,
            handlers,
            resolvers,
            disposed: false,
        };
        ServiceManager::scope_of(self.clone(), state, read_only)
    }

    /// Resolves a singleton on behalf of a scope.
    ///
    /// `self` is the creating container. When its resolution fails with a
    /// resolution error and the scope is modifiable, the scope runs its own
    /// constructor resolution for the implementation as a last resort; a
    /// successful fallback instance is published into both caches so the
    /// parent and sibling scopes observe it from then on. Any other outcome
    /// propagates the original error.
    fn resolve_singleton_for_scope(
        &self,
        scope: &ServiceManager,
        requested: &Key,
        registration: &Registration,
    ) -> DiResult<AnyService> {
        match self.guard(|| self.resolve_key(requested)) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(DiError::Resolution(format!(
                "unable to resolve singleton of type {}",
                requested.display_name()
            ))),
            Err(err @ DiError::Resolution(_)) => {
                if scope.is_read_only() {
                    return Err(err);
                }
                match scope.call_constructors(requested, registration) {
                    Ok(value) => {
                        scope.with_state(|state| {
                            state.instances.insert(registration.impl_key, value.clone())
                        });
                        self.with_state(|state| {
                            state.instances.insert(registration.impl_key, value.clone())
                        });
                        debug!(
                            service = requested.display_name(),
                            "scope-built singleton published to creating container"
                        );
                        Ok(value)
                    }
                    Err(_) => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}
