//! Service registration records and type-erasure plumbing.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::manager::ServiceManager;
use crate::traits::{Implements, Injectable};

/// Type-erased service value.
///
/// Every stored or returned erased value holds an `Arc<S>` as its `Any`
/// payload, where `S` is the service type it was erased for. This uniform
/// shape lets concrete types and trait objects share one resolution path.
pub type AnyService = Arc<dyn Any + Send + Sync>;

/// A factory producing an erased service instance for a requesting container.
pub type ServiceFactory = Arc<dyn Fn(&ServiceManager) -> DiResult<AnyService> + Send + Sync>;

pub(crate) type CoerceFn = Arc<dyn Fn(&AnyService) -> AnyService + Send + Sync>;
pub(crate) type CapabilityCast = Arc<dyn Fn(&AnyService) -> Option<AnyService> + Send + Sync>;
pub(crate) type DisposeHook = Arc<dyn Fn(&AnyService) + Send + Sync>;

/// Erases a service value for storage or for return from a
/// [`DependencyResolver`](crate::DependencyResolver).
pub fn erase_service<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> AnyService {
    Arc::new(value)
}

/// Recovers a typed handle from an erased value, if the payload matches.
pub(crate) fn unerase<S: ?Sized + Send + Sync + 'static>(any: &AnyService) -> Option<Arc<S>> {
    any.clone().downcast::<Arc<S>>().ok().map(|it| (*it).clone())
}

#[derive(Clone)]
pub(crate) struct ErasedConstructor {
    pub(crate) build: ServiceFactory,
}

#[derive(Clone)]
pub(crate) struct ErasedCapability {
    pub(crate) key: Key,
    pub(crate) cast: CapabilityCast,
}

/// One registration: the implementation behind a requested key, its
/// lifetime, and the erased metadata captured from the implementation type.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) impl_key: Key,
    pub(crate) lifetime: Lifetime,
    /// Constructor candidates, pre-filtered for exclusions and pre-sorted by
    /// priority (prioritized ascending first, unprioritized after, declaration
    /// order on ties).
    pub(crate) ctors: Arc<[ErasedConstructor]>,
    /// Shapes a raw implementation-typed value into the requested service
    /// type. Values that are not implementation-shaped (supplied by a
    /// resolver or the self-marker) pass through untouched.
    pub(crate) coerce: CoerceFn,
    pub(crate) caps: Arc<[ErasedCapability]>,
    pub(crate) dispose: DisposeHook,
}

impl Registration {
    pub(crate) fn of<S, C>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        let mut candidates: Vec<_> = C::constructors()
            .into_iter()
            .filter(|c| !c.excluded)
            .collect();
        candidates.sort_by_key(|c| (c.priority.is_none(), c.priority));

        let ctors: Vec<ErasedConstructor> = candidates
            .into_iter()
            .map(|c| {
                let build = c.build.clone();
                let erased: ServiceFactory =
                    Arc::new(move |sm: &ServiceManager| build(sm).map(|v| erase_service(Arc::new(v))));
                ErasedConstructor { build: erased }
            })
            .collect();

        let coerce: CoerceFn = Arc::new(|any: &AnyService| match any.clone().downcast::<Arc<C>>() {
            Ok(it) => erase_service(<C as Implements<S>>::into_service((*it).clone())),
            Err(other) => other,
        });

        let caps: Vec<ErasedCapability> = C::capabilities()
            .into_iter()
            .map(|cap| {
                let cast = cap.cast.clone();
                ErasedCapability {
                    key: cap.key,
                    cast: Arc::new(move |any: &AnyService| {
                        any.clone().downcast::<Arc<C>>().ok().map(|it| cast((*it).clone()))
                    }),
                }
            })
            .collect();

        let dispose: DisposeHook = Arc::new(|any: &AnyService| {
            if let Ok(it) = any.clone().downcast::<Arc<C>>() {
                if let Some(hook) = C::disposer(&it) {
                    hook.dispose();
                }
            }
        });

        Self {
            impl_key: Key::of::<C>(),
            lifetime,
            ctors: ctors.into(),
            coerce,
            caps: caps.into(),
            dispose,
        }
    }

    /// Rebinds this registration under one of its declared capabilities:
    /// same implementation metadata, coercion through the capability cast.
    pub(crate) fn for_capability(&self, capability: &ErasedCapability) -> Self {
        let cast = capability.cast.clone();
        let coerce: CoerceFn = Arc::new(move |any: &AnyService| match cast(any) {
            Some(shaped) => shaped,
            None => any.clone(),
        });
        Self {
            coerce,
            ..self.clone()
        }
    }
}
