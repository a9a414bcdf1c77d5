//! Descriptor-list ingestion: translates an ordered external descriptor
//! list into registration calls on a [`ServiceManager`].

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::manager::ServiceManager;
use crate::traits::{Constructor, Implements, Injectable};

type DescriptorApply = Box<dyn Fn(&ServiceManager, Lifetime) -> DiResult<()> + Send + Sync>;

enum DescriptorPayload {
    Implementation(DescriptorApply),
    Instance(DescriptorApply),
    /// `None` models a descriptor whose factory slot was left unset by the
    /// producing framework; ingestion rejects it with a missing-argument
    /// error.
    Factory(Option<DescriptorApply>),
}

/// One entry of an external service descriptor list: a service type, a
/// lifetime *tag* in the producing framework's vocabulary, and an
/// implementation type, prebuilt instance or factory.
///
/// # Examples
///
/// ```rust
/// use slim_di::descriptors::{build_service_manager, ServiceDescriptor};
/// use slim_di::{Constructor, Injectable};
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Clock))]
///     }
/// }
///
/// let manager = build_service_manager(vec![
///     ServiceDescriptor::implementation::<Clock, Clock>("singleton"),
/// ])
/// .unwrap();
///
/// assert!(manager.is_registered::<Clock>());
/// ```
pub struct ServiceDescriptor {
    service: &'static str,
    lifetime: String,
    payload: DescriptorPayload,
}

impl ServiceDescriptor {
    /// Descriptor registering `C` as the implementation of `S`, constructed
    /// by the engine.
    pub fn implementation<S, C>(lifetime: impl Into<String>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        Self {
            service: std::any::type_name::<S>(),
            lifetime: lifetime.into(),
            payload: DescriptorPayload::Implementation(Box::new(|manager, lifetime| {
                manager.register_service::<S, C>(lifetime, None)
            })),
        }
    }

    /// Descriptor registering a prebuilt instance for `S`.
    pub fn instance<S, C>(lifetime: impl Into<String>, value: Arc<C>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
    {
        Self {
            service: std::any::type_name::<S>(),
            lifetime: lifetime.into(),
            payload: DescriptorPayload::Instance(Box::new(move |manager, lifetime| {
                match lifetime {
                    Lifetime::Singleton => manager.register_singleton_instance::<S, C>(value.clone()),
                    Lifetime::Scoped => manager.register_scoped_instance::<S, C>(value.clone()),
                    Lifetime::Transient => manager.register_transient_instance::<S, C>(value.clone()),
                }
            })),
        }
    }

    /// Descriptor registering a factory for `S`. A `None` factory is carried
    /// through and rejected during ingestion.
    pub fn factory<S, C, F>(lifetime: impl Into<String>, factory: Option<F>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<S>,
        F: Fn(&ServiceManager) -> C + Send + Sync + Clone + 'static,
    {
        Self {
            service: std::any::type_name::<S>(),
            lifetime: lifetime.into(),
            payload: DescriptorPayload::Factory(factory.map(|factory| -> DescriptorApply {
                Box::new(move |manager: &ServiceManager, lifetime| {
                    let factory = factory.clone();
                    match lifetime {
                        Lifetime::Singleton => manager.register_singleton_factory::<S, C, F>(factory),
                        Lifetime::Scoped => manager.register_scoped_factory::<S, C, F>(factory),
                        Lifetime::Transient => manager.register_transient_factory::<S, C, F>(factory),
                    }
                })
            })),
        }
    }

    /// The display name of the service type.
    pub fn service_type(&self) -> &'static str {
        self.service
    }

    /// The lifetime tag carried by this descriptor.
    pub fn lifetime_tag(&self) -> &str {
        &self.lifetime
    }
}

fn parse_lifetime_tag(tag: &str) -> DiResult<Lifetime> {
    match tag.to_ascii_lowercase().as_str() {
        "singleton" => Ok(Lifetime::Singleton),
        "scoped" => Ok(Lifetime::Scoped),
        "transient" => Ok(Lifetime::Transient),
        other => Err(DiError::InvalidOperation(format!(
            "unexpected service lifetime {}",
            other
        ))),
    }
}

/// Registers every descriptor, in order, into `manager`, then auto-registers
/// the container's scope-factory and is-registered query capabilities as
/// Scoped services.
pub fn apply_descriptors<I>(manager: &ServiceManager, descriptors: I) -> DiResult<()>
where
    I: IntoIterator<Item = ServiceDescriptor>,
{
    for descriptor in descriptors {
        let lifetime = parse_lifetime_tag(&descriptor.lifetime)?;
        match &descriptor.payload {
            DescriptorPayload::Implementation(apply) | DescriptorPayload::Instance(apply) => {
                apply(manager, lifetime)?
            }
            DescriptorPayload::Factory(Some(apply)) => apply(manager, lifetime)?,
            DescriptorPayload::Factory(None) => {
                return Err(DiError::NullArgument("service_factory"))
            }
        }
    }

    manager.register_scoped_factory::<ScopeFactory, ScopeFactory, _>(|sm| ScopeFactory {
        manager: sm.clone(),
    })?;
    manager.register_scoped_factory::<ServiceQuery, ServiceQuery, _>(|sm| ServiceQuery {
        manager: sm.clone(),
    })?;
    Ok(())
}

/// Builds a fresh container from an ordered descriptor list.
pub fn build_service_manager<I>(descriptors: I) -> DiResult<ServiceManager>
where
    I: IntoIterator<Item = ServiceDescriptor>,
{
    let manager = ServiceManager::new();
    apply_descriptors(&manager, descriptors)?;
    Ok(manager)
}

/// Scoped service giving hosted code access to scope creation without
/// holding the container type directly.
pub struct ScopeFactory {
    manager: ServiceManager,
}

impl ScopeFactory {
    /// Creates a scope of the container this factory was resolved from.
    pub fn create_scope(&self) -> ServiceManager {
        self.manager.create_scope()
    }
}

impl Injectable for ScopeFactory {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|sm| Ok(ScopeFactory { manager: sm.clone() }))]
    }
}

/// Scoped service answering "is this type resolvable here?" queries.
pub struct ServiceQuery {
    manager: ServiceManager,
}

impl ServiceQuery {
    /// True when the container this query was resolved from can resolve `S`.
    pub fn is_service<S>(&self) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.manager.is_registered::<S>()
    }

    /// Key-based form of [`is_service`](Self::is_service).
    pub fn is_service_key(&self, key: &Key) -> bool {
        self.manager.is_registered_key(key)
    }
}

impl Injectable for ServiceQuery {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|sm| Ok(ServiceQuery { manager: sm.clone() }))]
    }
}
