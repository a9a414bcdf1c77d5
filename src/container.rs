//! Legacy service-locator adapter used by hosting frameworks.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::manager::ServiceManager;
use crate::traits::Injectable;

/// Service-locator-style facade over a [`ServiceManager`]: add and fetch
/// services by type, optionally promoting additions to every ancestor
/// container.
///
/// Removal of a single service is not supported and always fails; only bulk
/// [`ServiceManager::clear`] exists on the underlying container.
///
/// # Examples
///
/// ```rust
/// use slim_di::{Injectable, ServiceContainer};
/// use std::sync::Arc;
///
/// struct Config { name: &'static str }
/// impl Injectable for Config {}
///
/// let container = ServiceContainer::new();
/// container.add_service(Arc::new(Config { name: "app" }), false).unwrap();
///
/// let config = container.get_service::<Config>().unwrap().unwrap();
/// assert_eq!(config.name, "app");
/// ```
pub struct ServiceContainer {
    manager: ServiceManager,
}

impl ServiceContainer {
    /// Creates a locator over a fresh root container.
    pub fn new() -> Self {
        Self {
            manager: ServiceManager::new(),
        }
    }

    /// Creates a locator over an existing container.
    pub fn with_manager(manager: ServiceManager) -> Self {
        Self { manager }
    }

    /// The underlying container.
    pub fn manager(&self) -> &ServiceManager {
        &self.manager
    }

    /// Registers an existing instance as a Singleton. With `promote`, the
    /// instance is re-registered at every ancestor container by walking
    /// parent references.
    pub fn add_service<T: Injectable>(&self, instance: Arc<T>, promote: bool) -> DiResult<()> {
        if !promote {
            return self.manager.register_singleton_instance::<T, T>(instance);
        }
        let mut current = Some(self.manager.clone());
        while let Some(manager) = current {
            manager.register_singleton_instance::<T, T>(instance.clone())?;
            current = manager.parent();
        }
        Ok(())
    }

    /// Registers a callback producing the service, as a Singleton. With
    /// `promote`, the callback is registered at every ancestor container.
    pub fn add_service_with<T, F>(&self, callback: F, promote: bool) -> DiResult<()>
    where
        T: Injectable,
        F: Fn(&ServiceManager) -> T + Send + Sync + Clone + 'static,
    {
        if !promote {
            return self.manager.register_singleton_factory::<T, T, F>(callback);
        }
        let mut current = Some(self.manager.clone());
        while let Some(manager) = current {
            manager.register_singleton_factory::<T, T, F>(callback.clone())?;
            current = manager.parent();
        }
        Ok(())
    }

    /// Resolves a service from the underlying container.
    pub fn get_service<T>(&self) -> DiResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.manager.get::<T>()
    }

    /// Single-service removal is unsupported; this always fails.
    pub fn remove_service<T>(&self) -> DiResult<()>
    where
        T: ?Sized + 'static,
    {
        Err(DiError::InvalidOperation(
            "removing a single service is not supported".into(),
        ))
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}
