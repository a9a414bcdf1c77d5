//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior.
///
/// # Lifetime Characteristics
///
/// - **Singleton**: one instance for the whole ownership chain; child scopes
///   delegate resolution to their creating container instead of building
///   independently.
/// - **Scoped**: one instance per container instance, never shared with
///   child scopes.
/// - **Transient**: a new instance per resolution, never cached.
///
/// # Examples
///
/// ```rust
/// use slim_di::{Constructor, Injectable, ServiceManager};
/// use std::sync::Arc;
///
/// struct Counter;
/// impl Injectable for Counter {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Counter))]
///     }
/// }
///
/// let manager = ServiceManager::new();
/// manager.register_singleton_self::<Counter>().unwrap();
///
/// let a = manager.get_required::<Counter>();
/// let b = manager.get_required::<Counter>();
/// assert!(Arc::ptr_eq(&a, &b)); // Singleton: same instance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Single instance shared across the container and every scope created
    /// from it, cached until disposal of the owning root.
    Singleton,
    /// Single instance per container, cached for the container's lifetime
    /// and isolated from child scopes.
    Scoped,
    /// New instance per resolution, never cached.
    Transient,
}
