//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (flushing
/// caches, closing connections). The container runs the hook for every
/// cached instance it owns when [`ServiceManager::dispose`] or
/// [`ServiceManager::clear`] is called, provided the implementation type
/// exposes the instance through [`Injectable::disposer`].
///
/// [`ServiceManager::dispose`]: crate::ServiceManager::dispose
/// [`ServiceManager::clear`]: crate::ServiceManager::clear
/// [`Injectable::disposer`]: crate::Injectable::disposer
///
/// # Examples
///
/// ```rust
/// use slim_di::{Constructor, Dispose, Injectable};
/// use std::sync::Arc;
///
/// struct ConnectionPool;
///
/// impl Dispose for ConnectionPool {
///     fn dispose(&self) {
///         // close sockets, flush buffers
///     }
/// }
///
/// impl Injectable for ConnectionPool {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(ConnectionPool))]
///     }
///     fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
///         Some(this.clone())
///     }
/// }
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
