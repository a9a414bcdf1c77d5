//! Pluggable dependency resolvers.

use crate::error::DiResult;
use crate::key::Key;
use crate::manager::ServiceManager;
use crate::registration::AnyService;

/// A resolver that can be added to a [`ServiceManager`] to manually resolve
/// dependencies it recognizes.
///
/// Resolvers are consulted in registration order before factories and
/// automatic constructor resolution; the first resolver whose
/// [`can_resolve`](Self::can_resolve) returns true supplies the instance and
/// nothing else runs. The engine caches a resolver's output per the
/// underlying registration's declared lifetime; with no registration the
/// output is never cached.
///
/// The value returned by [`resolve`](Self::resolve) must be erased with
/// [`erase_service`](crate::erase_service) for the requested type.
///
/// # Examples
///
/// ```rust
/// use slim_di::{erase_service, AnyService, DependencyResolver, DiResult, Key, ServiceManager};
/// use std::sync::Arc;
///
/// struct ApiToken(String);
///
/// struct TokenResolver;
///
/// impl DependencyResolver for TokenResolver {
///     fn can_resolve(&self, key: &Key) -> bool {
///         key.is::<ApiToken>()
///     }
///
///     fn resolve(&self, _manager: &ServiceManager, _key: &Key) -> DiResult<AnyService> {
///         Ok(erase_service(Arc::new(ApiToken("secret".into()))))
///     }
/// }
///
/// let manager = ServiceManager::new();
/// manager.register_resolver(Arc::new(TokenResolver)).unwrap();
///
/// let token = manager.get_required::<ApiToken>();
/// assert_eq!(token.0, "secret");
/// ```
pub trait DependencyResolver: Send + Sync + 'static {
    /// Returns true if this resolver can supply the dependency for `key`.
    fn can_resolve(&self, key: &Key) -> bool;

    /// Produces the resolved dependency for `key`. `manager` is the
    /// container issuing the request; reentrant resolution through it is
    /// supported.
    fn resolve(&self, manager: &ServiceManager, key: &Key) -> DiResult<AnyService>;
}
