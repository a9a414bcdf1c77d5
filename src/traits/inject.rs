//! Injection metadata declared by implementation types.
//!
//! Rust has no runtime constructor reflection, so the information the
//! container needs to build a type automatically is declared up front:
//! an ordered list of constructor candidates, the capabilities (interfaces)
//! the type can be coerced to, and an optional disposal view.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::manager::ServiceManager;
use crate::registration::{erase_service, AnyService};
use crate::traits::Dispose;

pub(crate) type ConstructorFn<T> = Arc<dyn Fn(&ServiceManager) -> DiResult<T> + Send + Sync>;

/// A constructor candidate for an injectable type.
///
/// Candidates are tried in ascending priority order; candidates without a
/// priority sort last, and declaration order breaks ties. A candidate whose
/// closure fails (typically because a parameter could not be resolved) is
/// skipped and the next one is tried. Candidates marked
/// [`do_not_inject`](Constructor::do_not_inject) are never enumerated.
///
/// # Examples
///
/// ```rust
/// use slim_di::{Constructor, Injectable};
/// use std::sync::Arc;
///
/// struct Settings { verbose: bool }
/// impl Injectable for Settings {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Settings { verbose: false }))]
///     }
/// }
///
/// struct Reporter { settings: Arc<Settings> }
/// impl Injectable for Reporter {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![
///             // Preferred: wire against registered settings.
///             Constructor::new(|sm| Ok(Reporter { settings: sm.resolve::<Settings>()? }))
///                 .with_priority(0),
///             // Fallback when settings are not registered.
///             Constructor::new(|_| Ok(Reporter { settings: Arc::new(Settings { verbose: true }) })),
///         ]
///     }
/// }
/// ```
pub struct Constructor<T> {
    pub(crate) priority: Option<u32>,
    pub(crate) excluded: bool,
    pub(crate) build: ConstructorFn<T>,
}

impl<T> Constructor<T> {
    /// Creates a candidate from a build closure. Parameters are resolved
    /// inside the closure through [`ServiceManager::resolve`].
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&ServiceManager) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            priority: None,
            excluded: false,
            build: Arc::new(build),
        }
    }

    /// Assigns an explicit priority. Lower values are tried first;
    /// candidates without a priority are tried after all prioritized ones.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Excludes this candidate from constructor enumeration entirely.
    pub fn do_not_inject(mut self) -> Self {
        self.excluded = true;
        self
    }
}

/// A declared capability of an implementation type: an interface the type
/// can be coerced to, with the coercion captured where both types are known.
///
/// Capabilities drive [`ServiceManager::get_services_of_type`] assignability
/// scans and the `register_*_all` family of registrations.
///
/// [`ServiceManager::get_services_of_type`]: crate::ServiceManager::get_services_of_type
///
/// # Examples
///
/// ```rust
/// use slim_di::{Capability, Constructor, Injectable};
///
/// trait Plugin: Send + Sync {
///     fn name(&self) -> &str;
/// }
///
/// struct Spellcheck;
/// impl Plugin for Spellcheck {
///     fn name(&self) -> &str { "spellcheck" }
/// }
///
/// impl Injectable for Spellcheck {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Spellcheck))]
///     }
///     fn capabilities() -> Vec<Capability<Self>> {
///         vec![Capability::of::<dyn Plugin>(|it| it)]
///     }
/// }
/// ```
pub struct Capability<C> {
    pub(crate) key: Key,
    pub(crate) cast: Arc<dyn Fn(Arc<C>) -> AnyService + Send + Sync>,
}

impl<C: Send + Sync + 'static> Capability<C> {
    /// Declares that `C` is assignable to `S`, with `coerce` performing the
    /// (usually implicit) `Arc<C>` to `Arc<S>` conversion.
    pub fn of<S>(coerce: fn(Arc<C>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: Key::of::<S>(),
            cast: Arc::new(move |it| erase_service(coerce(it))),
        }
    }

    /// The key of the capability type.
    pub fn key(&self) -> Key {
        self.key
    }
}

/// Injection metadata for an implementation type.
///
/// Every type that appears as an implementation in a registration implements
/// this trait. All items default to empty, so instance- or factory-only
/// types get away with `impl Injectable for Foo {}`; types that should be
/// constructed by the container override [`constructors`](Self::constructors).
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Ordered constructor candidates for automatic construction.
    fn constructors() -> Vec<Constructor<Self>> {
        Vec::new()
    }

    /// Capabilities this type is assignable to.
    fn capabilities() -> Vec<Capability<Self>> {
        Vec::new()
    }

    /// Disposal view of an instance, if the type participates in container
    /// disposal. The default opts out.
    fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
        let _ = this;
        None
    }
}

/// Declared "is assignable to" relation used by registrations that bind an
/// implementation to an abstract request type.
///
/// The identity impl is blanket-provided, so every type implements
/// `Implements<Self>`; binding to a trait object takes a one-line impl where
/// the unsize coercion is implicit:
///
/// ```rust
/// use slim_di::Implements;
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {}
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
///
/// impl Implements<dyn Logger> for ConsoleLogger {
///     fn into_service(this: Arc<Self>) -> Arc<dyn Logger> {
///         this
///     }
/// }
/// ```
pub trait Implements<S: ?Sized>: Send + Sync + 'static {
    /// Coerces a shared instance of the implementation into the service type.
    fn into_service(this: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn into_service(this: Arc<Self>) -> Arc<T> {
        this
    }
}
