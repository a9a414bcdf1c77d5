//! # slim-di
//!
//! A hierarchical dependency-injection container: a service registry mapping
//! abstract request types to concrete implementations, instantiating them on
//! demand under three lifetime policies, resolving constructor dependencies
//! through declared candidate lists, and supporting nested scopes that share
//! singletons with their creator while isolating scoped and transient state.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton, Scoped and Transient services
//! - **Constructor resolution**: ordered, priority-aware candidate lists
//!   declared per type, parameters resolved recursively by the container
//! - **Trait bindings**: request a `dyn Trait`, receive the registered
//!   implementation
//! - **Pluggable resolvers**: override resolution for recognized types
//!   before the registry is consulted
//! - **Hierarchical scopes**: child containers with singleton delegation to
//!   the creating container and a read-only switch
//! - **Exception interception**: per-error-kind handlers deciding swallow
//!   vs. rethrow
//! - **Thread-safe**: one reentrant lock per container; reentrant calls from
//!   factories are supported
//!
//! ## Quick Start
//!
//! ```rust
//! use slim_di::{Constructor, Injectable, ServiceManager};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Injectable for Database {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|_| Ok(Database {
//!             connection_string: "postgres://localhost".to_string(),
//!         }))]
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|sm| Ok(UserService {
//!             db: sm.resolve::<Database>()?,
//!         }))]
//!     }
//! }
//!
//! let manager = ServiceManager::new();
//! manager.register_singleton_self::<Database>().unwrap();
//! manager.register_transient_self::<UserService>().unwrap();
//!
//! let service = manager.get_required::<UserService>();
//! assert_eq!(service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Trait Resolution
//!
//! ```rust
//! use slim_di::{Constructor, Implements, Injectable, ServiceManager};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! impl Injectable for ConsoleLogger {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|_| Ok(ConsoleLogger))]
//!     }
//! }
//!
//! impl Implements<dyn Logger> for ConsoleLogger {
//!     fn into_service(this: Arc<Self>) -> Arc<dyn Logger> {
//!         this
//!     }
//! }
//!
//! let manager = ServiceManager::new();
//! manager.register_singleton::<dyn Logger, ConsoleLogger>().unwrap();
//!
//! let logger = manager.get_required::<dyn Logger>();
//! logger.log("Hello, World!");
//! ```
//!
//! ## Scopes
//!
//! Scoped services are cached per container: a scope resolves its own
//! instances while singletons delegate to the creating container.
//!
//! ```rust
//! use slim_di::{Constructor, Injectable, ServiceManager};
//! use std::sync::Arc;
//!
//! struct AppState;
//! impl Injectable for AppState {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|_| Ok(AppState))]
//!     }
//! }
//!
//! let manager = ServiceManager::new();
//! manager.register_singleton_self::<AppState>().unwrap();
//!
//! let scope = manager.create_scope();
//! let from_root = manager.get_required::<AppState>();
//! let from_scope = scope.get_required::<AppState>();
//! assert!(Arc::ptr_eq(&from_root, &from_scope));
//! ```

pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod manager;
pub mod traits;

mod registration;

pub use container::ServiceContainer;
pub use descriptors::{
    apply_descriptors, build_service_manager, ScopeFactory, ServiceDescriptor, ServiceQuery,
};
pub use error::{DiError, DiResult, ErrorKind};
pub use key::Key;
pub use lifetime::Lifetime;
pub use manager::{ExceptionHandler, ServiceManager, ServicesOfType};
pub use registration::{erase_service, AnyService, ServiceFactory};
pub use traits::{Capability, Constructor, DependencyResolver, Dispose, Implements, Injectable};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Value(usize);
    impl Injectable for Value {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new(|_| Ok(Value(42)))]
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let manager = ServiceManager::new();
        manager.register_singleton_self::<Value>().unwrap();

        let a = manager.get_required::<Value>();
        let b = manager.get_required::<Value>();

        assert_eq!(a.0, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        struct Stamp(usize);
        impl Injectable for Stamp {}

        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let manager = ServiceManager::new();
        manager
            .register_transient_factory::<Stamp, Stamp, _>(move |_| {
                let mut c = counter_clone.lock().unwrap();
                *c += 1;
                Stamp(*c)
            })
            .unwrap();

        let a = manager.get_required::<Stamp>();
        let b = manager.get_required::<Stamp>();

        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_self_marker_resolution() {
        let manager = ServiceManager::new();
        assert!(manager.is_registered::<ServiceManager>());

        let this = manager.get_required::<ServiceManager>();
        assert!(this.is_registered::<ServiceManager>());
    }
}
