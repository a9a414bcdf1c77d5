//! Public traits of the container: injection metadata, resolver overrides
//! and disposal.

mod dispose;
mod inject;
mod resolver;

pub use dispose::Dispose;
pub use inject::{Capability, Constructor, Implements, Injectable};
pub use resolver::DependencyResolver;
