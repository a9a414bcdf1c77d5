//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// Represents the error conditions that can occur during service
/// registration, resolution, or container teardown.
///
/// # Examples
///
/// ```rust
/// use slim_di::{DiError, ServiceManager};
///
/// let manager = ServiceManager::new();
/// match manager.get::<String>() {
///     Err(DiError::Resolution(msg)) => {
///         assert!(msg.contains("alloc::string::String"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No registration, resolver or self-marker matched, or every
    /// constructor candidate failed.
    Resolution(String),
    /// Mutation of a read-only scope, an unsupported lifetime tag, or an
    /// unsupported single-service removal.
    InvalidOperation(String),
    /// A required argument (typically a service factory) was missing.
    NullArgument(&'static str),
    /// An error raised inside user constructor or factory code, reduced to
    /// its payload message for handler dispatch.
    External(String),
}

/// Discriminant of [`DiError`], used as the key for per-kind exception
/// handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`DiError::Resolution`]
    Resolution,
    /// [`DiError::InvalidOperation`]
    InvalidOperation,
    /// [`DiError::NullArgument`]
    NullArgument,
    /// [`DiError::External`]
    External,
}

impl DiError {
    /// Returns the kind discriminant for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::Resolution(_) => ErrorKind::Resolution,
            DiError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            DiError::NullArgument(_) => ErrorKind::NullArgument,
            DiError::External(_) => ErrorKind::External,
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::Resolution(msg) => write!(f, "dependency resolution error: {}", msg),
            DiError::InvalidOperation(msg) => write!(f, "invalid operation: {}", msg),
            DiError::NullArgument(name) => write!(f, "missing required argument: {}", name),
            DiError::External(msg) => write!(f, "error raised in user code: {}", msg),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
