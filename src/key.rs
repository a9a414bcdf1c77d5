//! Service key type for the dependency injection container.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// Key for service storage and lookup.
///
/// A key pairs the `TypeId` of a service type with its human-readable name.
/// Both concrete types (`Database`, `u32`) and trait objects (`dyn Logger`)
/// produce keys, since `TypeId` covers unsized `'static` types.
///
/// Equality and hashing use the `TypeId` alone; the name exists for
/// diagnostics and error messages.
///
/// # Examples
///
/// ```rust
/// use slim_di::Key;
///
/// trait Logger: Send + Sync {}
///
/// let concrete = Key::of::<String>();
/// let dynamic = Key::of::<dyn Logger>();
///
/// assert_eq!(concrete, Key::of::<String>());
/// assert_ne!(concrete, dynamic);
/// assert!(dynamic.display_name().contains("Logger"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates the key for a service type.
    #[inline(always)]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    /// Returns true if this key denotes the type `S`.
    #[inline(always)]
    pub fn is<S: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<S>()
    }

    /// The type name for display in diagnostics and errors.
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

// Hot path: TypeId-only comparison and hashing, the name is ignored.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
