//! The type-erased value model the engine operates on.
//!
//! - [`Value`]: any `'static + Clone + Send + Sync` type, blanket implemented.
//! - [`Type`]: a lightweight runtime type descriptor (id + names).
//! - [`Semantics`]: whether reading a value copies it or shares it.
//! - [`Shared`]: the reference-semantics handle.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// -----------------------------------------------------------------------------
// Value

/// A value that can travel through an accessor chain.
///
/// Every `'static + Clone + Send + Sync` type is a `Value`; there is nothing
/// to implement. Values read out of a chain are owned clones, so mutating a
/// read value never affects its source unless it is written back.
///
/// Note that `Box<dyn Value>` is deliberately *not* a `Value` itself, which
/// keeps method calls on boxes dispatching to the boxed value.
///
/// # Examples
///
/// ```
/// use vc_bind::Value;
///
/// let boxed: Box<dyn Value> = Box::new(3_u32);
/// assert!(boxed.is::<u32>());
/// assert_eq!(boxed.downcast_ref::<u32>(), Some(&3));
/// assert_eq!(boxed.take::<u32>().ok(), Some(3));
/// ```
pub trait Value: Any + Send + Sync {
    /// Upcasts to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcasts to `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Clones the value into a new box.
    fn clone_value(&self) -> Box<dyn Value>;

    /// Returns the [`TypeId`] of the concrete value.
    fn value_type_id(&self) -> TypeId;

    /// Returns the full type name of the concrete value.
    fn value_type_name(&self) -> &'static str;
}

impl<T: Any + Clone + Send + Sync> Value for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    #[inline]
    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    #[inline]
    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

impl<'a> dyn Value + 'a {
    /// Returns `true` if the boxed value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.value_type_id() == TypeId::of::<T>()
    }

    /// Returns a reference to the inner value if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns a mutable reference to the inner value if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Unboxes the value as a `T`, handing the box back on mismatch.
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, Box<Self>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("type id was checked above"),
        }
    }

    /// Returns the runtime [`Type`] of the concrete value.
    #[inline]
    pub fn runtime_type(&self) -> Type {
        Type::from_raw(self.value_type_id(), self.value_type_name())
    }
}

impl<'a> fmt::Debug for dyn Value + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", ShortName(self.value_type_name()))
    }
}

// -----------------------------------------------------------------------------
// Type

/// Runtime identity of a type: its [`TypeId`] and its full type name.
///
/// Equality and hashing only consider the [`TypeId`].
/// `Display` prints the short name (module paths stripped).
///
/// # Examples
///
/// ```
/// use vc_bind::Type;
///
/// let ty = Type::of::<Vec<String>>();
/// assert!(ty.is::<Vec<String>>());
/// assert_eq!(ty.to_string(), "Vec<String>");
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    /// Creates the [`Type`] of `T`.
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub(crate) const fn from_raw(id: TypeId, path: &'static str) -> Self {
        Self { id, path }
    }

    /// Returns the [`TypeId`].
    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name, e.g. `alloc::vec::Vec<u8>`.
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the type name without module paths, e.g. `Vec<u8>`.
    pub fn short_name(&self) -> String {
        alloc::format!("{}", ShortName(self.path))
    }

    /// Check if the given type matches this one.
    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&ShortName(self.path), f)
    }
}

/// Displays a type path with every `module::` qualifier removed.
pub(crate) struct ShortName<'a>(pub &'a str);

impl fmt::Display for ShortName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while !rest.is_empty() {
            let end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let (ident, tail) = rest.split_at(end);
            if let Some(after) = tail.strip_prefix("::") {
                rest = after;
                continue;
            }
            f.write_str(ident)?;
            let mut chars = tail.chars();
            match chars.next() {
                Some(c) => {
                    write!(f, "{c}")?;
                    rest = chars.as_str();
                }
                None => rest = "",
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Semantics

/// How a container behaves when a value is read out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantics {
    /// Reading produces an independent copy. Mutating the copy requires
    /// writing it back into the parent.
    Value,
    /// Reading produces a handle to the same object. Mutations through the
    /// handle are visible to every holder.
    Reference,
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.pad("value"),
            Self::Reference => f.pad("reference"),
        }
    }
}

// -----------------------------------------------------------------------------
// Shared

/// A reference-semantics handle: cloning shares the same object.
///
/// Paths resolve members of `T` through a `Shared<T>` transparently.
/// Because the object is shared, writes below a `Shared` hop are never
/// written back into the container that holds the handle.
///
/// Lock poisoning is ignored: a panicked writer leaves the last stored state.
///
/// # Examples
///
/// ```
/// use vc_bind::Shared;
///
/// let a = Shared::new(1_i32);
/// let b = a.clone();
/// *b.write() = 2;
/// assert_eq!(*a.read(), 2);
/// assert!(a.ptr_eq(&b));
/// ```
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    /// Creates a new handle owning `value`.
    #[inline]
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Locks the object for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the object for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point at the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the address of the shared object, stable for its lifetime.
    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<T: Clone> Shared<T> {
    /// Returns a clone of the current object.
    #[inline]
    pub fn get(&self) -> T {
        self.read().clone()
    }

    /// Replaces the current object.
    #[inline]
    pub fn set(&self, value: T) {
        *self.write() = value;
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Shared<T> {
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.read()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ShortName, Type, Value};
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn short_names() {
        assert_eq!(format!("{}", ShortName("alloc::string::String")), "String");
        assert_eq!(
            format!("{}", ShortName("alloc::vec::Vec<core::option::Option<my::Foo>>")),
            "Vec<Option<Foo>>"
        );
        assert_eq!(format!("{}", ShortName("[f32; 4]")), "[f32; 4]");
        assert_eq!(format!("{}", ShortName("(u8, a::B)")), "(u8, B)");
    }

    #[test]
    fn boxed_value_dispatches_to_inner() {
        let boxed: Box<dyn Value> = Box::new(Vec::<u8>::new());
        assert!(boxed.is::<Vec<u8>>());
        assert_eq!(boxed.runtime_type(), Type::of::<Vec<u8>>());

        let cloned = boxed.clone_value();
        assert!(cloned.is::<Vec<u8>>());

        let err = boxed.take::<String>().unwrap_err();
        assert!(err.is::<Vec<u8>>());
    }
}
