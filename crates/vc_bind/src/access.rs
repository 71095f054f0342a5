use alloc::boxed::Box;
use alloc::format;
use core::fmt;
use core::marker::PhantomData;

use crate::concurrent::ConcurrentAccessor;
use crate::error::{AccessError, expect_owned};
use crate::info::address_identity;
use crate::node::Param;
use crate::value::{Type, Value};

// -----------------------------------------------------------------------------
// Access

/// A resolved path: reads and writes one value relative to a root object.
///
/// Accessors are `Send` but generally not `Sync`; every duplicate owns
/// private scratch state. Use [`make_concurrent`](Access::make_concurrent)
/// to share one between threads.
///
/// # Examples
///
/// ```
/// use vc_bind::{Access, Bindable, Resolver};
///
/// #[derive(Bindable, Clone, Default)]
/// struct Inner {
///     x: i32,
/// }
///
/// #[derive(Bindable, Clone, Default)]
/// struct Outer {
///     inner: Inner,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Outer>();
///
/// let accessor = resolver.resolve_of::<Outer>("inner.x").unwrap();
/// let mut outer = Outer::default();
/// accessor.set_value(&mut outer, Box::new(5_i32)).unwrap();
/// assert_eq!(outer.inner.x, 5);
/// ```
pub trait Access: Send {
    /// Returns the root type the accessor is applied to.
    fn object_type(&self) -> Type;

    /// Returns the type of the accessed value.
    fn value_type(&self) -> Type;

    /// Returns `true` if [`get_value`](Access::get_value) can succeed.
    fn can_read(&self) -> bool;

    /// Returns `true` if [`set_value`](Access::set_value) can succeed.
    fn can_write(&self) -> bool;

    /// Reads the value out of `target`.
    fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError>;

    /// Writes `value` into `target`.
    ///
    /// A value of another type than [`value_type`](Access::value_type) is
    /// converted first.
    fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError>;

    /// Creates an independent accessor for the same path.
    ///
    /// The duplicate shares the immutable chain but gets its own scratch
    /// state; parameter bindings are carried over.
    fn duplicate(&self) -> Box<dyn Access>;

    /// Returns the key identifying `target` for instance-scoped locking.
    fn instance_key(&self, target: &dyn Value) -> usize {
        address_identity(target)
    }

    /// Binds parameter `slot` of hop `hop`.
    fn bind_parameter(&self, hop: usize, slot: usize, param: Param) -> Result<(), AccessError> {
        let _ = (hop, slot, param);
        Err(AccessError::Unavailable {
            reason: format!("`{}` has no parameters", self.value_type()),
        })
    }

    /// Wraps a duplicate of this accessor for use from several threads.
    fn make_concurrent(&self) -> ConcurrentAccessor {
        ConcurrentAccessor::new(self.duplicate())
    }
}

impl fmt::Debug for dyn Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Access")
            .field("object_type", &self.object_type())
            .field("value_type", &self.value_type())
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypedAccessor

/// A statically typed view of an accessor from `R` to `V`.
///
/// Created by [`Resolver::resolve_as`](crate::Resolver::resolve_as).
///
/// # Examples
///
/// ```
/// use vc_bind::{Bindable, Resolver};
///
/// #[derive(Bindable, Clone, Default)]
/// struct Slider {
///     value: f32,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Slider>();
///
/// // The path reads an `f32`; the consumer asks for an `f64`.
/// let value = resolver.resolve_as::<Slider, f64>("value").unwrap();
/// let mut slider = Slider::default();
/// value.set(&mut slider, 0.5).unwrap();
/// assert_eq!(slider.value, 0.5);
/// assert_eq!(value.get(&slider).unwrap(), 0.5);
/// ```
pub struct TypedAccessor<R, V> {
    inner: Box<dyn Access>,
    _marker: PhantomData<fn(&R) -> V>,
}

impl<R: Value, V: Value> TypedAccessor<R, V> {
    /// Wraps `inner`, which must access a `V` on an `R`.
    pub(crate) fn new(inner: Box<dyn Access>) -> Self {
        debug_assert!(inner.object_type().is::<R>());
        debug_assert!(inner.value_type().is::<V>());
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Reads the value out of `root`.
    #[inline]
    pub fn get(&self, root: &R) -> Result<V, AccessError> {
        expect_owned(self.inner.get_value(root)?)
    }

    /// Writes `value` into `root`.
    #[inline]
    pub fn set(&self, root: &mut R, value: V) -> Result<(), AccessError> {
        self.inner.set_value(root, Box::new(value))
    }

    #[inline]
    pub fn can_read(&self) -> bool {
        self.inner.can_read()
    }

    #[inline]
    pub fn can_write(&self) -> bool {
        self.inner.can_write()
    }

    /// Binds parameter `slot` of hop `hop`, see [`Access::bind_parameter`].
    #[inline]
    pub fn bind_parameter(&self, hop: usize, slot: usize, param: Param) -> Result<(), AccessError> {
        self.inner.bind_parameter(hop, slot, param)
    }

    /// Returns the untyped accessor.
    #[inline]
    pub fn as_access(&self) -> &dyn Access {
        &*self.inner
    }

    /// Unwraps the untyped accessor.
    #[inline]
    pub fn into_inner(self) -> Box<dyn Access> {
        self.inner
    }
}

impl<R: Value, V: Value> Clone for TypedAccessor<R, V> {
    fn clone(&self) -> Self {
        Self::new(self.inner.duplicate())
    }
}

impl<R, V> fmt::Debug for TypedAccessor<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedAccessor").field(&self.inner).finish()
    }
}
