use alloc::boxed::Box;
use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::access::Access;
use crate::error::AccessError;
use crate::info::DefaultFn;
use crate::node::Param;
use crate::value::{Type, Value};

/// Wraps accessors resolved while [`ResolverConfig::safe_mode`] is on.
///
/// A failed read yields the default value of the value type, if one is
/// registered. A panicking write is caught and reported as
/// [`AccessError::Panicked`]; ordinary write errors pass through.
///
/// [`ResolverConfig::safe_mode`]: crate::ResolverConfig::safe_mode
pub struct SafeAccessor {
    inner: Box<dyn Access>,
    default: Option<DefaultFn>,
}

impl SafeAccessor {
    pub(crate) fn new(inner: Box<dyn Access>, default: Option<DefaultFn>) -> Self {
        Self { inner, default }
    }

    /// Returns the wrapped accessor.
    #[inline]
    pub fn inner(&self) -> &dyn Access {
        &*self.inner
    }
}

impl Access for SafeAccessor {
    #[inline]
    fn object_type(&self) -> Type {
        self.inner.object_type()
    }

    #[inline]
    fn value_type(&self) -> Type {
        self.inner.value_type()
    }

    #[inline]
    fn can_read(&self) -> bool {
        self.inner.can_read()
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.inner.can_write()
    }

    fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        match (self.inner.get_value(target), self.default) {
            (Ok(value), _) => Ok(value),
            (Err(err), Some(default)) => {
                log::debug!("read of `{}` failed ({err}), using the default", self.value_type());
                Ok(default())
            }
            (Err(err), None) => Err(err),
        }
    }

    fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
        let ty = self.inner.value_type();
        catch_unwind(AssertUnwindSafe(|| self.inner.set_value(target, value))).unwrap_or_else(|_| {
            log::warn!("a write of `{ty}` into `{}` panicked", self.object_type());
            Err(AccessError::Panicked { ty })
        })
    }

    fn duplicate(&self) -> Box<dyn Access> {
        Box::new(Self::new(self.inner.duplicate(), self.default))
    }

    #[inline]
    fn instance_key(&self, target: &dyn Value) -> usize {
        self.inner.instance_key(target)
    }

    #[inline]
    fn bind_parameter(&self, hop: usize, slot: usize, param: Param) -> Result<(), AccessError> {
        self.inner.bind_parameter(hop, slot, param)
    }
}

impl fmt::Debug for SafeAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeAccessor")
            .field("inner", &self.inner)
            .field("default", &self.default.is_some())
            .finish()
    }
}
