use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;

use thiserror::Error;

use crate::path::ParseError;
use crate::value::{Type, Value};

// -----------------------------------------------------------------------------
// AccessError

/// An error raised while reading or writing through an accessor.
///
/// These only occur at get/set time; resolution never produces them.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AccessError {
    #[error("index {index} is out of range for length {len}")]
    OutOfRange { index: i64, len: usize },

    #[error("expected {expected} indices, found {actual}")]
    RankMismatch { expected: usize, actual: usize },

    #[error("key `{key}` is not present")]
    MissingKey { key: String },

    #[error("`{ty}` holds no value")]
    NullValue { ty: Type },

    #[error("type mismatch: expected `{expected}`, found `{actual}`")]
    TypeMismatch { expected: Type, actual: Type },

    #[error("cannot convert `{from}` to `{to}`")]
    ConversionFailure { from: Type, to: Type },

    #[error("the accessor is not readable")]
    NotReadable,

    #[error("the accessor is not writable")]
    NotWritable,

    #[error("parameter slot {slot} has no binding")]
    UnboundParameter { slot: usize },

    #[error("the accessor is unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("{0}")]
    External(String),

    #[error("a write into `{ty}` panicked")]
    Panicked { ty: Type },
}

impl AccessError {
    /// Creates a [`AccessError::TypeMismatch`] for a value that is not a `T`.
    #[inline]
    pub fn mismatch<T: Any>(actual: &dyn Value) -> Self {
        Self::TypeMismatch {
            expected: Type::of::<T>(),
            actual: actual.runtime_type(),
        }
    }
}

/// Downcasts `value` or reports what it actually is.
#[inline]
pub(crate) fn expect_ref<T: Any>(value: &dyn Value) -> Result<&T, AccessError> {
    let actual = value.runtime_type();
    value
        .downcast_ref::<T>()
        .ok_or(AccessError::TypeMismatch {
            expected: Type::of::<T>(),
            actual,
        })
}

/// Mutable counterpart of [`expect_ref`].
#[inline]
pub(crate) fn expect_mut<T: Any>(value: &mut dyn Value) -> Result<&mut T, AccessError> {
    let actual = value.runtime_type();
    value
        .downcast_mut::<T>()
        .ok_or(AccessError::TypeMismatch {
            expected: Type::of::<T>(),
            actual,
        })
}

/// Unboxes `value` or reports what it actually is.
#[inline]
pub(crate) fn expect_owned<T: Any>(value: Box<dyn Value>) -> Result<T, AccessError> {
    value.take::<T>().map_err(|rest| AccessError::mismatch::<T>(&*rest))
}

// -----------------------------------------------------------------------------
// ResolveError

/// An error raised while resolving a path against a type.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("cannot resolve `{segment}` on `{ty}`")]
    UnresolvableSegment { ty: Type, segment: String },

    #[error("no path provider is registered under `{id}`")]
    UnregisteredProvider { id: String },

    #[error("`{ty}` is not registered in the type table")]
    UnregisteredType { ty: Type },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("provider `{id}` failed: {message}")]
    Provider { id: String, message: String },
}

// -----------------------------------------------------------------------------
// RegistrationConflict

/// Returned when an accessor is pre-registered twice for the same key.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("an accessor for `{path}` on `{ty}` is already registered")]
pub struct RegistrationConflict {
    pub ty: Type,
    pub path: String,
}
