//! Extension point for path segments the type table cannot describe.
//!
//! A provider segment `[@id:path]` is resolved by the [`PathProvider`]
//! registered under `id`. The provider turns `path` into an
//! [`ExternalAccessor`] for the current source type.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::access::Access;
use crate::error::{AccessError, ResolveError};
use crate::value::{Type, Value};

pub use crate::node::ExternalAccessor;

// -----------------------------------------------------------------------------
// PathProvider

/// Resolves provider segments registered under one id.
///
/// See [`MaterialProvider`](crate::material::MaterialProvider) for an
/// implementation.
pub trait PathProvider: Send + Sync {
    /// Returns the id used in `[@id:path]` segments.
    fn id(&self) -> &str;

    /// Maps a stored path id to the path the provider resolves, e.g. to
    /// migrate renamed properties.
    ///
    /// Returns `None` if the id is not known.
    fn try_convert_id_to_path(&self, path_id: &str) -> Option<String> {
        Some(String::from(path_id))
    }

    /// Lists the paths `source` currently offers.
    fn available_paths(&self, source: &dyn Value) -> Vec<String>;

    /// Creates the accessor for `path_id` on values of `source_type`.
    fn accessor(
        &self,
        source_type: Type,
        path_id: &str,
    ) -> Result<Box<dyn ExternalAccessor>, ResolveError>;
}

// -----------------------------------------------------------------------------
// ProviderPolicy

/// What resolution does when a provider segment fails: the id is not
/// registered, or the provider rejects the path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPolicy {
    /// Fail with [`ResolveError::UnregisteredProvider`] or
    /// [`ResolveError::Provider`].
    #[default]
    Fail,
    /// Report a [`Diagnostic`] and resolve to an [`UnavailableAccessor`].
    Diagnose,
}

/// Passed to the diagnostic hook of a
/// [`Resolver`](crate::Resolver::set_diagnostic_hook).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The root type resolution started from.
    pub ty: Type,
    /// The full path being resolved.
    pub path: String,
    /// What went wrong.
    pub error: ResolveError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` on `{}`: {}", self.path, self.ty, self.error)
    }
}

pub(crate) type DiagnosticHook = Box<dyn Fn(&Diagnostic) + Send + Sync>;

// -----------------------------------------------------------------------------
// UnavailableAccessor

/// Stands in for a path whose provider segment failed. Neither readable
/// nor writable.
#[derive(Debug, Clone)]
pub struct UnavailableAccessor {
    object_type: Type,
    reason: String,
}

impl UnavailableAccessor {
    pub(crate) fn new(object_type: Type, error: &ResolveError) -> Self {
        Self {
            object_type,
            reason: format!("{error}"),
        }
    }

    fn error(&self) -> AccessError {
        AccessError::Unavailable {
            reason: self.reason.clone(),
        }
    }
}

impl Access for UnavailableAccessor {
    #[inline]
    fn object_type(&self) -> Type {
        self.object_type
    }

    #[inline]
    fn value_type(&self) -> Type {
        Type::of::<()>()
    }

    #[inline]
    fn can_read(&self) -> bool {
        false
    }

    #[inline]
    fn can_write(&self) -> bool {
        false
    }

    fn get_value(&self, _: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        Err(self.error())
    }

    fn set_value(&self, _: &mut dyn Value, _: Box<dyn Value>) -> Result<(), AccessError> {
        Err(self.error())
    }

    fn duplicate(&self) -> Box<dyn Access> {
        Box::new(self.clone())
    }
}
