use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use fastvec::FastVec;

use crate::convert::ConverterRegistry;
use crate::error::AccessError;
use crate::value::{Shared, Type, Value};

// -----------------------------------------------------------------------------
// ValueProvider

/// A source of parameter values that is queried on every access.
///
/// Closures returning a boxed value and [`Shared`] handles are providers.
///
/// # Examples
///
/// ```
/// use vc_bind::Shared;
/// use vc_bind::node::ValueProvider;
///
/// let index = Shared::new(2_usize);
/// let provided = index.provide().unwrap();
/// assert_eq!(provided.downcast_ref::<usize>(), Some(&2));
/// ```
pub trait ValueProvider: Send + Sync {
    /// Produces the current value.
    fn provide(&self) -> Result<Box<dyn Value>, AccessError>;
}

impl<F> ValueProvider for F
where
    F: Fn() -> Result<Box<dyn Value>, AccessError> + Send + Sync,
{
    #[inline]
    fn provide(&self) -> Result<Box<dyn Value>, AccessError> {
        self()
    }
}

impl<T: Value> ValueProvider for Shared<T> {
    #[inline]
    fn provide(&self) -> Result<Box<dyn Value>, AccessError> {
        Ok(self.read().clone_value())
    }
}

// -----------------------------------------------------------------------------
// Param

/// One parameter slot of an indexer, method or element hop.
pub enum Param {
    /// A value fixed when the path was resolved, e.g. the `2` in `items[2]`.
    Const(Box<dyn Value>),
    /// A value queried from a provider on every access.
    Dynamic(Arc<dyn ValueProvider>),
    /// A `$n` placeholder or a method parameter nobody bound yet.
    Unbound,
}

impl Param {
    /// Creates a [`Param::Const`].
    #[inline]
    pub fn value<T: Value>(value: T) -> Self {
        Self::Const(Box::new(value))
    }

    /// Creates a [`Param::Dynamic`].
    #[inline]
    pub fn provider(provider: impl ValueProvider + 'static) -> Self {
        Self::Dynamic(Arc::new(provider))
    }
}

impl Clone for Param {
    fn clone(&self) -> Self {
        match self {
            Self::Const(v) => Self::Const((**v).clone_value()),
            Self::Dynamic(p) => Self::Dynamic(Arc::clone(p)),
            Self::Unbound => Self::Unbound,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
            Self::Unbound => f.write_str("Unbound"),
        }
    }
}

// -----------------------------------------------------------------------------
// Bindings

/// Parameter bindings of one accessor duplicate, overriding the slots of
/// the shared chain.
#[derive(Clone, Default)]
pub(crate) struct Bindings(Vec<(usize, usize, Param)>);

impl Bindings {
    #[inline]
    pub fn get(&self, hop: usize, slot: usize) -> Option<&Param> {
        self.0
            .iter()
            .find(|(h, s, _)| *h == hop && *s == slot)
            .map(|(_, _, p)| p)
    }

    pub fn set(&mut self, hop: usize, slot: usize, param: Param) {
        match self.0.iter_mut().find(|(h, s, _)| *h == hop && *s == slot) {
            Some(entry) => entry.2 = param,
            None => self.0.push((hop, slot, param)),
        }
    }
}

// -----------------------------------------------------------------------------
// Evaluation

/// Everything a hop needs besides its target.
pub(crate) struct CallEnv<'s> {
    pub bindings: &'s Bindings,
    pub registry: &'s ConverterRegistry,
    pub indices: &'s mut Vec<usize>,
}

/// An evaluated argument.
pub(crate) enum Arg<'a> {
    Borrowed(&'a dyn Value),
    Owned(Box<dyn Value>),
}

impl Arg<'_> {
    #[inline]
    pub fn as_value(&self) -> &dyn Value {
        match self {
            Self::Borrowed(v) => *v,
            Self::Owned(v) => &**v,
        }
    }
}

pub(crate) type Args<'a> = FastVec<Arg<'a>, 4>;

/// Evaluates the parameter slots of hop `hop`.
pub(crate) fn evaluate<'a>(
    hop: usize,
    params: &'a [Param],
    types: &[Type],
    bindings: &'a Bindings,
    registry: &ConverterRegistry,
) -> Result<Args<'a>, AccessError> {
    params
        .iter()
        .enumerate()
        .map(|(slot, param)| {
            match bindings.get(hop, slot).unwrap_or(param) {
                Param::Const(v) => Ok(Arg::Borrowed(&**v)),
                Param::Dynamic(p) => Ok(Arg::Owned(registry.coerce(p.provide()?, types[slot])?)),
                Param::Unbound => Err(AccessError::UnboundParameter { slot }),
            }
        })
        .collect()
}

/// Reads an evaluated argument as an index.
pub(crate) fn as_index(arg: &dyn Value) -> Result<usize, AccessError> {
    arg.downcast_ref::<usize>()
        .copied()
        .ok_or_else(|| AccessError::mismatch::<usize>(arg))
}
