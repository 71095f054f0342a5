//! Value conversions between the type a path produces and the type its
//! consumer asks for.
//!
//! A [`ConverterBridge`] picks its conversions in this order:
//!
//! 1. typed converters supplied by the consumer, see [`Converters::typed`],
//! 2. weak converters supplied by the consumer, see [`Converters::weak`],
//! 3. value providers declared by either type,
//! 4. the defaults of the [`ConverterRegistry`].

// -----------------------------------------------------------------------------
// Modules

mod bridge;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use bridge::ConverterBridge;
pub use registry::ConverterRegistry;

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{AccessError, expect_ref};
use crate::info::{ConvertFn, convert_fn};
use crate::value::{Type, Value};

// -----------------------------------------------------------------------------
// WeakConverter

/// A converter deciding at runtime which pairs of types it handles.
///
/// # Examples
///
/// ```
/// use vc_bind::{AccessError, Type, Value};
/// use vc_bind::convert::WeakConverter;
///
/// /// Formats anything `i32`-like as a percentage.
/// struct Percent;
///
/// impl WeakConverter for Percent {
///     fn can_convert(&self, from: Type, to: Type) -> bool {
///         from.is::<i32>() && to.is::<String>()
///     }
///
///     fn convert(&self, value: &dyn Value, _to: Type) -> Result<Box<dyn Value>, AccessError> {
///         let v = value.downcast_ref::<i32>().ok_or(AccessError::NotReadable)?;
///         Ok(Box::new(format!("{v}%")))
///     }
/// }
/// ```
pub trait WeakConverter: Send + Sync {
    /// Returns `true` if values of `from` can be converted to `to`.
    fn can_convert(&self, from: Type, to: Type) -> bool;

    /// Converts `value` to `to`.
    fn convert(&self, value: &dyn Value, to: Type) -> Result<Box<dyn Value>, AccessError>;
}

// -----------------------------------------------------------------------------
// Converters

/// Converters supplied by a consumer when resolving a path to a requested
/// type.
///
/// # Examples
///
/// ```
/// use vc_bind::convert::Converters;
///
/// let converters = Converters::new()
///     .typed(|v: &bool| Ok(if *v { 1.0_f32 } else { 0.0 }))
///     .typed(|v: &f32| Ok(*v > 0.5));
/// assert_eq!(converters.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Converters {
    typed: Vec<(Type, Type, ConvertFn)>,
    weak: Vec<Arc<dyn WeakConverter>>,
}

impl Converters {
    /// Creates an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a conversion from `A` to `B`.
    pub fn typed<A: Value, B: Value>(
        mut self,
        f: impl Fn(&A) -> Result<B, AccessError> + Send + Sync + 'static,
    ) -> Self {
        let convert = convert_fn(move |v| Ok(Box::new(f(expect_ref::<A>(v)?)?) as Box<dyn Value>));
        self.typed.push((Type::of::<A>(), Type::of::<B>(), convert));
        self
    }

    /// Adds a weak converter.
    pub fn weak(mut self, converter: impl WeakConverter + 'static) -> Self {
        self.weak.push(Arc::new(converter));
        self
    }

    /// Returns the number of converters.
    #[inline]
    pub fn len(&self) -> usize {
        self.typed.len() + self.weak.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the first typed, then the first weak converter from `from`
    /// to `to`.
    pub(crate) fn find(&self, from: Type, to: Type) -> Option<ConvertFn> {
        if let Some((_, _, f)) = self.typed.iter().find(|(a, b, _)| *a == from && *b == to) {
            return Some(f.clone());
        }
        let weak = self.weak.iter().find(|c| c.can_convert(from, to))?.clone();
        Some(convert_fn(move |v| weak.convert(v, to)))
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field(
                "typed",
                &self.typed.iter().map(|(a, b, _)| (a, b)).collect::<Vec<_>>(),
            )
            .field("weak", &self.weak.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::{Converters, WeakConverter};
    use crate::error::AccessError;
    use crate::value::{Type, Value};

    struct Anything;

    impl WeakConverter for Anything {
        fn can_convert(&self, _: Type, to: Type) -> bool {
            to.is::<String>()
        }

        fn convert(&self, _: &dyn Value, _: Type) -> Result<Box<dyn Value>, AccessError> {
            Ok(Box::new(String::from("weak")))
        }
    }

    #[test]
    fn typed_before_weak() {
        let converters = Converters::new()
            .weak(Anything)
            .typed(|v: &i32| Ok(alloc::format!("typed {v}")));

        let f = converters.find(Type::of::<i32>(), Type::of::<String>()).unwrap();
        assert_eq!(f(&3_i32).unwrap().downcast_ref::<String>().unwrap(), "typed 3");

        let f = converters.find(Type::of::<u8>(), Type::of::<String>()).unwrap();
        assert_eq!(f(&3_u8).unwrap().downcast_ref::<String>().unwrap(), "weak");

        assert!(converters.find(Type::of::<u8>(), Type::of::<i32>()).is_none());
    }
}
