use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use crate::access::Access;
use crate::convert::{ConverterRegistry, Converters};
use crate::error::AccessError;
use crate::info::ConvertFn;
use crate::node::Param;
use crate::value::{Type, Value};

/// Adapts an accessor producing `from` values to a consumer of `to` values.
///
/// A missing forward conversion makes the bridge unreadable, a missing
/// reverse conversion makes it unwritable. Neither is an error at
/// resolution time; [`mismatch`](Self::mismatch) reports the cause.
pub struct ConverterBridge {
    inner: Box<dyn Access>,
    from: Type,
    to: Type,
    forward: Option<ConvertFn>,
    reverse: Option<ConvertFn>,
    registry: Arc<ConverterRegistry>,
}

impl ConverterBridge {
    /// Wraps `inner` so that it reads and writes `to` values.
    pub fn new(
        inner: Box<dyn Access>,
        to: Type,
        converters: &Converters,
        registry: Arc<ConverterRegistry>,
    ) -> Self {
        let from = inner.value_type();
        let find = |a: Type, b: Type| {
            converters
                .find(a, b)
                .or_else(|| registry.provider_conversion(a, b))
                .or_else(|| registry.conversion(a, b))
        };
        let forward = find(from, to);
        let reverse = find(to, from);

        log::debug!(
            "bridged `{from}` to `{to}` (forward: {}, reverse: {})",
            forward.is_some(),
            reverse.is_some(),
        );

        Self {
            inner,
            from,
            to,
            forward,
            reverse,
            registry,
        }
    }

    /// Returns the type produced by the wrapped accessor.
    #[inline]
    pub fn from_type(&self) -> Type {
        self.from
    }

    /// Returns the wrapped accessor.
    #[inline]
    pub fn inner(&self) -> &dyn Access {
        &*self.inner
    }

    /// Returns why the bridge cannot read or cannot write, if it cannot.
    pub fn mismatch(&self) -> Option<AccessError> {
        if self.forward.is_none() {
            Some(AccessError::TypeMismatch {
                expected: self.to,
                actual: self.from,
            })
        } else if self.reverse.is_none() {
            Some(AccessError::TypeMismatch {
                expected: self.from,
                actual: self.to,
            })
        } else {
            None
        }
    }
}

impl Access for ConverterBridge {
    #[inline]
    fn object_type(&self) -> Type {
        self.inner.object_type()
    }

    #[inline]
    fn value_type(&self) -> Type {
        self.to
    }

    #[inline]
    fn can_read(&self) -> bool {
        self.forward.is_some() && self.inner.can_read()
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.reverse.is_some() && self.inner.can_write()
    }

    fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        let forward = self.forward.as_ref().ok_or(AccessError::NotReadable)?;
        forward(&*self.inner.get_value(target)?)
    }

    fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
        let reverse = self.reverse.as_ref().ok_or(AccessError::NotWritable)?;
        let value = self.registry.coerce(value, self.to)?;
        self.inner.set_value(target, reverse(&*value)?)
    }

    fn duplicate(&self) -> Box<dyn Access> {
        Box::new(Self {
            inner: self.inner.duplicate(),
            from: self.from,
            to: self.to,
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
            registry: Arc::clone(&self.registry),
        })
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

impl fmt::Debug for ConverterBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterBridge")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("forward", &self.forward.is_some())
            .field("reverse", &self.reverse.is_some())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;

    use super::ConverterBridge;
    use crate::access::Access;
    use crate::convert::{ConverterRegistry, Converters};
    use crate::error::{AccessError, expect_mut, expect_ref};
    use crate::value::{Type, Value};

    /// Accesses an `f32` root as itself.
    struct Itself;

    impl Access for Itself {
        fn object_type(&self) -> Type {
            Type::of::<f32>()
        }
        fn value_type(&self) -> Type {
            Type::of::<f32>()
        }
        fn can_read(&self) -> bool {
            true
        }
        fn can_write(&self) -> bool {
            true
        }
        fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
            Ok(Box::new(*expect_ref::<f32>(target)?))
        }
        fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
            *expect_mut::<f32>(target)? = *expect_ref::<f32>(&*value)?;
            Ok(())
        }
        fn duplicate(&self) -> Box<dyn Access> {
            Box::new(Itself)
        }
    }

    #[test]
    fn registry_defaults() {
        let registry = Arc::new(ConverterRegistry::new());
        let bridge = ConverterBridge::new(
            Box::new(Itself),
            Type::of::<String>(),
            &Converters::new(),
            registry,
        );
        assert!(bridge.can_read() && bridge.can_write());
        assert!(bridge.mismatch().is_none());

        let mut root = 1.5_f32;
        let text = bridge.get_value(&root).unwrap();
        assert_eq!(text.downcast_ref::<String>().unwrap(), "1.5");

        bridge.set_value(&mut root, Box::new(String::from("2.25"))).unwrap();
        assert_eq!(root, 2.25);
        assert!(bridge.set_value(&mut root, Box::new(String::from("x"))).is_err());
    }

    #[test]
    fn missing_conversion_is_not_an_error() {
        #[derive(Clone)]
        struct Opaque;

        let registry = Arc::new(ConverterRegistry::new());
        let bridge = ConverterBridge::new(
            Box::new(Itself),
            Type::of::<Opaque>(),
            &Converters::new(),
            Arc::clone(&registry),
        );
        assert!(!bridge.can_read());
        assert!(!bridge.can_write());
        assert!(matches!(
            bridge.mismatch(),
            Some(AccessError::TypeMismatch { .. })
        ));
        assert_eq!(bridge.get_value(&0.0_f32).unwrap_err(), AccessError::NotReadable);

        // A one-way converter only enables reads.
        let converters = Converters::new().typed(|_: &f32| Ok(Opaque));
        let bridge = ConverterBridge::new(Box::new(Itself), Type::of::<Opaque>(), &converters, registry);
        assert!(bridge.can_read());
        assert!(!bridge.can_write());
    }
}
