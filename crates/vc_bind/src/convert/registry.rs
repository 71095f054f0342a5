use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::any::TypeId;
use core::fmt::Display;
use core::str::FromStr;

use std::sync::OnceLock;

use crate::error::{AccessError, expect_ref};
use crate::hash::HashMap;
use crate::info::{ConvertFn, TypeTable, ValueProviderInfo, VariantTable, convert_fn};
use crate::value::{Type, Value};

// -----------------------------------------------------------------------------
// Numbers

trait Number: Value + Copy + Display + FromStr {
    const INTEGRAL: bool;

    fn to_f64(self) -> f64;
    fn to_i128(self) -> Option<i128>;
    fn from_f64(v: f64) -> Option<Self>;
    fn from_i128(v: i128) -> Option<Self>;
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl Number for $ty {
            const INTEGRAL: bool = true;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i128(self) -> Option<i128> {
                i128::try_from(self).ok()
            }

            fn from_f64(v: f64) -> Option<Self> {
                if !v.is_finite() {
                    return None;
                }
                // `as` truncates toward zero and saturates; a saturated
                // result lands more than one unit away from `v`.
                let t = v as Self;
                let back = t as f64;
                (back > v - 1.0 && back < v + 1.0).then_some(t)
            }

            #[inline]
            fn from_i128(v: i128) -> Option<Self> {
                Self::try_from(v).ok()
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl Number for $ty {
            const INTEGRAL: bool = false;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i128(self) -> Option<i128> {
                None
            }

            fn from_f64(v: f64) -> Option<Self> {
                let t = v as Self;
                (t.is_finite() || !v.is_finite()).then_some(t)
            }

            #[inline]
            fn from_i128(v: i128) -> Option<Self> {
                Self::from_f64(v as f64)
            }
        }
    )*};
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_float!(f32, f64);

fn number_cast<A: Number, B: Number>(a: A) -> Option<B> {
    if A::INTEGRAL && B::INTEGRAL {
        B::from_i128(a.to_i128()?)
    } else {
        B::from_f64(a.to_f64())
    }
}

type ConversionTable = HashMap<(TypeId, TypeId), ConvertFn>;

fn failure<A: 'static, B: 'static>() -> AccessError {
    AccessError::ConversionFailure {
        from: Type::of::<A>(),
        to: Type::of::<B>(),
    }
}

fn insert<A: Value, B: Value>(table: &mut ConversionTable, f: fn(&A) -> Option<B>) {
    table.insert(
        (TypeId::of::<A>(), TypeId::of::<B>()),
        convert_fn(move |v| match f(expect_ref::<A>(v)?) {
            Some(b) => Ok(Box::new(b) as Box<dyn Value>),
            None => Err(failure::<A, B>()),
        }),
    );
}

fn insert_textual<A: Value + Display + FromStr>(table: &mut ConversionTable) {
    insert::<A, String>(table, |a| Some(format!("{a}")));
    insert::<String, A>(table, |s| s.trim().parse().ok());
}

macro_rules! numeric_row {
    ($table:ident, $from:ty => $($to:ty),*) => {$(
        if TypeId::of::<$from>() != TypeId::of::<$to>() {
            insert::<$from, $to>($table, |a| number_cast::<$from, $to>(*a));
        }
    )*};
}

macro_rules! numeric_table {
    ($table:ident: $($ty:ty),*) => {$(
        numeric_row!($table, $ty => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
        insert_textual::<$ty>($table);
    )*};
}

fn builtin() -> &'static ConversionTable {
    static BUILTIN: OnceLock<ConversionTable> = OnceLock::new();

    BUILTIN.get_or_init(|| {
        let mut table = ConversionTable::default();
        let table_ref = &mut table;
        numeric_table!(table_ref: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
        insert_textual::<bool>(table_ref);
        insert_textual::<char>(table_ref);
        insert::<bool, i32>(table_ref, |b| Some(i32::from(*b)));
        insert::<i32, bool>(table_ref, |i| Some(*i != 0));
        table
    })
}

// -----------------------------------------------------------------------------
// ConverterRegistry

/// The default conversions between registered types.
///
/// - numeric casts in every direction; narrowing casts are range checked,
///   float to integer casts truncate toward zero;
/// - textual conversions between `String` and numbers, `bool` and `char`;
/// - unit enums to and from their variant names and discriminants;
/// - value-provider adapters declared with
///   [`DescriptorBuilder::value_provider`](crate::info::DescriptorBuilder::value_provider).
///
/// # Examples
///
/// ```
/// use vc_bind::Type;
/// use vc_bind::convert::ConverterRegistry;
///
/// let registry = ConverterRegistry::new();
/// let wide = registry.convert(&7_u8, Type::of::<f64>()).unwrap();
/// assert_eq!(wide.downcast_ref::<f64>(), Some(&7.0));
///
/// assert!(registry.convert(&300_i32, Type::of::<u8>()).is_err());
/// ```
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    variants: HashMap<TypeId, VariantTable>,
    providers: HashMap<TypeId, ValueProviderInfo>,
}

impl ConverterRegistry {
    /// Creates a registry with the built-in conversions only.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that also knows the enums and value providers of
    /// `table`.
    pub fn from_table(table: &TypeTable) -> Self {
        let mut registry = Self::new();
        for desc in table.iter() {
            if let Some(variants) = &desc.variants {
                registry.variants.insert(desc.ty.id(), variants.clone());
            }
            if let Some(provider) = &desc.value_provider {
                registry.providers.insert(desc.ty.id(), provider.clone());
            }
        }
        registry
    }

    /// Returns the default conversion from `from` to `to`.
    pub fn conversion(&self, from: Type, to: Type) -> Option<ConvertFn> {
        if from == to {
            return Some(convert_fn(|v| Ok(v.clone_value())));
        }
        if let Some(f) = builtin().get(&(from.id(), to.id())) {
            return Some(f.clone());
        }
        self.enum_conversion(from, to)
    }

    fn enum_conversion(&self, from: Type, to: Type) -> Option<ConvertFn> {
        if let Some(table) = self.variants.get(&to.id()) {
            let table = table.clone();
            if from.is::<String>() {
                return Some(convert_fn(move |v| {
                    table
                        .by_name(expect_ref::<String>(v)?.trim())
                        .ok_or(AccessError::ConversionFailure { from, to })
                }));
            }
            let to_i64 = if from.is::<i64>() {
                None
            } else {
                Some(builtin().get(&(from.id(), TypeId::of::<i64>()))?.clone())
            };
            return Some(convert_fn(move |v| {
                let discriminant = match &to_i64 {
                    Some(f) => f(v)?,
                    None => v.clone_value(),
                };
                discriminant
                    .downcast_ref::<i64>()
                    .and_then(|d| table.by_discriminant(*d))
                    .ok_or(AccessError::ConversionFailure { from, to })
            }));
        }

        if let Some(table) = self.variants.get(&from.id()) {
            let table = table.clone();
            if to.is::<String>() {
                return Some(convert_fn(move |v| {
                    table
                        .name_of(v)
                        .map(|name| Box::new(String::from(name)) as Box<dyn Value>)
                        .ok_or(AccessError::ConversionFailure { from, to })
                }));
            }
            let from_i64 = if to.is::<i64>() {
                None
            } else {
                Some(builtin().get(&(TypeId::of::<i64>(), to.id()))?.clone())
            };
            return Some(convert_fn(move |v| {
                let discriminant: Box<dyn Value> = Box::new(
                    table
                        .discriminant_of(v)
                        .ok_or(AccessError::ConversionFailure { from, to })?,
                );
                match &from_i64 {
                    Some(f) => f(&*discriminant),
                    None => Ok(discriminant),
                }
            }));
        }

        None
    }

    /// Returns a conversion that goes through a declared value provider of
    /// either side.
    pub fn provider_conversion(&self, from: Type, to: Type) -> Option<ConvertFn> {
        if let Some(provider) = self.providers.get(&from.id()) {
            let get = provider.get.clone();
            if provider.value == to {
                return Some(get);
            }
            let then = self.conversion(provider.value, to)?;
            return Some(convert_fn(move |v| then(&*get(v)?)));
        }
        if let Some(provider) = self.providers.get(&to.id()) {
            let wrap = provider.wrap.clone()?;
            if provider.value == from {
                return Some(wrap);
            }
            let first = self.conversion(from, provider.value)?;
            return Some(convert_fn(move |v| wrap(&*first(v)?)));
        }
        None
    }

    /// Converts `value` to `to` with the default or value-provider conversions.
    pub fn convert(&self, value: &dyn Value, to: Type) -> Result<Box<dyn Value>, AccessError> {
        let from = value.runtime_type();
        match self
            .conversion(from, to)
            .or_else(|| self.provider_conversion(from, to))
        {
            Some(f) => f(value),
            None => Err(AccessError::ConversionFailure { from, to }),
        }
    }

    /// Returns `value` unchanged if it already is a `to`, otherwise converts it.
    #[inline]
    pub fn coerce(&self, value: Box<dyn Value>, to: Type) -> Result<Box<dyn Value>, AccessError> {
        if value.value_type_id() == to.id() {
            Ok(value)
        } else {
            self.convert(&*value, to)
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::ConverterRegistry;
    use crate::error::AccessError;
    use crate::value::{Type, Value};

    fn convert<T: Value>(registry: &ConverterRegistry, value: &dyn Value) -> Result<T, AccessError> {
        registry
            .convert(value, Type::of::<T>())
            .map(|v| v.take::<T>().ok().unwrap())
    }

    #[test]
    fn numeric_casts_are_checked() {
        let r = ConverterRegistry::new();
        assert_eq!(convert::<i64>(&r, &200_u8), Ok(200));
        assert_eq!(convert::<u8>(&r, &255_i64), Ok(255));
        assert!(convert::<u8>(&r, &256_i64).is_err());
        assert!(convert::<u32>(&r, &-1_i32).is_err());
        assert_eq!(convert::<i32>(&r, &-2.75_f32), Ok(-2));
        assert!(convert::<u8>(&r, &-1.0_f64).is_err());
        assert!(convert::<i32>(&r, &f64::NAN).is_err());
        assert!(convert::<f32>(&r, &1e300_f64).is_err());
        assert_eq!(convert::<f32>(&r, &3_usize), Ok(3.0));
    }

    #[test]
    fn textual() {
        let r = ConverterRegistry::new();
        assert_eq!(convert::<String>(&r, &1.5_f32), Ok(String::from("1.5")));
        assert_eq!(convert::<i16>(&r, &String::from(" -12 ")), Ok(-12));
        assert_eq!(convert::<bool>(&r, &String::from("true")), Ok(true));
        assert_eq!(
            convert::<u8>(&r, &String::from("x")),
            Err(AccessError::ConversionFailure {
                from: Type::of::<String>(),
                to: Type::of::<u8>(),
            })
        );
    }

    #[test]
    fn identity_clones() {
        let r = ConverterRegistry::new();
        let f = r.conversion(Type::of::<String>(), Type::of::<String>()).unwrap();
        let out = f(&String::from("same")).unwrap();
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("same"));
        assert!(r.conversion(Type::of::<String>(), Type::of::<()>()).is_none());
    }
}
