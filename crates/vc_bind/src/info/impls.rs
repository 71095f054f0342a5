use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::BuildHasher;

use std::collections::HashMap;

use crate::error::AccessError;
use crate::info::{ArrayRank, Bindable, DescriptorBuilder, TypeDescriptor, address_identity};
use crate::value::{Shared, Value};

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {$(
        impl Bindable for $ty {
            fn descriptor() -> TypeDescriptor {
                DescriptorBuilder::<Self>::new().default().build()
            }
        }
    )*};
}

impl_primitive!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl Bindable for String {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .readonly_property("len", |s| s.len())
            .default()
            .build()
    }
}

// -----------------------------------------------------------------------------
// Sequences

/// Resolves a rank one raw array hop.
fn single_index(indices: &[usize], len: usize) -> Result<usize, AccessError> {
    match *indices {
        [index] if index < len => Ok(index),
        [index] => Err(AccessError::OutOfRange { index: index as i64, len }),
        _ => Err(AccessError::RankMismatch {
            expected: 1,
            actual: indices.len(),
        }),
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .list::<T>(Vec::len, |v, i| v.get(i), |v, i| v.get_mut(i))
            .array::<T>(
                ArrayRank::Fixed(1),
                |v, ix| Ok(&v[single_index(ix, v.len())?]),
                |v, ix| {
                    let index = single_index(ix, v.len())?;
                    Ok(&mut v[index])
                },
            )
            .readonly_property("len", |v| v.len())
            .default()
            .build()
    }
}

impl<T: Bindable> Bindable for VecDeque<T> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .list::<T>(VecDeque::len, |v, i| v.get(i), |v, i| v.get_mut(i))
            .array::<T>(
                ArrayRank::Fixed(1),
                |v, ix| Ok(&v[single_index(ix, v.len())?]),
                |v, ix| {
                    let index = single_index(ix, v.len())?;
                    Ok(&mut v[index])
                },
            )
            .readonly_property("len", |v| v.len())
            .default()
            .build()
    }
}

impl<T: Bindable, const N: usize> Bindable for [T; N] {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .list::<T>(|_| N, |v, i| v.get(i), |v, i| v.get_mut(i))
            .array::<T>(
                ArrayRank::Fixed(1),
                |v, ix| Ok(&v[single_index(ix, N)?]),
                |v, ix| Ok(&mut v[single_index(ix, N)?]),
            )
            .build()
    }
}

// -----------------------------------------------------------------------------
// Dictionaries

impl<V, S> Bindable for HashMap<String, V, S>
where
    V: Bindable,
    S: BuildHasher + Default + Clone + Send + Sync + 'static,
{
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .map::<String, V>(|m, k| m.get(k), |m, k| m.get_mut(k))
            .readonly_property("len", |m| m.len())
            .default()
            .build()
    }
}

impl<V: Bindable> Bindable for BTreeMap<String, V> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .map::<String, V>(|m, k| m.get(k), |m, k| m.get_mut(k))
            .readonly_property("len", |m| m.len())
            .default()
            .build()
    }
}

// -----------------------------------------------------------------------------
// Wrappers

impl<T: Bindable> Bindable for Option<T> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .optional::<T>(Option::as_ref, Option::as_mut, |o, v| *o = Some(v))
            .readonly_property("is_some", |o| o.is_some())
            .default()
            .build()
    }
}

fn shared_identity<T: Bindable>(value: &dyn Value) -> usize {
    value
        .downcast_ref::<Shared<T>>()
        .map_or_else(|| address_identity(value), Shared::addr)
}

impl<T: Bindable> Bindable for Shared<T> {
    fn descriptor() -> TypeDescriptor {
        DescriptorBuilder::<Self>::new()
            .shared::<T>(|s| s)
            .identity(shared_identity::<T>)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::info::{ElementKind, TypeTable};
    use crate::value::{Semantics, Shared, Value};

    #[test]
    fn containers_register_their_elements() {
        let mut table = TypeTable::empty();
        table.register::<Vec<Option<Shared<[u8; 4]>>>>();

        assert!(table.contains_of::<Option<Shared<[u8; 4]>>>());
        assert!(table.contains_of::<Shared<[u8; 4]>>());
        assert!(table.contains_of::<[u8; 4]>());
        assert!(table.contains_of::<u8>());

        let shared = table.get_of::<Shared<[u8; 4]>>().unwrap();
        assert_eq!(shared.semantics(), Semantics::Reference);
        assert!(shared.wrapper().unwrap().inner().is::<[u8; 4]>());
    }

    #[test]
    fn shared_identity_follows_the_object() {
        let mut table = TypeTable::empty();
        table.register::<Shared<u32>>();
        let desc = table.get_of::<Shared<u32>>().unwrap();

        let a = Shared::new(1_u32);
        let b = a.clone();
        let c = Shared::new(1_u32);
        assert_eq!((desc.identity)(&a), (desc.identity)(&b));
        assert_ne!((desc.identity)(&a), (desc.identity)(&c));
    }

    #[test]
    fn list_out_of_range_is_reported() {
        let mut table = TypeTable::empty();
        table.register::<Vec<String>>();
        let element = table.get_of::<Vec<String>>().unwrap().element.clone().unwrap();
        assert_eq!(element.kind, ElementKind::List);

        let list = vec![String::from("a")];
        let err = (element.get)(&list as &dyn Value, &5_usize as &dyn Value)
            .err()
            .unwrap();
        assert_eq!(
            err,
            crate::error::AccessError::OutOfRange { index: 5, len: 1 }
        );
    }
}
