use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::error::{AccessError, expect_mut, expect_owned, expect_ref};
use crate::info::descriptor::{
    address_identity, array_fn, array_mut_fn, assign_value, call_fn, call_mut_fn,
    default_value, keyed_fn, keyed_mut_fn, project_fn, project_mut_fn, read_fn, visit_fn,
    visit_mut_fn, widen_fn, write_fn,
};
use crate::info::{
    ArrayInfo, ArrayRank, Bindable, ElementInfo, ElementKind, IdentityFn, IndexerInfo,
    MemberInfo, MemberKind, MethodInfo, NarrowInfo, TypeDescriptor, TypeTable,
    ValueProviderInfo, VariantTable, WrapperInfo,
};
use crate::value::{Semantics, Shared, Type, Value};

/// Clones parameter `slot` out of `args` as a `K`.
fn arg<K: Bindable>(args: &[&dyn Value], slot: usize) -> Result<K, AccessError> {
    let value = args
        .get(slot)
        .ok_or(AccessError::UnboundParameter { slot })?;
    expect_ref::<K>(*value).cloned()
}

/// Reads a list key. Negative literal indices arrive signed.
fn list_index(key: &dyn Value) -> Result<i64, AccessError> {
    match key.downcast_ref::<i64>() {
        Some(index) => Ok(*index),
        None => expect_ref::<usize>(key).map(|index| *index as i64),
    }
}

fn boxed<V: Value>(value: V) -> Box<dyn Value> {
    Box::new(value)
}

/// Builds the [`TypeDescriptor`] of `T`.
///
/// Every capability that names another type registers it as a dependency,
/// so registering `T` in a [`TypeTable`] registers everything reachable
/// from it.
///
/// # Examples
///
/// ```
/// use vc_bind::info::{Bindable, DescriptorBuilder, TypeDescriptor, TypeTable};
///
/// #[derive(Clone, Default)]
/// struct Counter {
///     hits: u32,
/// }
///
/// impl Counter {
///     fn doubled(&self) -> u32 {
///         self.hits * 2
///     }
/// }
///
/// impl Bindable for Counter {
///     fn descriptor() -> TypeDescriptor {
///         DescriptorBuilder::<Self>::new()
///             .field("hits", |c| &c.hits, |c| &mut c.hits)
///             .readonly_property("doubled", Counter::doubled)
///             .default()
///             .build()
///     }
/// }
///
/// let mut table = TypeTable::new();
/// table.register::<Counter>();
///
/// let desc = table.get_of::<Counter>().unwrap();
/// assert_eq!(desc.members().len(), 2);
/// assert!(!desc.find_member("Doubled").unwrap().can_write());
/// ```
pub struct DescriptorBuilder<T: Bindable> {
    desc: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bindable> DescriptorBuilder<T> {
    /// Starts an empty descriptor with value semantics.
    pub fn new() -> Self {
        Self {
            desc: TypeDescriptor {
                ty: Type::of::<T>(),
                semantics: Semantics::Value,
                assign: assign_value::<T>,
                members: Vec::new(),
                indexers: Vec::new(),
                methods: Vec::new(),
                element: None,
                array: None,
                wrapper: None,
                narrowings: Vec::new(),
                value_provider: None,
                variants: None,
                default: None,
                identity: address_identity,
                dependencies: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Finishes the descriptor.
    #[inline]
    pub fn build(self) -> TypeDescriptor {
        self.desc
    }

    /// Registers `D` whenever `T` is registered.
    #[inline]
    pub fn dependency<D: Bindable>(mut self) -> Self {
        self.depend::<D>();
        self
    }

    fn depend<D: Bindable>(&mut self) {
        self.desc.dependencies.push(TypeTable::register::<D>);
    }

    // -------------------------------------------------------------------------
    // Members

    /// Adds a stored field.
    pub fn field<V: Bindable>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.depend::<V>();
        self.desc.members.push(MemberInfo {
            name,
            kind: MemberKind::Field,
            value_type: Type::of::<V>(),
            project: Some(project_fn(move |v| Ok(get(expect_ref::<T>(v)?) as &dyn Value))),
            project_mut: Some(project_mut_fn(move |v| {
                Ok(get_mut(expect_mut::<T>(v)?) as &mut dyn Value)
            })),
            read: None,
            write: None,
        });
        self
    }

    /// Adds a stored field that paths may read but not write.
    pub fn readonly_field<V: Bindable>(mut self, name: &'static str, get: fn(&T) -> &V) -> Self {
        self.depend::<V>();
        self.desc.members.push(MemberInfo {
            name,
            kind: MemberKind::Field,
            value_type: Type::of::<V>(),
            project: Some(project_fn(move |v| Ok(get(expect_ref::<T>(v)?) as &dyn Value))),
            project_mut: None,
            read: None,
            write: None,
        });
        self
    }

    /// Adds a computed property with a getter and a setter.
    pub fn property<V: Bindable>(
        mut self,
        name: &'static str,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
    ) -> Self {
        self.depend::<V>();
        self.desc.members.push(MemberInfo {
            name,
            kind: MemberKind::Property,
            value_type: Type::of::<V>(),
            project: None,
            project_mut: None,
            read: Some(read_fn(move |v| Ok(boxed(get(expect_ref::<T>(v)?))))),
            write: Some(write_fn(move |v, value| {
                let value = expect_owned::<V>(value)?;
                set(expect_mut::<T>(v)?, value);
                Ok(())
            })),
        });
        self
    }

    /// Adds a computed property without a setter.
    pub fn readonly_property<V: Bindable>(mut self, name: &'static str, get: fn(&T) -> V) -> Self {
        self.depend::<V>();
        self.desc.members.push(MemberInfo {
            name,
            kind: MemberKind::Property,
            value_type: Type::of::<V>(),
            project: None,
            project_mut: None,
            read: Some(read_fn(move |v| Ok(boxed(get(expect_ref::<T>(v)?))))),
            write: None,
        });
        self
    }

    // -------------------------------------------------------------------------
    // Indexers

    /// Adds a one-key indexer, addressed as `[key]`.
    pub fn indexer<K: Bindable, V: Bindable>(
        mut self,
        get: fn(&T, K) -> Result<V, AccessError>,
        set: fn(&mut T, K, V) -> Result<(), AccessError>,
    ) -> Self {
        self.depend::<K>();
        self.depend::<V>();
        self.desc.indexers.push(IndexerInfo {
            params: Box::new([Type::of::<K>()]),
            value_type: Type::of::<V>(),
            read: Some(call_fn(move |v, args| {
                get(expect_ref::<T>(v)?, arg::<K>(args, 0)?).map(boxed)
            })),
            write: Some(call_mut_fn(move |v, args, value| {
                let value = expect_owned::<V>(value)?;
                set(expect_mut::<T>(v)?, arg::<K>(args, 0)?, value)
            })),
        });
        self
    }

    /// Adds a one-key indexer without a setter.
    pub fn readonly_indexer<K: Bindable, V: Bindable>(
        mut self,
        get: fn(&T, K) -> Result<V, AccessError>,
    ) -> Self {
        self.depend::<K>();
        self.depend::<V>();
        self.desc.indexers.push(IndexerInfo {
            params: Box::new([Type::of::<K>()]),
            value_type: Type::of::<V>(),
            read: Some(call_fn(move |v, args| {
                get(expect_ref::<T>(v)?, arg::<K>(args, 0)?).map(boxed)
            })),
            write: None,
        });
        self
    }

    /// Adds a two-key indexer, addressed as `[a, b]`.
    pub fn indexer2<K1: Bindable, K2: Bindable, V: Bindable>(
        mut self,
        get: fn(&T, K1, K2) -> Result<V, AccessError>,
        set: fn(&mut T, K1, K2, V) -> Result<(), AccessError>,
    ) -> Self {
        self.depend::<K1>();
        self.depend::<K2>();
        self.depend::<V>();
        self.desc.indexers.push(IndexerInfo {
            params: Box::new([Type::of::<K1>(), Type::of::<K2>()]),
            value_type: Type::of::<V>(),
            read: Some(call_fn(move |v, args| {
                get(expect_ref::<T>(v)?, arg::<K1>(args, 0)?, arg::<K2>(args, 1)?).map(boxed)
            })),
            write: Some(call_mut_fn(move |v, args, value| {
                let value = expect_owned::<V>(value)?;
                let (a, b) = (arg::<K1>(args, 0)?, arg::<K2>(args, 1)?);
                set(expect_mut::<T>(v)?, a, b, value)
            })),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Methods

    fn push_method(&mut self, method: MethodInfo) {
        self.desc.methods.push(method);
    }

    /// Adds a method without parameters, addressed as `name()`.
    pub fn method0<R: Bindable>(mut self, name: &'static str, f: fn(&T) -> R) -> Self {
        self.depend::<R>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([]),
            main: None,
            value_type: Type::of::<R>(),
            read: Some(call_fn(move |v, _| Ok(boxed(f(expect_ref::<T>(v)?))))),
            write: None,
        });
        self
    }

    /// Adds a method with one bound parameter, addressed as `name(A)`.
    pub fn method1<A: Bindable, R: Bindable>(
        mut self,
        name: &'static str,
        f: fn(&T, A) -> R,
    ) -> Self {
        self.depend::<A>();
        self.depend::<R>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([Type::of::<A>()]),
            main: None,
            value_type: Type::of::<R>(),
            read: Some(call_fn(move |v, args| {
                Ok(boxed(f(expect_ref::<T>(v)?, arg::<A>(args, 0)?)))
            })),
            write: None,
        });
        self
    }

    /// Adds a method with two bound parameters, addressed as `name(A, B)`.
    pub fn method2<A: Bindable, B: Bindable, R: Bindable>(
        mut self,
        name: &'static str,
        f: fn(&T, A, B) -> R,
    ) -> Self {
        self.depend::<A>();
        self.depend::<B>();
        self.depend::<R>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([Type::of::<A>(), Type::of::<B>()]),
            main: None,
            value_type: Type::of::<R>(),
            read: Some(call_fn(move |v, args| {
                Ok(boxed(f(expect_ref::<T>(v)?, arg::<A>(args, 0)?, arg::<B>(args, 1)?)))
            })),
            write: None,
        });
        self
    }

    /// Adds a mutating method whose only parameter receives written values.
    pub fn method_mut1<V: Bindable>(mut self, name: &'static str, f: fn(&mut T, V)) -> Self {
        self.depend::<V>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([Type::of::<V>()]),
            main: Some(0),
            value_type: Type::of::<V>(),
            read: None,
            write: Some(call_mut_fn(move |v, _, value| {
                let value = expect_owned::<V>(value)?;
                f(expect_mut::<T>(v)?, value);
                Ok(())
            })),
        });
        self
    }

    /// Adds a mutating method with one bound parameter followed by the
    /// parameter that receives written values.
    pub fn method_mut2<A: Bindable, V: Bindable>(
        mut self,
        name: &'static str,
        f: fn(&mut T, A, V),
    ) -> Self {
        self.depend::<A>();
        self.depend::<V>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([Type::of::<A>(), Type::of::<V>()]),
            main: Some(1),
            value_type: Type::of::<V>(),
            read: None,
            write: Some(call_mut_fn(move |v, args, value| {
                let value = expect_owned::<V>(value)?;
                let a = arg::<A>(args, 0)?;
                f(expect_mut::<T>(v)?, a, value);
                Ok(())
            })),
        });
        self
    }

    /// Adds a parameterless method pair that reads through `get` and writes
    /// through `set`, addressed as `name()`.
    pub fn method_rw<V: Bindable>(
        mut self,
        name: &'static str,
        get: fn(&T) -> V,
        set: fn(&mut T, V),
    ) -> Self {
        self.depend::<V>();
        self.push_method(MethodInfo {
            name,
            params: Box::new([]),
            main: None,
            value_type: Type::of::<V>(),
            read: Some(call_fn(move |v, _| Ok(boxed(get(expect_ref::<T>(v)?))))),
            write: Some(call_mut_fn(move |v, _, value| {
                let value = expect_owned::<V>(value)?;
                set(expect_mut::<T>(v)?, value);
                Ok(())
            })),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Collections

    /// Declares integer keyed elements.
    pub fn list<E: Bindable>(
        mut self,
        len: fn(&T) -> usize,
        get: fn(&T, usize) -> Option<&E>,
        get_mut: fn(&mut T, usize) -> Option<&mut E>,
    ) -> Self {
        self.depend::<E>();
        self.desc.element = Some(ElementInfo {
            kind: ElementKind::List,
            key: Type::of::<usize>(),
            value: Type::of::<E>(),
            get: keyed_fn(move |v, key| {
                let this = expect_ref::<T>(v)?;
                let index = list_index(key)?;
                match usize::try_from(index).ok().and_then(|i| get(this, i)) {
                    Some(e) => Ok(e as &dyn Value),
                    None => Err(AccessError::OutOfRange { index, len: len(this) }),
                }
            }),
            get_mut: keyed_mut_fn(move |v, key| {
                let this = expect_mut::<T>(v)?;
                let index = list_index(key)?;
                let count = len(this);
                match usize::try_from(index).ok().and_then(|i| get_mut(this, i)) {
                    Some(e) => Ok(e as &mut dyn Value),
                    None => Err(AccessError::OutOfRange { index, len: count }),
                }
            }),
        });
        self
    }

    /// Declares elements keyed by `K`.
    pub fn map<K: Bindable + fmt::Display, V: Bindable>(
        mut self,
        get: for<'a> fn(&'a T, &K) -> Option<&'a V>,
        get_mut: for<'a> fn(&'a mut T, &K) -> Option<&'a mut V>,
    ) -> Self {
        self.depend::<K>();
        self.depend::<V>();
        self.desc.element = Some(ElementInfo {
            kind: ElementKind::Map,
            key: Type::of::<K>(),
            value: Type::of::<V>(),
            get: keyed_fn(move |v, key| {
                let key = expect_ref::<K>(key)?;
                get(expect_ref::<T>(v)?, key)
                    .map(|e| e as &dyn Value)
                    .ok_or_else(|| AccessError::MissingKey { key: format!("{key}") })
            }),
            get_mut: keyed_mut_fn(move |v, key| {
                let key = expect_ref::<K>(key)?;
                get_mut(expect_mut::<T>(v)?, key)
                    .map(|e| e as &mut dyn Value)
                    .ok_or_else(|| AccessError::MissingKey { key: format!("{key}") })
            }),
        });
        self
    }

    /// Declares raw multi-index element access.
    pub fn array<E: Bindable>(
        mut self,
        rank: ArrayRank,
        get: for<'a> fn(&'a T, &[usize]) -> Result<&'a E, AccessError>,
        get_mut: for<'a> fn(&'a mut T, &[usize]) -> Result<&'a mut E, AccessError>,
    ) -> Self {
        self.depend::<E>();
        self.desc.array = Some(ArrayInfo {
            rank,
            element: Type::of::<E>(),
            get: array_fn(move |v, indices| {
                get(expect_ref::<T>(v)?, indices).map(|e| e as &dyn Value)
            }),
            get_mut: array_mut_fn(move |v, indices| {
                get_mut(expect_mut::<T>(v)?, indices).map(|e| e as &mut dyn Value)
            }),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Wrappers

    /// Declares `T` as an optional `I`. Members of `I` become reachable
    /// through an implicit unwrap.
    pub fn optional<I: Bindable>(
        mut self,
        get: fn(&T) -> Option<&I>,
        get_mut: fn(&mut T) -> Option<&mut I>,
        wrap: fn(&mut T, I),
    ) -> Self {
        self.depend::<I>();
        self.desc.wrapper = Some(WrapperInfo::Optional {
            inner: Type::of::<I>(),
            get: project_fn(move |v| {
                get(expect_ref::<T>(v)?)
                    .map(|i| i as &dyn Value)
                    .ok_or(AccessError::NullValue { ty: Type::of::<T>() })
            }),
            get_mut: project_mut_fn(move |v| {
                get_mut(expect_mut::<T>(v)?)
                    .map(|i| i as &mut dyn Value)
                    .ok_or(AccessError::NullValue { ty: Type::of::<T>() })
            }),
            wrap: write_fn(move |v, value| {
                let value = expect_owned::<I>(value)?;
                wrap(expect_mut::<T>(v)?, value);
                Ok(())
            }),
        });
        self
    }

    /// Declares `T` as a handle to a shared `I`, giving it reference
    /// semantics. Members of `I` become reachable through an implicit deref.
    pub fn shared<I: Bindable>(mut self, handle: fn(&T) -> &Shared<I>) -> Self {
        self.depend::<I>();
        self.desc.semantics = Semantics::Reference;
        self.desc.wrapper = Some(WrapperInfo::Shared {
            inner: Type::of::<I>(),
            visit: visit_fn(move |v, f| {
                let guard = handle(expect_ref::<T>(v)?).read();
                f(&*guard)
            }),
            visit_mut: visit_mut_fn(move |v, f| {
                let mut guard = handle(expect_ref::<T>(v)?).write();
                f(&mut *guard)
            }),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Narrowing

    /// Declares a narrowing from `T` to `S`, e.g. an enum to the payload of
    /// one of its variants, and the widening back.
    pub fn narrow<S: Bindable>(
        mut self,
        name: &'static str,
        get: fn(&T) -> Option<&S>,
        get_mut: fn(&mut T) -> Option<&mut S>,
        widen: fn(S) -> T,
    ) -> Self {
        self.depend::<S>();
        let not_variant = || AccessError::TypeMismatch {
            expected: Type::of::<S>(),
            actual: Type::of::<T>(),
        };
        self.desc.narrowings.push(NarrowInfo {
            name,
            sub: Type::of::<S>(),
            get: project_fn(move |v| {
                get(expect_ref::<T>(v)?)
                    .map(|s| s as &dyn Value)
                    .ok_or_else(not_variant)
            }),
            get_mut: project_mut_fn(move |v| {
                get_mut(expect_mut::<T>(v)?)
                    .map(|s| s as &mut dyn Value)
                    .ok_or_else(not_variant)
            }),
            widen: widen_fn(move |value| Ok(boxed(widen(expect_owned::<S>(value)?)))),
        });
        self
    }

    // -------------------------------------------------------------------------
    // Misc

    /// Declares that `T` stands for a value of type `V`.
    ///
    /// The converter bridge uses `get` to turn a `T` into a `V` and `wrap`
    /// to build a `T` back from a `V`.
    pub fn value_provider<V: Bindable>(mut self, get: fn(&T) -> V, wrap: Option<fn(V) -> T>) -> Self {
        self.depend::<V>();
        self.desc.value_provider = Some(ValueProviderInfo {
            value: Type::of::<V>(),
            get: read_fn(move |v| Ok(boxed(get(expect_ref::<T>(v)?)))),
            wrap: wrap.map(|wrap| {
                read_fn(move |v| Ok(boxed(wrap(expect_ref::<V>(v)?.clone()))))
            }),
        });
        self
    }

    /// Declares the unit variants of an enum.
    pub fn enum_variants(
        mut self,
        variants: &'static [(&'static str, i64)],
        index_of: fn(&T) -> usize,
        from_index: fn(usize) -> Option<T>,
    ) -> Self {
        self.desc.variants = Some(VariantTable {
            variants,
            index_of: Arc::new(move |v: &dyn Value| {
                v.downcast_ref::<T>().map(index_of)
            }),
            from_index: Arc::new(move |i| from_index(i).map(boxed)),
        });
        self
    }

    /// Registers `T::default` as the default value.
    #[inline]
    pub fn default(mut self) -> Self
    where
        T: Default,
    {
        self.desc.default = Some(default_value::<T>);
        self
    }

    /// Overrides how instances of `T` are identified by the concurrency
    /// wrapper. Defaults to the address of the value.
    #[inline]
    pub fn identity(mut self, identity: IdentityFn) -> Self {
        self.desc.identity = identity;
        self
    }
}
