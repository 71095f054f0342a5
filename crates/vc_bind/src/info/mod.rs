//! Type metadata: the runtime description of what a path may address.
//!
//! ## Menu
//!
//! - [`Bindable`]: types that can describe themselves.
//! - [`TypeDescriptor`]: members, indexers, methods, collection and wrapper
//!   capabilities, narrowings and conversions of one type.
//! - [`DescriptorBuilder`]: the way descriptors are written, by hand or by
//!   `#[derive(Bindable)]`.
//! - [`TypeTable`]: the registry the resolver looks types up in.
//! - [`MultiArray`]: a dense N-dimensional array with raw element access.
//!
//! ## Built-in types
//!
//! - `()` `bool` `char` `f32` `f64` `String`
//! - `i8` `i16` `i32` `i64` `i128` `isize`
//! - `u8` `u16` `u32` `u64` `u128` `usize`
//! - `Vec<T>` `VecDeque<T>` `[T; N]` `Option<T>`
//! - `HashMap<String, V>` `BTreeMap<String, V>`
//! - [`Shared<T>`](crate::Shared) [`MultiArray<T>`]
//!   [`Material`](crate::material::Material)

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod descriptor;
mod impls;
mod multi_array;
mod table;

// -----------------------------------------------------------------------------
// Exports

pub use builder::DescriptorBuilder;
pub use descriptor::{
    ArrayInfo, ArrayProjectFn, ArrayProjectMutFn, ArrayRank, AssignFn, CallFn, CallMutFn,
    ConvertFn, DefaultFn, ElementInfo, ElementKind, IdentityFn, IndexerInfo, KeyedProjectFn,
    KeyedProjectMutFn, MemberInfo, MemberKind, MethodInfo, NarrowInfo, ProjectFn, ProjectMutFn,
    ReadFn, TypeDescriptor, ValueProviderInfo, VariantTable, Visitor, VisitorMut, VisitFn,
    VisitMutFn, WidenFn, WrapperInfo, WriteFn,
};
pub use multi_array::MultiArray;
pub use table::TypeTable;

pub(crate) use descriptor::{address_identity, convert_fn};

use crate::value::Value;

// -----------------------------------------------------------------------------
// Bindable

/// A type that paths can be resolved against.
///
/// Usually derived:
///
/// ```
/// use vc_bind::{Bindable, info::TypeTable};
///
/// #[derive(Bindable, Clone)]
/// struct Player {
///     name: String,
///     #[bind(rename = "hp")]
///     health: f32,
///     #[bind(skip)]
///     cache: Vec<u8>,
/// }
///
/// let mut table = TypeTable::new();
/// table.register::<Player>();
///
/// let desc = table.get_of::<Player>().unwrap();
/// assert!(desc.find_member("hp").is_some());
/// assert!(desc.find_member("cache").is_none());
/// ```
///
/// Implement it by hand with a [`DescriptorBuilder`] to expose properties,
/// indexers or methods.
pub trait Bindable: Value + Clone {
    /// Describes `Self`.
    fn descriptor() -> TypeDescriptor;
}
