#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Extern Self

// Derived code names items through `vc_bind::...`, which must also resolve
// inside this crate and its doc tests.
extern crate self as vc_bind;

// -----------------------------------------------------------------------------
// no_std support

// Locks and `catch_unwind` need `std`; everything else sticks to `alloc`.
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod access;
mod cache;
mod chain;
mod config;
mod error;
mod hash;
mod resolver;
mod value;

pub mod concurrent;
pub mod convert;
pub mod info;
pub mod material;
pub mod node;
pub mod path;
pub mod provider;
pub mod safe;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use access::{Access, TypedAccessor};
pub use cache::{CacheStats, ResetMode};
pub use chain::{ChainAccessor, Composition};
pub use concurrent::ConcurrentAccessor;
pub use config::ResolverConfig;
pub use error::{AccessError, RegistrationConflict, ResolveError};
pub use info::Bindable;
pub use resolver::Resolver;
pub use value::{Semantics, Shared, Type, Value};

/// Derives [`Bindable`](trait@Bindable) for structs and enums.
///
/// Named fields become writable fields, tuple fields are named `0`, `1`,
/// and so on. Enums without payloads get a variant table; enums whose
/// variants each carry one payload get a narrowing per variant, named like
/// the variant.
///
/// ## Container attributes
///
/// - `#[bind(default)]`: record `Default::default` as the default value.
/// - `#[bind(auto_register)]`: register with
///   [`Resolver::auto_register`]. A no-op without the `auto_register`
///   feature and on generic types.
/// - `#[bind(extend = path::to::fn)]`: a
///   `fn(DescriptorBuilder<Self>) -> DescriptorBuilder<Self>` run before
///   the descriptor is built, to add properties, indexers or methods.
///
/// ## Field attributes
///
/// - `#[bind(skip)]`: leave the field out.
/// - `#[bind(rename = "name")]`: expose the field under another name.
/// - `#[bind(readonly)]`: expose the field without write access.
///
/// # Examples
///
/// ```
/// use vc_bind::{Access, Bindable, Resolver};
/// use vc_bind::info::DescriptorBuilder;
///
/// fn extend(builder: DescriptorBuilder<Wallet>) -> DescriptorBuilder<Wallet> {
///     builder.readonly_property("total", |w: &Wallet| w.coins.iter().sum::<u32>())
/// }
///
/// #[derive(Bindable, Clone, Default)]
/// #[bind(default, extend = extend)]
/// struct Wallet {
///     #[bind(readonly)]
///     owner: String,
///     coins: Vec<u32>,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Wallet>();
///
/// let total = resolver.resolve_as::<Wallet, u32>("total").unwrap();
/// let wallet = Wallet { owner: "ann".into(), coins: vec![1, 2, 3] };
/// assert_eq!(total.get(&wallet).unwrap(), 6);
///
/// let owner = resolver.resolve_of::<Wallet>("owner").unwrap();
/// assert!(owner.can_read() && !owner.can_write());
/// ```
pub use vc_bind_derive::Bindable;
