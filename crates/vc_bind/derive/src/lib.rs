//! Provides `#[derive(Bindable)]`.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static BIND_ATTRIBUTE_NAME: &str = "bind";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;
mod utils;

// -----------------------------------------------------------------------------
// Macros

/// Implements `vc_bind::Bindable`.
///
/// Documented on the re-export, `vc_bind::Bindable`.
///
/// - Structs expose their fields, named or `0`, `1`, ... for tuple structs.
/// - Enums with only unit variants get a variant table.
/// - Other enums get a narrowing for each variant holding exactly one
///   unnamed field.
///
/// Type level: `#[bind(default, auto_register, extend = path)]`.
///
/// Field level: `#[bind(skip, readonly, rename = "name")]`.
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impls::match_bind_impls(ast)
}
