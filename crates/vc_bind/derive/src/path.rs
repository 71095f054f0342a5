//! Paths to `vc_bind` items, as seen from the invoking crate.

use proc_macro2::TokenStream;
use quote::quote;

/// Get the correct access path to the `vc_bind` crate.
///
/// 1. For crates that depend on `vc_bind`, `::vc_bind` is returned.
/// 2. For crates that depend on `vc_binding`, `::vc_binding::bind` is returned.
/// 3. Otherwise `::vc_bind` is returned, which may be incorrect.
///
/// Reading the manifest is comparatively expensive, so the path is obtained
/// once per expansion and passed along.
pub(crate) fn vc_bind() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_bind"))
}

#[inline(always)]
pub(crate) fn bindable_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::Bindable
    }
}

#[inline(always)]
pub(crate) fn type_descriptor_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::info::TypeDescriptor
    }
}

#[inline(always)]
pub(crate) fn descriptor_builder_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::info::DescriptorBuilder
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::__macro_exports::auto_register
    }
}
