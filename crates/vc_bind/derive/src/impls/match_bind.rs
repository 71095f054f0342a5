use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::derive_data::BindDerive;

/// Provided for `#[derive(Bindable)]`.
pub(crate) fn match_bind_impls(ast: DeriveInput) -> TokenStream {
    // Parse type kind, attributes and fields.
    let bind_derive = match BindDerive::from_input(&ast) {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };

    let bind_impls = match &bind_derive {
        BindDerive::Struct(info) => super::impl_struct(info),
        BindDerive::Enum(info) => super::impl_enum(info),
    };
    let bind_impls = match bind_impls {
        Ok(val) => val,
        Err(err) => return err.into_compile_error().into(),
    };

    TokenStream::from(quote! {
        const _: () = {
            #bind_impls
        };
    })
}
