use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, spanned::Spanned};

use super::get_auto_register_impl;

use crate::derive_data::{BindEnum, BindVariant};

/// Implement `Bindable` for enums.
///
/// - Only unit variants: a variant table, in declaration order.
/// - Otherwise: a narrowing per variant holding exactly one unnamed field.
///   Other variants are not addressable.
pub(crate) fn impl_enum(info: &BindEnum) -> syn::Result<TokenStream> {
    let is_unit_only = info
        .variants
        .iter()
        .all(|v| matches!(v.data.fields, Fields::Unit));

    let calls = if info.variants.is_empty() {
        crate::utils::empty()
    } else if is_unit_only {
        variant_table(info)?
    } else {
        let narrowings = info
            .variants
            .iter()
            .filter(|v| v.attrs.skip.is_none())
            .filter_map(narrow_call);
        quote!( #(#narrowings)* )
    };

    let bindable_tokens = info.meta.impl_bindable(calls);
    let auto_register_tokens = get_auto_register_impl(&info.meta);

    Ok(quote! {
        #bindable_tokens

        #auto_register_tokens
    })
}

fn variant_table(info: &BindEnum) -> syn::Result<TokenStream> {
    if let Some(variant) = info.variants.iter().find(|v| v.attrs.skip.is_some()) {
        return Err(syn::Error::new(
            variant.data.span(),
            "unit variants cannot be skipped",
        ));
    }

    let mut next: TokenStream = quote!(0_i64);
    let mut entries = Vec::with_capacity(info.variants.len());
    for variant in &info.variants {
        let value = match &variant.data.discriminant {
            Some((_, expr)) => quote!((#expr) as i64),
            None => next.clone(),
        };
        let name = variant.name();
        entries.push(quote!((#name, #value)));
        next = quote!(#value + 1);
    }

    let idents: Vec<_> = info.variants.iter().map(BindVariant::ident).collect();
    let indices = 0..idents.len();
    let from_indices = 0..idents.len();

    Ok(quote! {
        .enum_variants(
            {
                const VARIANTS: &[(&str, i64)] = &[ #(#entries),* ];
                VARIANTS
            },
            |v| match v { #(Self::#idents => #indices,)* },
            |i| match i {
                #(#from_indices => ::core::option::Option::Some(Self::#idents),)*
                _ => ::core::option::Option::None,
            },
        )
    })
}

fn narrow_call(variant: &BindVariant) -> Option<TokenStream> {
    let Fields::Unnamed(fields) = &variant.data.fields else {
        return None;
    };
    let [field] = fields.unnamed.iter().collect::<Vec<_>>()[..] else {
        return None;
    };
    let ty = &field.ty;
    let ident = variant.ident();
    let name = variant.name();

    Some(quote! {
        .narrow::<#ty>(
            #name,
            |v| match v {
                Self::#ident(inner) => ::core::option::Option::Some(inner),
                #[allow(unreachable_patterns)]
                _ => ::core::option::Option::None,
            },
            |v| match v {
                Self::#ident(inner) => ::core::option::Option::Some(inner),
                #[allow(unreachable_patterns)]
                _ => ::core::option::Option::None,
            },
            Self::#ident,
        )
    })
}
