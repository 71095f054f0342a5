use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;

use super::get_auto_register_impl;

use crate::derive_data::{BindField, BindStruct};

/// Implement `Bindable` for structs: every active field becomes a member.
pub(crate) fn impl_struct(info: &BindStruct) -> syn::Result<TokenStream> {
    let calls = info.active_fields().map(field_call);

    let bindable_tokens = info.meta.impl_bindable(quote!( #(#calls)* ));
    let auto_register_tokens = get_auto_register_impl(&info.meta);

    Ok(quote! {
        #bindable_tokens

        #auto_register_tokens
    })
}

fn field_call(field: &BindField) -> TokenStream {
    let name = field.name();
    let member = &field.member;
    let ty = &field.data.ty;

    if field.attrs.readonly.is_some() {
        quote_spanned! { field.data.span() =>
            .readonly_field::<#ty>(#name, |v| &v.#member)
        }
    } else {
        quote_spanned! { field.data.span() =>
            .field::<#ty>(#name, |v| &v.#member, |v| &mut v.#member)
        }
    }
}
