use quote::quote_spanned;

use crate::derive_data::BindMeta;

/// Generate `auto_register` implementation
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(meta: &BindMeta) -> proc_macro2::TokenStream {
    if let Some(span) = meta.attrs().auto_register {
        // Invalid for generic types.
        if meta.impl_with_generic() {
            return crate::utils::empty();
        }

        let auto_register_ = crate::path::auto_register_(meta.vc_bind_path());
        let ident = meta.ident();

        quote_spanned! { span =>
            #auto_register_::inventory::submit!{
                #auto_register_::__AutoRegisterFunc(
                    #auto_register_::__register_type::<#ident>
                )
            }
        }
    } else {
        crate::utils::empty()
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &BindMeta) -> proc_macro2::TokenStream {
    crate::utils::empty()
}
