use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericParam, Generics, Ident, Path, WherePredicate, punctuated::Punctuated};

use super::TypeAttributes;

/// Type level information shared by every kind of derive.
pub(crate) struct BindMeta<'a> {
    vc_bind_path: Path,
    attrs: TypeAttributes,
    ident: &'a Ident,
    generics: &'a Generics,
}

impl<'a> BindMeta<'a> {
    #[inline]
    pub fn new(attrs: TypeAttributes, ident: &'a Ident, generics: &'a Generics) -> Self {
        Self {
            vc_bind_path: crate::path::vc_bind(),
            attrs,
            ident,
            generics,
        }
    }

    #[inline]
    pub fn vc_bind_path(&self) -> &Path {
        &self.vc_bind_path
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn ident(&self) -> &'a Ident {
        self.ident
    }

    /// Whether the type has non-lifetime generic parameters.
    pub fn impl_with_generic(&self) -> bool {
        !self
            .generics
            .params
            .iter()
            .all(|param| matches!(param, GenericParam::Lifetime(_)))
    }

    /// Generates `impl<..> Bindable for Ident<..> where ..`, with every type
    /// parameter bound by `Bindable`.
    pub fn impl_header(&self) -> TokenStream {
        let bindable_ = crate::path::bindable_(&self.vc_bind_path);
        let ident = self.ident;
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        let mut predicates: Punctuated<WherePredicate, syn::Token![,]> = where_clause
            .map(|w| w.predicates.clone())
            .unwrap_or_default();
        for param in self.generics.type_params() {
            let ident = &param.ident;
            predicates.push(syn::parse_quote!(#ident: #bindable_));
        }

        quote! {
            impl #impl_generics #bindable_ for #ident #ty_generics where #predicates
        }
    }

    /// Wraps the builder calls of a derive into the `descriptor` function.
    ///
    /// The `default` flag and the `extend` hook are applied after `calls`.
    pub fn impl_bindable(&self, calls: TokenStream) -> TokenStream {
        let vc_bind_path = &self.vc_bind_path;
        let type_descriptor_ = crate::path::type_descriptor_(vc_bind_path);
        let descriptor_builder_ = crate::path::descriptor_builder_(vc_bind_path);
        let header = self.impl_header();

        let with_default = self.attrs.default.map(|_| quote!(let builder = builder.default();));
        let with_extend = self.attrs.extend.as_ref().map(|extend| {
            quote!(let builder = #extend(builder);)
        });

        quote! {
            #header {
                fn descriptor() -> #type_descriptor_ {
                    let builder = #descriptor_builder_::<Self>::new() #calls;
                    #with_default
                    #with_extend
                    builder.build()
                }
            }
        }
    }
}
