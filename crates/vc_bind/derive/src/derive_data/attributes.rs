//! Parsing of `#[bind(...)]` attributes.

use proc_macro2::Span;
use syn::{Attribute, LitStr, Path, meta::ParseNestedMeta, spanned::Spanned};

use crate::BIND_ATTRIBUTE_NAME;

fn unknown(meta: &ParseNestedMeta, expected: &str) -> syn::Error {
    meta.error(format!("unknown `bind` attribute, expected one of: {expected}"))
}

fn no_duplicate<T>(slot: &Option<T>, meta: &ParseNestedMeta) -> syn::Result<()> {
    match slot {
        Some(_) => Err(meta.error("duplicate `bind` attribute")),
        None => Ok(()),
    }
}

// -----------------------------------------------------------------------------
// Type attributes

/// `#[bind(...)]` on the type.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `default`: the type implements `Default`.
    pub default: Option<Span>,
    /// `auto_register`
    pub auto_register: Option<Span>,
    /// `extend = path::to::fn`
    pub extend: Option<Path>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(BIND_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    no_duplicate(&out.default, &meta)?;
                    out.default = Some(meta.path.span());
                } else if meta.path.is_ident("auto_register") {
                    no_duplicate(&out.auto_register, &meta)?;
                    out.auto_register = Some(meta.path.span());
                } else if meta.path.is_ident("extend") {
                    no_duplicate(&out.extend, &meta)?;
                    out.extend = Some(meta.value()?.parse()?);
                } else {
                    return Err(unknown(&meta, "`default`, `auto_register`, `extend`"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

// -----------------------------------------------------------------------------
// Field attributes

/// `#[bind(...)]` on a field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub skip: Option<Span>,
    pub readonly: Option<Span>,
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(BIND_ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    no_duplicate(&out.skip, &meta)?;
                    out.skip = Some(meta.path.span());
                } else if meta.path.is_ident("readonly") {
                    no_duplicate(&out.readonly, &meta)?;
                    out.readonly = Some(meta.path.span());
                } else if meta.path.is_ident("rename") {
                    no_duplicate(&out.rename, &meta)?;
                    out.rename = Some(meta.value()?.parse()?);
                } else {
                    return Err(unknown(&meta, "`skip`, `readonly`, `rename`"));
                }
                Ok(())
            })?;
        }
        if let (Some(span), Some(_)) = (out.skip, &out.rename) {
            return Err(syn::Error::new(span, "`skip` cannot be combined with `rename`"));
        }
        Ok(out)
    }
}
