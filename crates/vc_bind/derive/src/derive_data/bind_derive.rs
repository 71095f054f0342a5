use syn::{Data, DeriveInput, Field, Fields, Ident, Index, LitStr, Member, Variant, spanned::Spanned};

use super::{BindMeta, FieldAttributes, TypeAttributes};

// -----------------------------------------------------------------------------
// Define

/// The parsed derive input.
pub(crate) enum BindDerive<'a> {
    Struct(BindStruct<'a>),
    Enum(BindEnum<'a>),
}

pub(crate) struct BindStruct<'a> {
    pub meta: BindMeta<'a>,
    pub fields: Vec<BindField<'a>>,
}

/// One field, with its attributes.
pub(crate) struct BindField<'a> {
    pub data: &'a Field,
    pub member: Member,
    pub attrs: FieldAttributes,
}

pub(crate) struct BindEnum<'a> {
    pub meta: BindMeta<'a>,
    pub variants: Vec<BindVariant<'a>>,
}

pub(crate) struct BindVariant<'a> {
    pub data: &'a Variant,
    pub attrs: FieldAttributes,
}

// -----------------------------------------------------------------------------
// Parsing

impl<'a> BindDerive<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;
        let meta = BindMeta::new(attrs, &input.ident, &input.generics);

        match &input.data {
            Data::Struct(data) => {
                let fields = BindField::collect(&data.fields)?;
                Ok(Self::Struct(BindStruct { meta, fields }))
            }
            Data::Enum(data) => {
                let variants = data
                    .variants
                    .iter()
                    .map(|data| {
                        Ok(BindVariant {
                            data,
                            attrs: FieldAttributes::parse_attrs(&data.attrs)?,
                        })
                    })
                    .collect::<syn::Result<Vec<_>>>()?;
                Ok(Self::Enum(BindEnum { meta, variants }))
            }
            Data::Union(data) => Err(syn::Error::new(
                data.union_token.span,
                "`Bindable` cannot be derived for unions",
            )),
        }
    }
}

impl<'a> BindField<'a> {
    fn collect(fields: &'a Fields) -> syn::Result<Vec<Self>> {
        fields
            .iter()
            .enumerate()
            .map(|(index, data)| {
                let member = match &data.ident {
                    Some(ident) => Member::Named(ident.clone()),
                    None => Member::Unnamed(Index::from(index)),
                };
                Ok(Self {
                    data,
                    member,
                    attrs: FieldAttributes::parse_attrs(&data.attrs)?,
                })
            })
            .collect()
    }

    /// The name paths address the field by.
    pub fn name(&self) -> LitStr {
        if let Some(rename) = &self.attrs.rename {
            return rename.clone();
        }
        let name = match &self.member {
            Member::Named(ident) => ident.to_string(),
            Member::Unnamed(index) => index.index.to_string(),
        };
        LitStr::new(&name, self.data.span())
    }
}

impl BindStruct<'_> {
    /// Fields not marked `skip`.
    pub fn active_fields(&self) -> impl Iterator<Item = &BindField<'_>> {
        self.fields.iter().filter(|f| f.attrs.skip.is_none())
    }
}

impl BindVariant<'_> {
    #[inline]
    pub fn ident(&self) -> &Ident {
        &self.data.ident
    }

    /// The name of the narrowing to this variant's payload.
    pub fn name(&self) -> LitStr {
        self.attrs
            .rename
            .clone()
            .unwrap_or_else(|| LitStr::new(&self.data.ident.to_string(), self.data.ident.span()))
    }
}
