//! Provide some tools for parsing the derive input.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod bind_derive;
mod bind_meta;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use attributes::{FieldAttributes, TypeAttributes};
pub(crate) use bind_derive::{BindDerive, BindEnum, BindField, BindStruct, BindVariant};
pub(crate) use bind_meta::BindMeta;
