// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod enum_kind;
mod match_bind;
mod struct_kind;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use match_bind::match_bind_impls;

use auto_register::get_auto_register_impl;
use enum_kind::impl_enum;
use struct_kind::impl_struct;
