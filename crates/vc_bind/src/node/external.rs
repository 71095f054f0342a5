use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use crate::error::AccessError;
use crate::info::{TypeDescriptor, TypeTable};
use crate::node::{Node, NodeFlags, NodeOp};
use crate::value::{Type, Value};

/// A hop implemented outside the type table, returned by a
/// [`PathProvider`](crate::provider::PathProvider).
///
/// One instance is shared by every duplicate of the chain it is part of.
pub trait ExternalAccessor: Send + Sync {
    /// Returns the type produced by [`get`](Self::get).
    fn value_type(&self) -> Type;

    /// Returns `true` if [`get`](Self::get) can succeed.
    fn can_read(&self) -> bool {
        true
    }

    /// Returns `true` if [`set`](Self::set) can succeed.
    fn can_write(&self) -> bool {
        true
    }

    /// Reads the value out of `target`.
    fn get(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError>;

    /// Writes `value` into `target`.
    fn set(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError>;
}

impl Node {
    /// Creates a hop delegating to `accessor`.
    ///
    /// Returns `None` if the accessor's value type is not registered.
    pub(crate) fn external(
        table: &TypeTable,
        object: &TypeDescriptor,
        accessor: Arc<dyn ExternalAccessor>,
        label: String,
    ) -> Option<Self> {
        let value = table.get(accessor.value_type().id())?;
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::READ, accessor.can_read());
        flags.set(NodeFlags::WRITE, accessor.can_write());
        Some(Self::new(NodeOp::External(accessor), object, value, flags, label))
    }
}
