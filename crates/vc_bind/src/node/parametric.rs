use alloc::boxed::Box;
use alloc::string::String;

use crate::info::{ElementInfo, IndexerInfo, MethodInfo, TypeDescriptor, TypeTable};
use crate::node::{Node, NodeFlags, NodeOp, Param};

fn call_flags(read: bool, write: bool) -> NodeFlags {
    let mut flags = NodeFlags::empty();
    flags.set(NodeFlags::READ, read);
    flags.set(NodeFlags::WRITE, write);
    flags
}

impl Node {
    /// Creates a declared indexer hop. `params` holds one slot per key.
    pub(crate) fn indexer(
        table: &TypeTable,
        object: &TypeDescriptor,
        info: &IndexerInfo,
        params: Box<[Param]>,
        label: String,
    ) -> Option<Self> {
        let value = table.get(info.value_type.id())?;
        let flags = call_flags(info.read.is_some(), info.write.is_some());
        let op = NodeOp::Call {
            read: info.read.clone(),
            write: info.write.clone(),
        };
        Some(Self::new(op, object, value, flags, label).with_params(params, info.params.clone()))
    }

    /// Creates a method hop. Every parameter except the main one becomes an
    /// unbound slot.
    pub(crate) fn method(
        table: &TypeTable,
        object: &TypeDescriptor,
        info: &MethodInfo,
        label: String,
    ) -> Option<Self> {
        let value = table.get(info.value_type.id())?;
        let flags = call_flags(info.read.is_some(), info.write.is_some());
        let op = NodeOp::Call {
            read: info.read.clone(),
            write: info.write.clone(),
        };
        let types: Box<[_]> = info.arg_types().collect();
        let params = types.iter().map(|_| Param::Unbound).collect();
        Some(Self::new(op, object, value, flags, label).with_params(params, types))
    }

    /// Creates a list or dictionary element hop keyed by `key`.
    pub(crate) fn element(
        table: &TypeTable,
        object: &TypeDescriptor,
        info: &ElementInfo,
        key: Param,
        label: String,
    ) -> Option<Self> {
        let value = table.get(info.value.id())?;
        let flags = NodeFlags::READ
            | NodeFlags::WRITE
            | NodeFlags::PROJECTABLE
            | NodeFlags::ASSIGN_IN_PLACE;
        let op = NodeOp::Element {
            get: info.get.clone(),
            get_mut: info.get_mut.clone(),
        };
        Some(Self::new(op, object, value, flags, label).with_params(Box::new([key]), Box::new([info.key])))
    }
}
