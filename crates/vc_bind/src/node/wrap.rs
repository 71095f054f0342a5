use alloc::format;
use alloc::string::String;

use crate::info::{NarrowInfo, TypeDescriptor, TypeTable, WrapperInfo};
use crate::node::{Node, NodeFlags, NodeOp};

impl Node {
    /// Creates the hop into a wrapper: an unwrap for `Option<T>`, a deref
    /// for `Shared<T>`.
    ///
    /// Returns `None` if `object` is not a wrapper.
    pub(crate) fn wrapper(table: &TypeTable, object: &TypeDescriptor) -> Option<Self> {
        let flags = NodeFlags::READ | NodeFlags::WRITE | NodeFlags::PROJECTABLE;
        match object.wrapper.as_ref()? {
            WrapperInfo::Optional {
                inner,
                get,
                get_mut,
                wrap,
            } => {
                let op = NodeOp::Unwrap {
                    get: get.clone(),
                    get_mut: get_mut.clone(),
                    wrap: wrap.clone(),
                };
                let value = table.get(inner.id())?;
                Some(Self::new(op, object, value, flags, String::from("?")))
            }
            WrapperInfo::Shared {
                inner,
                visit,
                visit_mut,
            } => {
                let op = NodeOp::Deref {
                    visit: visit.clone(),
                    visit_mut: visit_mut.clone(),
                };
                let value = table.get(inner.id())?;
                Some(Self::new(op, object, value, flags, String::from("*")))
            }
        }
    }

    /// Creates a hop from `base` down to the sub type of `narrowing`.
    pub(crate) fn narrow(
        table: &TypeTable,
        base: &TypeDescriptor,
        narrowing: &NarrowInfo,
    ) -> Option<Self> {
        let sub = table.get(narrowing.sub.id())?;
        let op = NodeOp::Narrow {
            get: narrowing.get.clone(),
            get_mut: narrowing.get_mut.clone(),
            widen: narrowing.widen.clone(),
            assign_base: base.assign,
        };
        let flags = NodeFlags::READ | NodeFlags::WRITE | NodeFlags::PROJECTABLE;
        let label = format!("as {}", narrowing.name);
        Some(Self::new(op, base, sub, flags, label))
    }

    /// Creates a hop from the sub type of `narrowing` up to `base`.
    ///
    /// Writing a base value that is not of the narrowed variant fails.
    pub(crate) fn widen(
        table: &TypeTable,
        base: &TypeDescriptor,
        narrowing: &NarrowInfo,
    ) -> Option<Self> {
        let sub = table.get(narrowing.sub.id())?;
        let op = NodeOp::Widen {
            narrow: narrowing.get.clone(),
            widen: narrowing.widen.clone(),
        };
        let flags = NodeFlags::READ | NodeFlags::WRITE;
        let label = format!("as {}", base.ty);
        Some(Self::new(op, sub, base, flags, label))
    }
}
