use alloc::string::String;

use crate::info::{MemberInfo, MemberKind, TypeDescriptor, TypeTable};
use crate::node::{Node, NodeFlags, NodeOp};

impl Node {
    /// Creates the identity hop.
    pub(crate) fn this(object: &TypeDescriptor) -> Self {
        let flags = NodeFlags::READ
            | NodeFlags::WRITE
            | NodeFlags::PROJECTABLE
            | NodeFlags::ASSIGN_IN_PLACE;
        Self::new(NodeOp::This, object, object, flags, String::from("this"))
    }

    /// Creates a field or property hop.
    ///
    /// Returns `None` if the member type is not registered.
    pub(crate) fn member(
        table: &TypeTable,
        object: &TypeDescriptor,
        member: &MemberInfo,
    ) -> Option<Self> {
        let value = table.get(member.value_type.id())?;
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::READ, member.can_read());
        flags.set(NodeFlags::WRITE, member.can_write());

        let op = match member.kind {
            MemberKind::Field => {
                flags |= NodeFlags::PROJECTABLE | NodeFlags::ASSIGN_IN_PLACE;
                NodeOp::Field {
                    project: member.project.clone()?,
                    project_mut: member.project_mut.clone(),
                }
            }
            MemberKind::Property => NodeOp::Property {
                read: member.read.clone(),
                write: member.write.clone(),
            },
        };

        Some(Self::new(op, object, value, flags, String::from(member.name)))
    }
}
