//! Accessor nodes: one resolved hop of a path.
//!
//! A [`Node`] reads or writes one step relative to the value produced by
//! the previous hop. Every segment kind maps to one [`NodeOp`] variant:
//!
//! | segment | op |
//! |---------|----|
//! | `this` | `This` |
//! | field / property | `Field` / `Property` |
//! | declared indexer, method | `Call` |
//! | list or dictionary entry | `Element` |
//! | `[#i, j]` | `Array` |
//! | `?`, implicit `Option` unwrap | `Unwrap` |
//! | implicit `Shared` deref | `Deref` |
//! | requested sub / base type | `Narrow` / `Widen` |
//! | `[@id:path]` | `External` |

// -----------------------------------------------------------------------------
// Modules

mod array;
mod external;
mod member;
mod parametric;
mod params;
mod wrap;

// -----------------------------------------------------------------------------
// Exports

pub use external::ExternalAccessor;
pub use params::{Param, ValueProvider};

pub(crate) use array::ArrayLevel;
pub(crate) use params::{Bindings, CallEnv};

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use bitflags::bitflags;
use fastvec::FastVec;

use crate::error::AccessError;
use crate::info::{
    AssignFn, CallFn, CallMutFn, KeyedProjectFn, KeyedProjectMutFn, ProjectFn, ProjectMutFn,
    ReadFn, TypeDescriptor, VisitFn, VisitMutFn, Visitor, VisitorMut, WidenFn, WriteFn,
};
use crate::value::{Semantics, Type, Value};

use params::{Arg, as_index, evaluate};

// -----------------------------------------------------------------------------
// NodeFlags

bitflags! {
    /// Capabilities of a [`Node`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct NodeFlags: u8 {
        /// The hop can be read.
        const READ            = 1 << 0;
        /// The hop can be written.
        const WRITE           = 1 << 1;
        /// The value can be borrowed out of its container.
        const PROJECTABLE     = 1 << 2;
        /// Writes borrow the slot mutably and assign in place.
        const ASSIGN_IN_PLACE = 1 << 3;
        /// The hop evaluates parameter slots.
        const PARAMETRIC      = 1 << 4;
        /// The container has value semantics: a write into a copy of it
        /// must be pushed back into its own parent.
        const VALUE_HOP       = 1 << 5;
    }
}

// -----------------------------------------------------------------------------
// NodeOp

/// What a [`Node`] does.
#[derive(Clone)]
pub(crate) enum NodeOp {
    This,
    Field {
        project: ProjectFn,
        project_mut: Option<ProjectMutFn>,
    },
    Property {
        read: Option<ReadFn>,
        write: Option<WriteFn>,
    },
    Call {
        read: Option<CallFn>,
        write: Option<CallMutFn>,
    },
    Element {
        get: KeyedProjectFn,
        get_mut: KeyedProjectMutFn,
    },
    Array {
        levels: Box<[ArrayLevel]>,
    },
    Unwrap {
        get: ProjectFn,
        get_mut: ProjectMutFn,
        wrap: WriteFn,
    },
    Deref {
        visit: VisitFn,
        visit_mut: VisitMutFn,
    },
    Narrow {
        get: ProjectFn,
        get_mut: ProjectMutFn,
        widen: WidenFn,
        assign_base: AssignFn,
    },
    Widen {
        narrow: ProjectFn,
        widen: WidenFn,
    },
    External(Arc<dyn ExternalAccessor>),
}

// -----------------------------------------------------------------------------
// Node

/// One resolved hop.
///
/// `object_type` is the type the hop is applied to and `value_type` the
/// type it produces. Within a chain, node `i`'s value type is node `i + 1`'s
/// object type.
#[derive(Clone)]
pub(crate) struct Node {
    pub op: NodeOp,
    pub object_type: Type,
    pub value_type: Type,
    pub flags: NodeFlags,
    pub params: Box<[Param]>,
    pub param_types: Box<[Type]>,
    /// Assigns a value of `value_type`.
    pub assign: AssignFn,
    /// Assigns a value of `object_type`.
    pub assign_object: AssignFn,
    pub label: String,
}

impl Node {
    /// Creates a node; `READ`, `WRITE` and `PARAMETRIC` must already be in
    /// `flags`, the container flag is derived from `object`.
    pub(crate) fn new(
        op: NodeOp,
        object: &TypeDescriptor,
        value: &TypeDescriptor,
        mut flags: NodeFlags,
        label: String,
    ) -> Self {
        if object.semantics == Semantics::Value {
            flags |= NodeFlags::VALUE_HOP;
        }
        Self {
            op,
            object_type: object.ty,
            value_type: value.ty,
            flags,
            params: Box::new([]),
            param_types: Box::new([]),
            assign: value.assign,
            assign_object: object.assign,
            label,
        }
    }

    pub(crate) fn with_params(mut self, params: Box<[Param]>, types: Box<[Type]>) -> Self {
        if !params.is_empty() {
            self.flags |= NodeFlags::PARAMETRIC;
        }
        self.params = params;
        self.param_types = types;
        self
    }

    #[inline]
    pub(crate) fn can_read(&self) -> bool {
        self.flags.contains(NodeFlags::READ)
    }

    #[inline]
    pub(crate) fn can_write(&self) -> bool {
        self.flags.contains(NodeFlags::WRITE)
    }

    #[inline]
    pub(crate) fn is_projectable(&self) -> bool {
        self.flags.contains(NodeFlags::PROJECTABLE)
    }

    /// `true` if writes into a copy of the container must be pushed back.
    #[inline]
    pub(crate) fn is_value_hop(&self) -> bool {
        self.flags.contains(NodeFlags::VALUE_HOP)
    }

    #[inline]
    pub(crate) fn is_deref(&self) -> bool {
        matches!(self.op, NodeOp::Deref { .. })
    }

    // -------------------------------------------------------------------------
    // Parameters

    /// Evaluates the parameter slots and hands them to `f`.
    fn with_args<R>(
        &self,
        hop: usize,
        env: &CallEnv<'_>,
        f: impl FnOnce(&[&dyn Value]) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        let args = evaluate(hop, &self.params, &self.param_types, env.bindings, env.registry)?;
        let args = args
            .as_slice()
            .iter()
            .map(Arg::as_value)
            .collect::<FastVec<_, 4>>();
        f(args.as_slice())
    }

    /// Evaluates the parameter slots as array indices.
    ///
    /// Up to four indices live on the stack, more use the duplicate's
    /// index buffer.
    fn with_indices<R>(
        &self,
        hop: usize,
        env: &mut CallEnv<'_>,
        f: impl FnOnce(&[usize]) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        let args = evaluate(hop, &self.params, &self.param_types, env.bindings, env.registry)?;
        let args = args.as_slice();
        if args.len() <= 4 {
            let mut buf = [0_usize; 4];
            for (slot, arg) in buf.iter_mut().zip(args) {
                *slot = as_index(arg.as_value())?;
            }
            f(&buf[..args.len()])
        } else {
            let buf = &mut *env.indices;
            buf.clear();
            for arg in args {
                buf.push(as_index(arg.as_value())?);
            }
            f(buf)
        }
    }

    // -------------------------------------------------------------------------
    // Owned access

    /// Reads the hop's value out of `target`.
    pub(crate) fn get(
        &self,
        hop: usize,
        target: &dyn Value,
        env: &mut CallEnv<'_>,
    ) -> Result<Box<dyn Value>, AccessError> {
        match &self.op {
            NodeOp::Property { read, .. } => match read {
                Some(read) => read(target),
                None => Err(AccessError::NotReadable),
            },
            NodeOp::Call { read, .. } => {
                let read = read.as_ref().ok_or(AccessError::NotReadable)?;
                self.with_args(hop, env, |args| read(target, args))
            }
            NodeOp::Deref { visit, .. } => {
                let mut out = None;
                visit(target, &mut |inner| {
                    out = Some(inner.clone_value());
                    Ok(())
                })?;
                out.ok_or(AccessError::NotReadable)
            }
            NodeOp::Widen { widen, .. } => widen(target.clone_value()),
            NodeOp::External(ext) => ext.get(target),
            _ => Ok(self.project(hop, target, env)?.clone_value()),
        }
    }

    /// Writes `value` as the hop's value into `target`.
    pub(crate) fn set(
        &self,
        hop: usize,
        target: &mut dyn Value,
        env: &mut CallEnv<'_>,
        value: Box<dyn Value>,
    ) -> Result<(), AccessError> {
        match &self.op {
            NodeOp::This => (self.assign)(target, value),
            NodeOp::Property { write, .. } => match write {
                Some(write) => write(target, value),
                None => Err(AccessError::NotWritable),
            },
            NodeOp::Call { write, .. } => {
                let write = write.as_ref().ok_or(AccessError::NotWritable)?;
                self.with_args(hop, env, |args| write(target, args, value))
            }
            NodeOp::Unwrap { wrap, .. } => wrap(target, value),
            NodeOp::Deref { .. } => self.set_shared(target, value),
            NodeOp::Narrow {
                widen, assign_base, ..
            } => assign_base(target, widen(value)?),
            NodeOp::Widen { narrow, .. } => {
                let sub = narrow(&*value)?.clone_value();
                (self.assign_object)(target, sub)
            }
            NodeOp::External(ext) => ext.set(target, value),
            NodeOp::Field { .. } | NodeOp::Element { .. } | NodeOp::Array { .. } => {
                (self.assign)(self.project_mut(hop, target, env)?, value)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Borrowed access

    /// Borrows the hop's value out of `target`.
    ///
    /// Only for projectable nodes other than `Deref`, see [`lend`](Self::lend).
    pub(crate) fn project<'a>(
        &self,
        hop: usize,
        target: &'a dyn Value,
        env: &mut CallEnv<'_>,
    ) -> Result<&'a dyn Value, AccessError> {
        match &self.op {
            NodeOp::This => Ok(target),
            NodeOp::Field { project, .. } => project(target),
            NodeOp::Element { get, .. } => self.with_args(hop, env, |args| get(target, args[0])),
            NodeOp::Array { levels } => {
                self.with_indices(hop, env, |indices| array::project(levels, indices, target))
            }
            NodeOp::Unwrap { get, .. } | NodeOp::Narrow { get, .. } => get(target),
            _ => Err(AccessError::NotReadable),
        }
    }

    /// Mutably borrows the hop's value out of `target`.
    pub(crate) fn project_mut<'a>(
        &self,
        hop: usize,
        target: &'a mut dyn Value,
        env: &mut CallEnv<'_>,
    ) -> Result<&'a mut dyn Value, AccessError> {
        match &self.op {
            NodeOp::This => Ok(target),
            NodeOp::Field { project_mut, .. } => match project_mut {
                Some(project_mut) => project_mut(target),
                None => Err(AccessError::NotWritable),
            },
            NodeOp::Element { get_mut, .. } => {
                self.with_args(hop, env, |args| get_mut(target, args[0]))
            }
            NodeOp::Array { levels } => self.with_indices(hop, env, |indices| {
                array::project_mut(levels, indices, target)
            }),
            NodeOp::Unwrap { get_mut, .. } | NodeOp::Narrow { get_mut, .. } => get_mut(target),
            _ => Err(AccessError::NotWritable),
        }
    }

    /// Lends the value behind a `Deref` hop.
    pub(crate) fn lend(&self, target: &dyn Value, f: &mut Visitor<'_>) -> Result<(), AccessError> {
        match &self.op {
            NodeOp::Deref { visit, .. } => visit(target, f),
            _ => Err(AccessError::NotReadable),
        }
    }

    /// Lends the value behind a `Deref` hop mutably. The handle itself is
    /// only borrowed shared.
    pub(crate) fn lend_mut(
        &self,
        target: &dyn Value,
        f: &mut VisitorMut<'_>,
    ) -> Result<(), AccessError> {
        match &self.op {
            NodeOp::Deref { visit_mut, .. } => visit_mut(target, f),
            _ => Err(AccessError::NotWritable),
        }
    }

    /// Writes through a `Deref` hop.
    pub(crate) fn set_shared(
        &self,
        target: &dyn Value,
        value: Box<dyn Value>,
    ) -> Result<(), AccessError> {
        let assign = self.assign;
        let mut value = Some(value);
        self.lend_mut(target, &mut |inner| match value.take() {
            Some(value) => assign(inner, value),
            None => Ok(()),
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}, {:?})",
            self.label, self.object_type, self.value_type, self.flags
        )
    }
}
