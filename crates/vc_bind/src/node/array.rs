use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::AccessError;
use crate::info::{ArrayProjectFn, ArrayProjectMutFn, ArrayRank, TypeTable};
use crate::node::{Node, NodeFlags, NodeOp, Param};
use crate::value::{Type, Value};

/// One array level of an `Array` hop and the number of indices it takes.
#[derive(Clone)]
pub(crate) struct ArrayLevel {
    consumes: usize,
    get: ArrayProjectFn,
    get_mut: ArrayProjectMutFn,
}

pub(super) fn project<'a>(
    levels: &[ArrayLevel],
    indices: &[usize],
    target: &'a dyn Value,
) -> Result<&'a dyn Value, AccessError> {
    let mut current = target;
    let mut start = 0;
    for level in levels {
        let end = start + level.consumes;
        current = (level.get)(current, &indices[start..end])?;
        start = end;
    }
    Ok(current)
}

pub(super) fn project_mut<'a>(
    levels: &[ArrayLevel],
    indices: &[usize],
    target: &'a mut dyn Value,
) -> Result<&'a mut dyn Value, AccessError> {
    let mut current = target;
    let mut start = 0;
    for level in levels {
        let end = start + level.consumes;
        current = (level.get_mut)(current, &indices[start..end])?;
        start = end;
    }
    Ok(current)
}

impl Node {
    /// Creates a raw array hop taking one index per slot of `params`.
    ///
    /// Nested arrays consume their rank level by level; a level of dynamic
    /// rank takes every remaining index. Returns `None` if the indices do
    /// not fit the array levels of `object`.
    pub(crate) fn array(
        table: &TypeTable,
        object: Type,
        params: Box<[Param]>,
        label: String,
    ) -> Option<Self> {
        let object = table.get(object.id())?;
        let mut levels = Vec::new();
        let mut current = object;
        let mut remaining = params.len();

        while remaining > 0 {
            let info = current.array.as_ref()?;
            let consumes = match info.rank {
                ArrayRank::Fixed(rank) if rank > 0 && rank <= remaining => rank,
                ArrayRank::Fixed(_) => return None,
                ArrayRank::Dynamic => remaining,
            };
            levels.push(ArrayLevel {
                consumes,
                get: info.get.clone(),
                get_mut: info.get_mut.clone(),
            });
            remaining -= consumes;
            current = table.get(info.element.id())?;
        }
        if levels.is_empty() {
            return None;
        }

        let types = params.iter().map(|_| Type::of::<usize>()).collect();
        let flags = NodeFlags::READ
            | NodeFlags::WRITE
            | NodeFlags::PROJECTABLE
            | NodeFlags::ASSIGN_IN_PLACE;
        let op = NodeOp::Array {
            levels: levels.into_boxed_slice(),
        };
        Some(Self::new(op, object, current, flags, label).with_params(params, types))
    }
}
