//! The generic composition.
//!
//! Every hop reads an owned copy of its value into the scratch cache. A
//! write goes into the cached copy of the tail's container, and from there
//! each copy is written back into its own parent for as long as the
//! containers have value semantics. A hop whose container has reference
//! semantics ends the cascade: the write already reached the shared object.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::chain::Chain;
use crate::error::AccessError;
use crate::node::{Bindings, CallEnv};
use crate::value::Value;

/// Owned per-duplicate state of a [`ChainAccessor`](super::ChainAccessor).
#[derive(Default)]
pub(crate) struct Scratch {
    /// The bound root copy.
    pub head: Option<Box<dyn Value>>,
    /// `values[i]` is the cached output of hop `i`.
    pub values: Vec<Option<Box<dyn Value>>>,
    /// Number of leading entries of `values` that reflect `head`.
    pub fresh: usize,
    pub bindings: Bindings,
    pub indices: Vec<usize>,
}

impl Scratch {
    pub(crate) fn new(hops: usize, bindings: Bindings) -> Self {
        let mut values = Vec::with_capacity(hops);
        values.resize_with(hops, || None);
        Self {
            head: None,
            values,
            fresh: 0,
            bindings,
            indices: Vec::new(),
        }
    }

    /// Drops the bound state.
    pub(crate) fn unbind(&mut self) {
        self.head = None;
        self.fresh = 0;
        self.values.iter_mut().for_each(|v| *v = None);
    }
}

/// The container hop `hop` is applied to.
#[inline]
fn container<'a>(
    head: &'a dyn Value,
    values: &'a [Option<Box<dyn Value>>],
    hop: usize,
) -> Result<&'a dyn Value, AccessError> {
    match hop {
        0 => Ok(head),
        _ => values[hop - 1].as_deref().ok_or(AccessError::NotReadable),
    }
}

impl Chain {
    /// Caches the outputs of hops `from..upto`, reading from `head`.
    pub(crate) fn fill(
        &self,
        head: &dyn Value,
        values: &mut [Option<Box<dyn Value>>],
        from: usize,
        upto: usize,
        env: &mut CallEnv<'_>,
    ) -> Result<(), AccessError> {
        for hop in from..upto {
            let (done, rest) = values.split_at_mut(hop);
            let value = self.nodes[hop].get(hop, container(head, done, hop)?, env)?;
            rest[0] = Some(value);
        }
        Ok(())
    }

    /// Reads the output of hop `hop`; hops before it must be cached.
    pub(crate) fn read_hop(
        &self,
        head: &dyn Value,
        values: &[Option<Box<dyn Value>>],
        hop: usize,
        env: &mut CallEnv<'_>,
    ) -> Result<Box<dyn Value>, AccessError> {
        self.nodes[hop].get(hop, container(head, values, hop)?, env)
    }

    /// Writes `value` as the output of hop `hop` and writes the modified
    /// containers back for as long as they have value semantics.
    ///
    /// Hops before `hop` must be cached. Leaves the cache valid for hops
    /// before `hop`.
    pub(crate) fn cascade(
        &self,
        head: &mut dyn Value,
        values: &mut [Option<Box<dyn Value>>],
        hop: usize,
        value: Box<dyn Value>,
        env: &mut CallEnv<'_>,
    ) -> Result<(), AccessError> {
        let mut hop = hop;
        let mut value = value;
        loop {
            let node = &self.nodes[hop];
            let container: &mut dyn Value = match hop {
                0 => &mut *head,
                _ => values[hop - 1]
                    .as_deref_mut()
                    .ok_or(AccessError::NotWritable)?,
            };
            node.set(hop, container, env, value)?;

            if hop == 0 || !node.is_value_hop() {
                return Ok(());
            }
            value = values[hop - 1]
                .as_deref()
                .ok_or(AccessError::NotWritable)?
                .clone_value();
            hop -= 1;
        }
    }

    /// Generic read of the tail value.
    pub(crate) fn walk_get(
        &self,
        root: &dyn Value,
        values: &mut [Option<Box<dyn Value>>],
        env: &mut CallEnv<'_>,
    ) -> Result<Box<dyn Value>, AccessError> {
        let last = self.last();
        self.fill(root, values, 0, last, env)?;
        self.read_hop(root, values, last, env)
    }

    /// Generic write of the tail value.
    pub(crate) fn walk_set(
        &self,
        root: &mut dyn Value,
        values: &mut [Option<Box<dyn Value>>],
        value: Box<dyn Value>,
        env: &mut CallEnv<'_>,
    ) -> Result<(), AccessError> {
        let last = self.last();
        self.fill(root, values, 0, last, env)?;
        self.cascade(root, values, last, value, env)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::Scratch;
    use crate::chain::Chain;
    use crate::convert::ConverterRegistry;
    use crate::info::{Bindable, DescriptorBuilder, TypeDescriptor, TypeTable, address_identity};
    use crate::node::{Bindings, CallEnv, Node};
    use crate::value::Value;

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Point {
        x: i32,
    }

    impl Bindable for Point {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new()
                .property("x", |p| p.x, |p, v| p.x = v)
                .build()
        }
    }

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Body {
        origin: Point,
    }

    impl Bindable for Body {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new()
                .property("origin", |b| b.origin.clone(), |b, v| b.origin = v)
                .build()
        }
    }

    fn chain(table: &TypeTable) -> Chain {
        let body = table.get_of::<Body>().unwrap();
        let point = table.get_of::<Point>().unwrap();
        let nodes: Vec<Node> = vec![
            Node::member(table, body, body.find_member("origin").unwrap()).unwrap(),
            Node::member(table, point, point.find_member("x").unwrap()).unwrap(),
        ];
        Chain::new(nodes, address_identity, true, "origin.x")
    }

    #[test]
    fn write_cascades_through_copies() {
        let mut table = TypeTable::new();
        table.register::<Body>();
        let chain = chain(&table);
        let registry = ConverterRegistry::from_table(&table);

        let mut scratch = Scratch::new(2, Bindings::default());
        let Scratch {
            values,
            bindings,
            indices,
            ..
        } = &mut scratch;
        let mut env = CallEnv {
            bindings,
            registry: &registry,
            indices,
        };

        let mut body = Body::default();
        chain
            .walk_set(&mut body, values, Box::new(7_i32), &mut env)
            .unwrap();
        assert_eq!(body.origin.x, 7);

        let read = chain.walk_get(&body, values, &mut env).unwrap();
        assert_eq!(read.downcast_ref::<i32>(), Some(&7));
        assert!(values[0].as_deref().is_some_and(|v| v.is::<Point>()));
    }
}
