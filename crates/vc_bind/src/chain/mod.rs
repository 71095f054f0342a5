//! Chains of resolved nodes and the accessor that executes them.
//!
//! A [`Chain`] is immutable and shared between every duplicate resolved
//! from the same template. Each [`ChainAccessor`] duplicate owns its own
//! scratch state: the bound-value cache, parameter bindings and the index
//! buffer of high-rank array hops.

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod composer;
mod walk;

// -----------------------------------------------------------------------------
// Exports

pub use accessor::ChainAccessor;

pub(crate) use walk::Scratch;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::info::IdentityFn;
use crate::node::Node;
use crate::value::Type;

// -----------------------------------------------------------------------------
// Composition

/// How a [`ChainAccessor`] executes its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composition {
    /// One hop, executed directly.
    Single,
    /// Hop by hop through owned copies, writes cascading back up the chain.
    Walk,
    /// One nested borrow walk, writes performed in place.
    Folded,
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.pad("single"),
            Self::Walk => f.pad("walk"),
            Self::Folded => f.pad("folded"),
        }
    }
}

// -----------------------------------------------------------------------------
// Chain

/// Linked nodes: node `i`'s value type is node `i + 1`'s object type.
pub(crate) struct Chain {
    pub nodes: Box<[Node]>,
    pub composition: Composition,
    pub can_read: bool,
    pub can_write: bool,
    /// Index of the last `Deref` hop, where folded writes switch from
    /// shared to exclusive borrows.
    pub boundary: Option<usize>,
    /// Identity of instances of the head object type.
    pub identity: IdentityFn,
    #[cfg(all(debug_assertions, feature = "debug"))]
    pub path: Box<str>,
}

impl Chain {
    /// Links `nodes` into a chain.
    ///
    /// `nodes` must be non-empty and type-linked. `fold` allows the folded
    /// composition when every hop supports it.
    pub(crate) fn new(nodes: Vec<Node>, identity: IdentityFn, fold: bool, path: &str) -> Self {
        debug_assert!(!nodes.is_empty());
        debug_assert!(
            nodes
                .windows(2)
                .all(|w| w[0].value_type == w[1].object_type)
        );
        #[cfg(not(all(debug_assertions, feature = "debug")))]
        let _ = path;

        let last = nodes.len() - 1;
        let can_read = nodes.iter().all(Node::can_read);
        let can_write = nodes[last].can_write()
            && nodes[..last].iter().all(Node::can_read)
            && cascade_is_writable(&nodes);

        let foldable = nodes.iter().all(Node::is_projectable)
            && nodes.iter().all(|n| n.is_value_hop() || n.is_deref());
        let composition = match nodes.len() {
            1 => Composition::Single,
            _ if fold && foldable => Composition::Folded,
            _ => Composition::Walk,
        };
        let boundary = nodes.iter().rposition(Node::is_deref);

        log::debug!(
            "linked {} hop(s) from `{}` to `{}` ({composition})",
            nodes.len(),
            nodes[0].object_type,
            nodes[last].value_type,
        );

        Self {
            nodes: nodes.into_boxed_slice(),
            composition,
            can_read,
            can_write,
            boundary,
            identity,
            #[cfg(all(debug_assertions, feature = "debug"))]
            path: path.into(),
        }
    }

    #[inline]
    pub(crate) fn object_type(&self) -> Type {
        self.nodes[0].object_type
    }

    #[inline]
    pub(crate) fn value_type(&self) -> Type {
        self.nodes[self.nodes.len() - 1].value_type
    }

    #[inline]
    pub(crate) fn last(&self) -> usize {
        self.nodes.len() - 1
    }
}

/// Every hop that receives a written-back container must be writable.
///
/// After the tail writes into a copy of its container, the copy is pushed
/// into the previous hop as long as the container has value semantics.
fn cascade_is_writable(nodes: &[Node]) -> bool {
    for hop in (1..nodes.len()).rev() {
        if !nodes[hop].is_value_hop() {
            return true;
        }
        if !nodes[hop - 1].can_write() {
            return false;
        }
    }
    true
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Chain");
        #[cfg(all(debug_assertions, feature = "debug"))]
        s.field("path", &self.path);
        s.field("composition", &self.composition)
            .field("nodes", &self.nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{Chain, Composition};
    use crate::info::{Bindable, DescriptorBuilder, TypeDescriptor, TypeTable, address_identity};
    use crate::node::Node;
    use crate::value::Shared;

    #[derive(Clone, Default)]
    struct Leaf {
        v: u8,
        computed: u8,
    }

    impl Bindable for Leaf {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new()
                .field("v", |l| &l.v, |l| &mut l.v)
                .property("computed", |l| l.computed, |l, v| l.computed = v)
                .build()
        }
    }

    #[derive(Clone, Default)]
    struct Root {
        leaf: Leaf,
        handle: Shared<Leaf>,
    }

    impl Bindable for Root {
        fn descriptor() -> TypeDescriptor {
            DescriptorBuilder::<Self>::new()
                .field("leaf", |r| &r.leaf, |r| &mut r.leaf)
                .readonly_field("handle", |r| &r.handle)
                .build()
        }
    }

    fn nodes(table: &TypeTable, names: &[&str]) -> alloc::vec::Vec<Node> {
        let mut out = vec![];
        let mut ty = core::any::TypeId::of::<Root>();
        for name in names {
            let desc = table.get(ty).unwrap();
            let node = if *name == "*" {
                Node::wrapper(table, desc).unwrap()
            } else {
                Node::member(table, desc, desc.find_member(name).unwrap()).unwrap()
            };
            ty = node.value_type.id();
            out.push(node);
        }
        out
    }

    #[test]
    fn composition_choice() {
        let mut table = TypeTable::new();
        table.register::<Root>();

        let chain = Chain::new(nodes(&table, &["leaf", "v"]), address_identity, true, "");
        assert_eq!(chain.composition, Composition::Folded);
        assert!(chain.can_write);

        let chain = Chain::new(nodes(&table, &["leaf", "v"]), address_identity, false, "");
        assert_eq!(chain.composition, Composition::Walk);

        let chain = Chain::new(nodes(&table, &["leaf", "computed"]), address_identity, true, "");
        assert_eq!(chain.composition, Composition::Walk);

        let chain = Chain::new(nodes(&table, &["leaf"]), address_identity, true, "");
        assert_eq!(chain.composition, Composition::Single);
    }

    #[test]
    fn reference_hops_stop_the_cascade() {
        let mut table = TypeTable::new();
        table.register::<Root>();

        // `handle` is read-only, but writes below the deref never reach it.
        let chain = Chain::new(nodes(&table, &["handle", "*", "v"]), address_identity, true, "");
        assert!(chain.can_write);
        assert_eq!(chain.boundary, Some(1));
        assert_eq!(chain.composition, Composition::Folded);

        // Writing `handle` itself needs the field to be writable.
        let chain = Chain::new(nodes(&table, &["handle"]), address_identity, true, "");
        assert!(!chain.can_write);
    }
}
