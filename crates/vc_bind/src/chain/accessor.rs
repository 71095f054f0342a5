use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::{RefCell, RefMut};
use core::fmt;

use crate::access::Access;
use crate::chain::{Chain, Composition, Scratch};
use crate::convert::ConverterRegistry;
use crate::error::AccessError;
use crate::node::{CallEnv, Param};
use crate::value::{Type, Value};

/// Executes a resolved [`Chain`].
///
/// Besides the root-based [`Access`] interface, a `ChainAccessor` has a
/// bound mode: [`bind`](Self::bind) stores a copy of a root, after which
/// every hop can be read and written individually. Writes into a hop
/// cascade through the cached copies back up to the bound root.
///
/// Root-based calls leave the bound root in place; cached hop values are
/// re-read from it on the next bound call.
///
/// # Examples
///
/// ```
/// use vc_bind::{Bindable, Resolver};
///
/// #[derive(Bindable, Clone, Default)]
/// struct Inner {
///     x: i32,
/// }
///
/// #[derive(Bindable, Clone, Default)]
/// struct Outer {
///     inner: Inner,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Outer>();
/// let chain = resolver.resolve_chain(core::any::TypeId::of::<Outer>(), "inner.x").unwrap();
///
/// chain.bind(&Outer::default()).unwrap();
/// chain.bound_set(1, Box::new(3_i32)).unwrap();
///
/// let root = chain.bound_root().unwrap();
/// assert_eq!(root.downcast_ref::<Outer>().unwrap().inner.x, 3);
/// ```
pub struct ChainAccessor {
    chain: Arc<Chain>,
    registry: Arc<ConverterRegistry>,
    scratch: RefCell<Scratch>,
}

impl ChainAccessor {
    pub(crate) fn new(chain: Arc<Chain>, registry: Arc<ConverterRegistry>) -> Self {
        let scratch = Scratch::new(chain.nodes.len(), Default::default());
        Self {
            chain,
            registry,
            scratch: RefCell::new(scratch),
        }
    }

    /// Returns how the chain is executed.
    #[inline]
    pub fn composition(&self) -> Composition {
        self.chain.composition
    }

    /// Returns the number of hops.
    #[inline]
    pub fn len(&self) -> usize {
        self.chain.nodes.len()
    }

    /// Returns the labels of the hops, e.g. `["inner", "x"]`.
    pub fn hops(&self) -> Vec<String> {
        self.chain.nodes.iter().map(|n| n.label.clone()).collect()
    }

    /// Returns the type produced by hop `hop`.
    pub fn hop_type(&self, hop: usize) -> Option<Type> {
        self.chain.nodes.get(hop).map(|n| n.value_type)
    }

    /// Returns `true` if both accessors execute the same resolved chain.
    #[inline]
    pub fn shares_chain_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chain, &other.chain)
    }

    /// Creates a duplicate carrying the same parameter bindings.
    pub fn duplicate_chain(&self) -> Self {
        let bindings = self
            .scratch
            .try_borrow()
            .map(|s| s.bindings.clone())
            .unwrap_or_default();
        Self {
            chain: Arc::clone(&self.chain),
            registry: Arc::clone(&self.registry),
            scratch: RefCell::new(Scratch::new(self.chain.nodes.len(), bindings)),
        }
    }

    fn scratch(&self) -> Result<RefMut<'_, Scratch>, AccessError> {
        self.scratch
            .try_borrow_mut()
            .map_err(|_| AccessError::Unavailable {
                reason: String::from("the accessor is already in use on this thread"),
            })
    }

    fn check_hop(&self, hop: usize) -> Result<(), AccessError> {
        let len = self.chain.nodes.len();
        if hop < len {
            Ok(())
        } else {
            Err(AccessError::OutOfRange { index: hop as i64, len })
        }
    }

    // -------------------------------------------------------------------------
    // Bound mode

    /// Binds a copy of `root` and reads every hop but the tail into the
    /// cache.
    pub fn bind(&self, root: &dyn Value) -> Result<(), AccessError> {
        let expected = self.chain.object_type();
        if root.runtime_type() != expected {
            return Err(AccessError::TypeMismatch {
                expected,
                actual: root.runtime_type(),
            });
        }

        let mut scratch = self.scratch()?;
        scratch.unbind();
        let Scratch {
            head,
            values,
            fresh,
            bindings,
            indices,
        } = &mut *scratch;
        let head = &**head.insert(root.clone_value());
        let mut env = CallEnv {
            bindings,
            registry: &self.registry,
            indices,
        };
        let last = self.chain.last();
        self.chain.fill(head, values, 0, last, &mut env)?;
        *fresh = last;
        Ok(())
    }

    /// Drops the bound root and the cached hop values.
    pub fn unbind(&self) {
        if let Ok(mut scratch) = self.scratch.try_borrow_mut() {
            scratch.unbind();
        }
    }

    /// Returns a copy of the bound root, with every bound write applied.
    pub fn bound_root(&self) -> Option<Box<dyn Value>> {
        let scratch = self.scratch.try_borrow().ok()?;
        scratch.head.as_deref().map(Value::clone_value)
    }

    /// Reads the value produced by hop `hop` of the bound root.
    pub fn bound_get(&self, hop: usize) -> Result<Box<dyn Value>, AccessError> {
        self.check_hop(hop)?;
        if !self.chain.nodes[..=hop].iter().all(|n| n.can_read()) {
            return Err(AccessError::NotReadable);
        }

        let mut scratch = self.scratch()?;
        let Scratch {
            head,
            values,
            fresh,
            bindings,
            indices,
        } = &mut *scratch;
        let head = head.as_deref().ok_or_else(unbound)?;
        let mut env = CallEnv {
            bindings,
            registry: &self.registry,
            indices,
        };
        if *fresh < hop {
            self.chain.fill(head, values, *fresh, hop, &mut env)?;
            *fresh = hop;
        }
        self.chain.read_hop(head, values, hop, &mut env)
    }

    /// Returns a copy of the container hop `hop` writes into, and marks the
    /// cached values from that hop on as stale.
    pub fn value_to_set(&self, hop: usize) -> Result<Box<dyn Value>, AccessError> {
        self.check_hop(hop)?;
        let mut scratch = self.scratch()?;
        let Scratch {
            head,
            values,
            fresh,
            bindings,
            indices,
        } = &mut *scratch;
        let head = head.as_deref().ok_or_else(unbound)?;
        if *fresh < hop {
            let mut env = CallEnv {
                bindings,
                registry: &self.registry,
                indices,
            };
            self.chain.fill(head, values, *fresh, hop, &mut env)?;
        }
        *fresh = hop;
        match hop {
            0 => Ok(head.clone_value()),
            _ => values[hop - 1]
                .as_deref()
                .map(Value::clone_value)
                .ok_or(AccessError::NotReadable),
        }
    }

    /// Writes `value` as the output of hop `hop` of the bound root.
    ///
    /// The write is pushed back through every container with value
    /// semantics above the hop.
    pub fn bound_set(&self, hop: usize, value: Box<dyn Value>) -> Result<(), AccessError> {
        self.check_hop(hop)?;
        let node = &self.chain.nodes[hop];
        if !node.can_write() {
            return Err(AccessError::NotWritable);
        }
        let value = self.registry.coerce(value, node.value_type)?;

        let mut scratch = self.scratch()?;
        let Scratch {
            head,
            values,
            fresh,
            bindings,
            indices,
        } = &mut *scratch;
        let head = head.as_deref_mut().ok_or_else(unbound)?;
        let mut env = CallEnv {
            bindings,
            registry: &self.registry,
            indices,
        };
        if *fresh < hop {
            self.chain.fill(head, values, *fresh, hop, &mut env)?;
        }
        *fresh = hop;
        self.chain.cascade(head, values, hop, value, &mut env)
    }
}

#[inline]
fn unbound() -> AccessError {
    AccessError::Unavailable {
        reason: String::from("no root is bound"),
    }
}

impl Access for ChainAccessor {
    #[inline]
    fn object_type(&self) -> Type {
        self.chain.object_type()
    }

    #[inline]
    fn value_type(&self) -> Type {
        self.chain.value_type()
    }

    #[inline]
    fn can_read(&self) -> bool {
        self.chain.can_read
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.chain.can_write
    }

    fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        if !self.chain.can_read {
            return Err(AccessError::NotReadable);
        }

        let mut scratch = self.scratch()?;
        let Scratch {
            values,
            fresh,
            bindings,
            indices,
            ..
        } = &mut *scratch;
        let mut env = CallEnv {
            bindings,
            registry: &self.registry,
            indices,
        };
        match self.chain.composition {
            Composition::Single => self.chain.nodes[0].get(0, target, &mut env),
            Composition::Folded => self.chain.folded_get(target, &mut env),
            Composition::Walk => {
                *fresh = 0;
                self.chain.walk_get(target, values, &mut env)
            }
        }
    }

    fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
        if !self.chain.can_write {
            return Err(AccessError::NotWritable);
        }
        let value = self.registry.coerce(value, self.chain.value_type())?;

        let mut scratch = self.scratch()?;
        let Scratch {
            values,
            fresh,
            bindings,
            indices,
            ..
        } = &mut *scratch;
        let mut env = CallEnv {
            bindings,
            registry: &self.registry,
            indices,
        };
        match self.chain.composition {
            Composition::Single => self.chain.nodes[0].set(0, target, &mut env, value),
            Composition::Folded => self.chain.folded_set(target, &mut env, value),
            Composition::Walk => {
                *fresh = 0;
                self.chain.walk_set(target, values, value, &mut env)
            }
        }
    }

    fn duplicate(&self) -> Box<dyn Access> {
        Box::new(self.duplicate_chain())
    }

    #[inline]
    fn instance_key(&self, target: &dyn Value) -> usize {
        (self.chain.identity)(target)
    }

    /// Binds parameter `slot` of hop `hop` for this duplicate only.
    ///
    /// Constant values are converted to the parameter type up front.
    fn bind_parameter(&self, hop: usize, slot: usize, param: Param) -> Result<(), AccessError> {
        self.check_hop(hop)?;
        let node = &self.chain.nodes[hop];
        let len = node.params.len();
        if slot >= len {
            return Err(AccessError::OutOfRange { index: slot as i64, len });
        }
        let param = match param {
            Param::Const(value) => Param::Const(self.registry.coerce(value, node.param_types[slot])?),
            param => param,
        };

        let mut scratch = self.scratch()?;
        scratch.bindings.set(hop, slot, param);
        // Cached values past the hop were computed with the old argument.
        scratch.fresh = scratch.fresh.min(hop);
        Ok(())
    }
}

impl fmt::Debug for ChainAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainAccessor")
            .field("object_type", &self.chain.object_type())
            .field("value_type", &self.chain.value_type())
            .field("chain", &self.chain)
            .finish()
    }
}
