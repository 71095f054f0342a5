//! The folded composition.
//!
//! Reads borrow straight through the chain and clone only the tail value.
//! Writes borrow mutably down to the tail and assign in place, so nothing
//! is copied and nothing needs to be written back. A `Deref` hop lends its
//! inner object through a lock guard; everything below it runs inside the
//! guard's callback.

use alloc::boxed::Box;

use crate::chain::Chain;
use crate::error::AccessError;
use crate::node::CallEnv;
use crate::value::Value;

impl Chain {
    /// Reads the tail value out of `target`.
    pub(crate) fn folded_get(
        &self,
        target: &dyn Value,
        env: &mut CallEnv<'_>,
    ) -> Result<Box<dyn Value>, AccessError> {
        self.read_from(0, target, env)
    }

    fn read_from(
        &self,
        start: usize,
        target: &dyn Value,
        env: &mut CallEnv<'_>,
    ) -> Result<Box<dyn Value>, AccessError> {
        let mut current = target;
        for hop in start..self.nodes.len() {
            let node = &self.nodes[hop];
            if node.is_deref() {
                let mut out = None;
                node.lend(current, &mut |inner| {
                    out = Some(self.read_from(hop + 1, inner, env)?);
                    Ok(())
                })?;
                return out.ok_or(AccessError::NotReadable);
            }
            current = node.project(hop, current, env)?;
        }
        Ok(current.clone_value())
    }

    /// Writes `value` as the tail value into `target`.
    pub(crate) fn folded_set(
        &self,
        target: &mut dyn Value,
        env: &mut CallEnv<'_>,
        value: Box<dyn Value>,
    ) -> Result<(), AccessError> {
        match self.boundary {
            None => self.write_from(0, target, env, value),
            Some(_) => {
                let mut value = Some(value);
                self.write_shared_from(0, target, env, &mut value)
            }
        }
    }

    /// Walks shared borrows down to the last `Deref` and writes below it.
    fn write_shared_from(
        &self,
        start: usize,
        target: &dyn Value,
        env: &mut CallEnv<'_>,
        value: &mut Option<Box<dyn Value>>,
    ) -> Result<(), AccessError> {
        let Some(boundary) = self.boundary else {
            return Err(AccessError::NotWritable);
        };

        let mut current = target;
        for hop in start..boundary {
            let node = &self.nodes[hop];
            if node.is_deref() {
                return node.lend(current, &mut |inner| {
                    self.write_shared_from(hop + 1, inner, env, value)
                });
            }
            current = node.project(hop, current, env)?;
        }

        let deref = &self.nodes[boundary];
        if boundary == self.last() {
            let value = value.take().ok_or(AccessError::NotWritable)?;
            return deref.set_shared(current, value);
        }
        deref.lend_mut(current, &mut |inner| match value.take() {
            Some(value) => self.write_from(boundary + 1, inner, env, value),
            None => Ok(()),
        })
    }

    /// Walks exclusive borrows from hop `start` and assigns at the tail.
    fn write_from(
        &self,
        start: usize,
        target: &mut dyn Value,
        env: &mut CallEnv<'_>,
        value: Box<dyn Value>,
    ) -> Result<(), AccessError> {
        let last = self.last();
        let mut current = target;
        for hop in start..last {
            current = self.nodes[hop].project_mut(hop, current, env)?;
        }
        self.nodes[last].set(last, current, env, value)
    }
}
