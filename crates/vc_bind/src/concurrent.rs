//! Sharing accessors between threads.
//!
//! A [`ConcurrentAccessor`] serializes every get and set per target
//! instance. Locks come from a process-wide striped table indexed by the
//! hash of the instance key, so two accessors working on the same object
//! exclude each other while accessors on different objects usually do not.
//!
//! Using another concurrent accessor on the same target, or on a target
//! whose key falls into the same stripe, from inside a getter or setter
//! deadlocks.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::hash::BuildHasher;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::access::Access;
use crate::error::AccessError;
use crate::hash::FixedHashState;
use crate::node::Param;
use crate::value::{Type, Value};

const STRIPES: usize = 64;

/// Idle duplicates kept for reuse.
const POOL_LIMIT: usize = 8;

static INSTANCE_LOCKS: [Mutex<()>; STRIPES] = [const { Mutex::new(()) }; STRIPES];

/// Locks the stripe of the instance identified by `key`.
fn lock_instance(key: usize) -> MutexGuard<'static, ()> {
    let stripe = FixedHashState.hash_one(key) as usize % STRIPES;
    lock(&INSTANCE_LOCKS[stripe])
}

/// A panicked accessor leaves nothing half-initialized behind the lock.
#[inline]
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A thread-safe wrapper around an accessor.
///
/// Each call borrows an idle duplicate of the wrapped accessor, so callers
/// on different threads never share scratch state.
///
/// # Examples
///
/// ```
/// use std::thread;
/// use vc_bind::{Access, Bindable, Resolver, Shared};
///
/// #[derive(Bindable, Clone, Default)]
/// struct Gauge {
///     level: u32,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Shared<Gauge>>();
/// let level = resolver.resolve_of::<Shared<Gauge>>("level").unwrap().make_concurrent();
///
/// let gauge = Shared::new(Gauge::default());
/// thread::scope(|s| {
///     for i in 0..4_u32 {
///         let (level, mut gauge) = (&level, gauge.clone());
///         s.spawn(move || level.set_value(&mut gauge, Box::new(i)).unwrap());
///     }
/// });
/// assert!(gauge.read().level < 4);
/// ```
pub struct ConcurrentAccessor {
    seed: Mutex<Box<dyn Access>>,
    pool: Mutex<Vec<Box<dyn Access>>>,
    object_type: Type,
    value_type: Type,
    can_read: bool,
    can_write: bool,
}

impl ConcurrentAccessor {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn Access>) -> Self {
        Self {
            object_type: inner.object_type(),
            value_type: inner.value_type(),
            can_read: inner.can_read(),
            can_write: inner.can_write(),
            seed: Mutex::new(inner),
            pool: Mutex::new(Vec::new()),
        }
    }

    fn checkout(&self) -> Box<dyn Access> {
        let idle = lock(&self.pool).pop();
        idle.unwrap_or_else(|| lock(&self.seed).duplicate())
    }

    fn checkin(&self, accessor: Box<dyn Access>) {
        let mut pool = lock(&self.pool);
        if pool.len() < POOL_LIMIT {
            pool.push(accessor);
        }
    }

    /// Runs `f` with an idle duplicate while holding the lock of `target`.
    fn with_instance<R>(&self, target: &dyn Value, f: impl FnOnce(&dyn Access) -> R) -> R {
        let accessor = self.checkout();
        let out = {
            let _guard = lock_instance(accessor.instance_key(target));
            f(&*accessor)
        };
        self.checkin(accessor);
        out
    }
}

impl Access for ConcurrentAccessor {
    #[inline]
    fn object_type(&self) -> Type {
        self.object_type
    }

    #[inline]
    fn value_type(&self) -> Type {
        self.value_type
    }

    #[inline]
    fn can_read(&self) -> bool {
        self.can_read
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.can_write
    }

    fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
        self.with_instance(target, |a| a.get_value(target))
    }

    fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
        let accessor = self.checkout();
        let out = {
            let _guard = lock_instance(accessor.instance_key(target));
            accessor.set_value(target, value)
        };
        self.checkin(accessor);
        out
    }

    fn duplicate(&self) -> Box<dyn Access> {
        Box::new(Self::new(lock(&self.seed).duplicate()))
    }

    fn instance_key(&self, target: &dyn Value) -> usize {
        lock(&self.seed).instance_key(target)
    }

    /// Binds the parameter on every future duplicate; idle ones are dropped.
    fn bind_parameter(&self, hop: usize, slot: usize, param: Param) -> Result<(), AccessError> {
        lock(&self.seed).bind_parameter(hop, slot, param)?;
        lock(&self.pool).clear();
        Ok(())
    }

    fn make_concurrent(&self) -> ConcurrentAccessor {
        Self::new(lock(&self.seed).duplicate())
    }
}

impl fmt::Debug for ConcurrentAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentAccessor")
            .field("object_type", &self.object_type)
            .field("value_type", &self.value_type)
            .field("idle", &lock(&self.pool).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use std::thread;

    use super::ConcurrentAccessor;
    use crate::access::Access;
    use crate::error::{AccessError, expect_ref};
    use crate::value::{Shared, Type, Value};

    /// Adds the written amount to a shared counter in two unlocked steps.
    struct Accumulate;

    impl Access for Accumulate {
        fn object_type(&self) -> Type {
            Type::of::<Shared<u64>>()
        }
        fn value_type(&self) -> Type {
            Type::of::<u64>()
        }
        fn can_read(&self) -> bool {
            true
        }
        fn can_write(&self) -> bool {
            true
        }
        fn get_value(&self, target: &dyn Value) -> Result<Box<dyn Value>, AccessError> {
            Ok(Box::new(expect_ref::<Shared<u64>>(target)?.get()))
        }
        fn set_value(&self, target: &mut dyn Value, value: Box<dyn Value>) -> Result<(), AccessError> {
            let counter = expect_ref::<Shared<u64>>(target)?;
            let current = counter.get();
            thread::yield_now();
            counter.set(current + *expect_ref::<u64>(&*value)?);
            Ok(())
        }
        fn duplicate(&self) -> Box<dyn Access> {
            Box::new(Accumulate)
        }
        fn instance_key(&self, target: &dyn Value) -> usize {
            target.downcast_ref::<Shared<u64>>().map_or(0, Shared::addr)
        }
    }

    #[test]
    fn writes_on_one_instance_are_serialized() {
        let accessor = ConcurrentAccessor::new(Box::new(Accumulate));
        let counter = Shared::new(0_u64);

        thread::scope(|s| {
            for _ in 0..8 {
                let (accessor, mut counter) = (&accessor, counter.clone());
                s.spawn(move || {
                    for _ in 0..200 {
                        accessor.set_value(&mut counter, Box::new(1_u64)).unwrap();
                    }
                });
            }
        });

        let total = accessor.get_value(&counter).unwrap();
        assert_eq!(total.downcast_ref::<u64>(), Some(&1600));
    }

    #[test]
    fn is_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<ConcurrentAccessor>();
    }
}
