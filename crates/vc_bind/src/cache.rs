use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;

use crate::access::Access;
use crate::chain::Chain;
use crate::error::RegistrationConflict;
use crate::hash::HashMap;
use crate::value::Type;

/// What [`Resolver::reset`](crate::Resolver::reset) clears.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Drop resolved templates, keep pre-registered accessors.
    #[default]
    KeepRegistered,
    /// Drop everything.
    All,
}

/// Counters of the resolution cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Resolved templates currently cached.
    pub templates: usize,
    /// Pre-registered accessors.
    pub registered: usize,
}

/// Resolved chains and pre-registered accessors, keyed by root type and
/// normalized path.
#[derive(Default)]
pub(crate) struct Cache {
    templates: HashMap<TypeId, HashMap<String, Arc<Chain>>>,
    registered: HashMap<TypeId, HashMap<String, Box<dyn Access>>>,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Returns a duplicate of the accessor registered for `path`.
    pub fn registered(&mut self, ty: TypeId, path: &str) -> Option<Box<dyn Access>> {
        let accessor = self.registered.get(&ty)?.get(path)?.duplicate();
        self.hits += 1;
        log::trace!("registered accessor hit for `{path}`");
        Some(accessor)
    }

    /// Returns the template resolved for `path`.
    pub fn template(&mut self, ty: TypeId, path: &str) -> Option<Arc<Chain>> {
        let chain = Arc::clone(self.templates.get(&ty)?.get(path)?);
        self.hits += 1;
        log::trace!("template hit for `{path}`");
        Some(chain)
    }

    #[inline]
    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn insert_template(&mut self, ty: TypeId, path: String, chain: Arc<Chain>) {
        self.templates.entry(ty).or_default().insert(path, chain);
    }

    /// Stores `accessor` for `path`; an existing registration is kept.
    pub fn register(
        &mut self,
        ty: Type,
        path: String,
        accessor: Box<dyn Access>,
    ) -> Result<(), RegistrationConflict> {
        let entries = self.registered.entry(ty.id()).or_default();
        if entries.contains_key(&path) {
            return Err(RegistrationConflict { ty, path });
        }
        entries.insert(path, accessor);
        Ok(())
    }

    pub fn reset(&mut self, mode: ResetMode) {
        self.templates.clear();
        if mode == ResetMode::All {
            self.registered.clear();
        }
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            templates: self.templates.values().map(|m| m.len()).sum(),
            registered: self.registered.values().map(|m| m.len()).sum(),
        }
    }
}
