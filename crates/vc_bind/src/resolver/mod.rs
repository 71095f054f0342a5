//! The resolver: owns the type table, providers, conversions and cache,
//! and turns `(root type, path)` pairs into accessors.

// -----------------------------------------------------------------------------
// Modules

mod build;

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::access::{Access, TypedAccessor};
use crate::cache::{Cache, CacheStats, ResetMode};
use crate::chain::{Chain, ChainAccessor};
use crate::config::ResolverConfig;
use crate::convert::{ConverterBridge, ConverterRegistry, Converters};
use crate::error::{RegistrationConflict, ResolveError};
use crate::hash::{HashMap, HashSet};
use crate::info::{Bindable, TypeDescriptor, TypeTable};
use crate::material::{Material, MaterialProvider};
use crate::node::Node;
use crate::path::BindingPath;
use crate::provider::{
    Diagnostic, DiagnosticHook, PathProvider, ProviderPolicy, UnavailableAccessor,
};
use crate::safe::SafeAccessor;
use crate::value::{Type, Value};

use build::Builder;

// -----------------------------------------------------------------------------
// Resolver

/// Resolves paths against registered types.
///
/// Resolved chains are cached per root type and normalized path; every
/// request returns a private duplicate.
///
/// # Examples
///
/// ```
/// use vc_bind::{Access, Bindable, Resolver};
///
/// #[derive(Bindable, Clone, Default)]
/// struct Inventory {
///     items: Vec<u32>,
/// }
///
/// let mut resolver = Resolver::new();
/// resolver.register::<Inventory>();
///
/// let third = resolver.resolve_of::<Inventory>("items[2]").unwrap();
/// assert!(third.value_type().is::<u32>());
///
/// let mut inventory = Inventory { items: vec![1, 2, 3, 4, 5] };
/// third.set_value(&mut inventory, Box::new(30_u32)).unwrap();
/// assert_eq!(inventory.items[2], 30);
///
/// // Out of range indices only fail when accessed.
/// let eleventh = resolver.resolve_of::<Inventory>("items[10]").unwrap();
/// assert!(eleventh.get_value(&inventory).is_err());
/// ```
pub struct Resolver {
    table: TypeTable,
    providers: HashMap<String, Arc<dyn PathProvider>>,
    converters: Arc<ConverterRegistry>,
    converters_stale: bool,
    cache: Cache,
    config: ResolverConfig,
    diagnostic_hook: Option<DiagnosticHook>,
}

impl Default for Resolver {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Creates a resolver with the default configuration.
    ///
    /// Primitives and [`Material`] are registered, as is the
    /// [`MaterialProvider`].
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates a resolver with `config`.
    pub fn with_config(config: ResolverConfig) -> Self {
        let mut resolver = Self {
            table: TypeTable::new(),
            providers: HashMap::default(),
            converters: Arc::new(ConverterRegistry::new()),
            converters_stale: true,
            cache: Cache::default(),
            config,
            diagnostic_hook: None,
        };
        resolver.register::<Material>();
        resolver.register_provider(MaterialProvider);
        resolver
    }

    #[inline]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Replaces the configuration and drops resolved templates.
    pub fn set_config(&mut self, config: ResolverConfig) {
        self.config = config;
        self.cache.reset(ResetMode::KeepRegistered);
    }

    #[inline]
    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers `T` and the types it depends on.
    pub fn register<T: Bindable>(&mut self) {
        self.table.register::<T>();
        self.converters_stale = true;
    }

    /// Inserts a hand-built descriptor, unless its type is already present.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> bool {
        self.converters_stale = true;
        self.table.try_insert(descriptor)
    }

    /// Registers every type marked `#[bind(auto_register)]`.
    ///
    /// Returns `false` if auto registration is not available.
    pub fn auto_register(&mut self) -> bool {
        self.converters_stale = true;
        self.table.auto_register()
    }

    /// Registers `provider` under its id, replacing any previous one.
    pub fn register_provider(&mut self, provider: impl PathProvider + 'static) {
        let id = String::from(provider.id());
        log::debug!("registered path provider `{id}`");
        self.providers.insert(id, Arc::new(provider));
    }

    /// Returns the provider registered under `id`.
    pub fn provider(&self, id: &str) -> Option<&dyn PathProvider> {
        self.providers.get(id).map(|p| &**p)
    }

    /// Pre-registers `accessor` for `path` on the accessor's object type.
    ///
    /// Pre-registered accessors take precedence over resolution. `path`
    /// is normalized when it parses.
    pub fn register_accessor(
        &mut self,
        path: &str,
        accessor: Box<dyn Access>,
    ) -> Result<(), RegistrationConflict> {
        let key = match BindingPath::parse(path) {
            Ok(path) => String::from(path.as_str()),
            Err(_) => String::from(path.trim()),
        };
        self.cache.register(accessor.object_type(), key, accessor)
    }

    /// Installs the hook receiving diagnostics under
    /// [`ProviderPolicy::Diagnose`].
    pub fn set_diagnostic_hook(&mut self, hook: impl Fn(&Diagnostic) + Send + Sync + 'static) {
        self.diagnostic_hook = Some(Box::new(hook));
    }

    // -------------------------------------------------------------------------
    // Cache

    /// Drops resolved templates, and pre-registered accessors with
    /// [`ResetMode::All`].
    pub fn reset(&mut self, mode: ResetMode) {
        log::debug!("resetting the resolution cache ({mode:?})");
        self.cache.reset(mode);
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // -------------------------------------------------------------------------
    // Resolution

    /// Resolves `path` on the type `ty`.
    pub fn resolve(&mut self, ty: TypeId, path: &str) -> Result<Box<dyn Access>, ResolveError> {
        let root = self.root_type(ty);
        let path = BindingPath::parse(path)?;
        if let Some(accessor) = self.cache.registered(ty, path.as_str()) {
            return Ok(self.finish(accessor));
        }
        let accessor = match self.template(root, &path) {
            Ok(chain) => Box::new(ChainAccessor::new(chain, self.registry())),
            Err(err) => self.recover(root, &path, err)?,
        };
        Ok(self.finish(accessor))
    }

    /// Resolves `path` on `R`.
    #[inline]
    pub fn resolve_of<R: 'static>(&mut self, path: &str) -> Result<Box<dyn Access>, ResolveError> {
        self.resolve(TypeId::of::<R>(), path)
    }

    /// Resolves `path` on `ty` to the bare chain accessor, with its bound
    /// mode. Pre-registered accessors, safe mode and the self fallback do
    /// not apply.
    pub fn resolve_chain(&mut self, ty: TypeId, path: &str) -> Result<ChainAccessor, ResolveError> {
        let root = self.root_type(ty);
        let path = BindingPath::parse(path)?;
        let chain = self.template(root, &path)?;
        Ok(ChainAccessor::new(chain, self.registry()))
    }

    /// Resolves `path` on `ty` to an accessor of `requested` values.
    ///
    /// A declared narrowing between the path's type and `requested` is
    /// appended as a hop; otherwise values are converted with `converters`
    /// and the default conversions. Missing conversions never fail
    /// resolution, they make the accessor unreadable or unwritable.
    pub fn resolve_typed(
        &mut self,
        ty: TypeId,
        path: &str,
        requested: Type,
        converters: &Converters,
    ) -> Result<Box<dyn Access>, ResolveError> {
        let root = self.root_type(ty);
        let path = BindingPath::parse(path)?;
        if let Some(accessor) = self.cache.registered(ty, path.as_str()) {
            let adapted = self.adapt(accessor, requested, converters);
            return Ok(self.finish(adapted));
        }
        let accessor = match self.template(root, &path) {
            Ok(chain) => self.adapt_chain(chain, requested, converters),
            Err(err) => {
                let recovered = self.recover(root, &path, err)?;
                self.adapt(recovered, requested, converters)
            }
        };
        Ok(self.finish(accessor))
    }

    /// Resolves `path` on `R` to a typed accessor of `V` values.
    #[inline]
    pub fn resolve_as<R: Value, V: Value>(
        &mut self,
        path: &str,
    ) -> Result<TypedAccessor<R, V>, ResolveError> {
        self.resolve_as_with(path, &Converters::new())
    }

    /// [`resolve_as`](Self::resolve_as) with consumer supplied converters.
    pub fn resolve_as_with<R: Value, V: Value>(
        &mut self,
        path: &str,
        converters: &Converters,
    ) -> Result<TypedAccessor<R, V>, ResolveError> {
        let inner = self.resolve_typed(TypeId::of::<R>(), path, Type::of::<V>(), converters)?;
        Ok(TypedAccessor::new(inner))
    }

    fn root_type(&self, ty: TypeId) -> Type {
        self.table
            .get(ty)
            .map_or(Type::from_raw(ty, "{unregistered}"), |d| d.ty)
    }

    fn registry(&mut self) -> Arc<ConverterRegistry> {
        if self.converters_stale {
            self.converters = Arc::new(ConverterRegistry::from_table(&self.table));
            self.converters_stale = false;
        }
        Arc::clone(&self.converters)
    }

    /// Returns the cached chain for `path`, resolving it on a miss.
    fn template(&mut self, root: Type, path: &BindingPath) -> Result<Arc<Chain>, ResolveError> {
        if let Some(chain) = self.cache.template(root.id(), path.as_str()) {
            return Ok(chain);
        }
        self.cache.miss();

        let registry = self.registry();
        let desc = self
            .table
            .get(root.id())
            .ok_or(ResolveError::UnregisteredType { ty: root })?;
        let builder = Builder {
            table: &self.table,
            providers: &self.providers,
            registry: &registry,
        };
        let nodes = builder.build(desc, path)?;
        let chain = Arc::new(Chain::new(
            nodes,
            desc.identity,
            self.config.fast_path,
            path.as_str(),
        ));

        log::debug!(
            "resolved `{path}` on `{root}` to `{}` ({})",
            chain.value_type(),
            chain.composition,
        );
        self.cache
            .insert_template(root.id(), String::from(path.as_str()), Arc::clone(&chain));
        Ok(chain)
    }

    /// Applies the provider policy and the self fallback to a failed
    /// resolution.
    fn recover(
        &mut self,
        root: Type,
        path: &BindingPath,
        err: ResolveError,
    ) -> Result<Box<dyn Access>, ResolveError> {
        if matches!(
            err,
            ResolveError::UnregisteredProvider { .. } | ResolveError::Provider { .. }
        ) && self.config.provider_policy == ProviderPolicy::Diagnose
        {
            log::warn!("`{path}` on `{root}` is unavailable: {err}");
            let accessor = UnavailableAccessor::new(root, &err);
            if let Some(hook) = &self.diagnostic_hook {
                hook(&Diagnostic {
                    ty: root,
                    path: String::from(path.as_str()),
                    error: err,
                });
            }
            return Ok(Box::new(accessor));
        }

        if self.config.fallback_to_self {
            let registry = self.registry();
            if let Some(desc) = self.table.get(root.id()) {
                log::warn!("`{path}` on `{root}` falls back to the root itself: {err}");
                let chain = Chain::new(vec![Node::this(desc)], desc.identity, false, "this");
                return Ok(Box::new(ChainAccessor::new(Arc::new(chain), registry)));
            }
        }

        Err(err)
    }

    /// Appends a narrowing hop, or bridges to `requested`.
    fn adapt_chain(
        &mut self,
        chain: Arc<Chain>,
        requested: Type,
        converters: &Converters,
    ) -> Box<dyn Access> {
        let tail = chain.value_type();
        let registry = self.registry();
        if tail == requested {
            return Box::new(ChainAccessor::new(chain, registry));
        }

        let narrow = self
            .table
            .get(tail.id())
            .and_then(|base| Node::narrow(&self.table, base, base.narrowing_to(requested)?));
        let hop = narrow.or_else(|| {
            let base = self.table.get(requested.id())?;
            Node::widen(&self.table, base, base.narrowing_to(tail)?)
        });
        if let Some(hop) = hop {
            log::debug!("narrowing `{tail}` to `{requested}`");
            let mut nodes = chain.nodes.to_vec();
            nodes.push(hop);
            let narrowed = Chain::new(nodes, chain.identity, self.config.fast_path, "");
            return Box::new(ChainAccessor::new(Arc::new(narrowed), registry));
        }

        let inner = Box::new(ChainAccessor::new(chain, Arc::clone(&registry)));
        Box::new(ConverterBridge::new(inner, requested, converters, registry))
    }

    fn adapt(
        &mut self,
        accessor: Box<dyn Access>,
        requested: Type,
        converters: &Converters,
    ) -> Box<dyn Access> {
        if accessor.value_type() == requested {
            return accessor;
        }
        Box::new(ConverterBridge::new(accessor, requested, converters, self.registry()))
    }

    fn finish(&self, accessor: Box<dyn Access>) -> Box<dyn Access> {
        if !self.config.safe_mode {
            return accessor;
        }
        let default = self
            .table
            .get(accessor.value_type().id())
            .and_then(|d| d.default);
        Box::new(SafeAccessor::new(accessor, default))
    }

    // -------------------------------------------------------------------------
    // Enumeration

    /// Lists the field and property paths reachable from `ty`, through
    /// optionals and shared handles. Recursive types are expanded once.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_bind::{Bindable, Resolver};
    ///
    /// #[derive(Bindable, Clone)]
    /// struct Inner {
    ///     x: i32,
    /// }
    ///
    /// #[derive(Bindable, Clone)]
    /// struct Outer {
    ///     inner: Inner,
    ///     label: Option<String>,
    /// }
    ///
    /// let mut resolver = Resolver::new();
    /// resolver.register::<Outer>();
    /// let paths = resolver.member_paths(core::any::TypeId::of::<Outer>());
    /// assert_eq!(paths, ["inner", "inner.x", "label", "label.len"]);
    /// ```
    pub fn member_paths(&self, ty: TypeId) -> Vec<String> {
        let mut out = Vec::new();
        let mut visiting = HashSet::default();
        self.collect_paths(ty, "", &mut visiting, &mut out);
        out
    }

    fn collect_paths(
        &self,
        ty: TypeId,
        prefix: &str,
        visiting: &mut HashSet<TypeId>,
        out: &mut Vec<String>,
    ) {
        let Some(mut desc) = self.table.get(ty) else {
            return;
        };
        while let Some(wrapper) = &desc.wrapper {
            match self.table.get(wrapper.inner().id()) {
                Some(inner) => desc = inner,
                None => return,
            }
        }
        if !visiting.insert(desc.ty.id()) {
            return;
        }
        for member in &desc.members {
            let path = match prefix {
                "" => String::from(member.name),
                _ => format!("{prefix}.{}", member.name),
            };
            out.push(path.clone());
            self.collect_paths(member.value_type.id(), &path, visiting, out);
        }
        visiting.remove(&desc.ty.id());
    }

    /// Lists the provider segments every registered provider offers for
    /// `source`, as `[@id:path]`.
    pub fn provider_paths(&self, source: &dyn Value) -> Vec<String> {
        let mut providers: Vec<_> = self.providers.values().collect();
        providers.sort_by(|a, b| a.id().cmp(b.id()));
        providers
            .into_iter()
            .flat_map(|p| {
                p.available_paths(source)
                    .into_iter()
                    .map(move |path| format!("[@{}:{path}]", p.id()))
            })
            .collect()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("types", &self.table.len())
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish()
    }
}
