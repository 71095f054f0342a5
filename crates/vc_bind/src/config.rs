use crate::provider::ProviderPolicy;

/// Runtime options of a [`Resolver`](crate::Resolver).
///
/// # Examples
///
/// ```
/// use vc_bind::{Resolver, ResolverConfig};
/// use vc_bind::provider::ProviderPolicy;
///
/// let config = ResolverConfig::default()
///     .with_safe_mode(true)
///     .with_provider_policy(ProviderPolicy::Diagnose);
/// let resolver = Resolver::with_config(config);
/// assert!(resolver.config().safe_mode);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Fold chains of projectable hops into one borrow walk.
    pub fast_path: bool,
    /// Wrap every accessor into a [`SafeAccessor`](crate::safe::SafeAccessor).
    pub safe_mode: bool,
    /// Resolve failing paths to the root itself instead of failing,
    /// logging a warning.
    pub fallback_to_self: bool,
    /// What to do with unregistered provider ids.
    pub provider_policy: ProviderPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fast_path: true,
            safe_mode: false,
            fallback_to_self: false,
            provider_policy: ProviderPolicy::Fail,
        }
    }
}

impl ResolverConfig {
    #[inline]
    pub const fn with_fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    #[inline]
    pub const fn with_safe_mode(mut self, enabled: bool) -> Self {
        self.safe_mode = enabled;
        self
    }

    #[inline]
    pub const fn with_fallback_to_self(mut self, enabled: bool) -> Self {
        self.fallback_to_self = enabled;
        self
    }

    #[inline]
    pub const fn with_provider_policy(mut self, policy: ProviderPolicy) -> Self {
        self.provider_policy = policy;
        self
    }
}
