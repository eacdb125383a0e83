//! Callback registry with compiled dispatch chains.
//!
//! The registry is populated once per command type at startup, then sealed.
//! Dispatch chains are compiled on demand (or all at once by
//! [`precompile`](CallbackRegistry::precompile)) and cached per
//! [`ChainKey`]. After sealing the registry is read-only, so a cached chain
//! can never go stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::condition::CallbackCondition;
use super::handlers::{
    AfterCallback, AroundCallback, BeforeCallback, CallbackHandler, CallbackKind, ErrorCallback,
    Priority, RegisteredCallback,
};
use super::logging::{LogLevel, LoggingCallbacks};
use super::phase::CallbackPhase;
use crate::config::{LateRegistration, RegistryConfig};
use crate::error::{Error, Result};
use crate::state::{CommandState, TransitionEdge, TransitionTable};

/// Cached, dispatch-ordered callbacks for one [`ChainKey`].
pub type CompiledChain<O> = Arc<[Arc<RegisteredCallback<O>>]>;

/// Identifies one compiled chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChainKey {
    /// Callback kind.
    pub kind: CallbackKind,
    /// State being left.
    pub from: CommandState,
    /// State being entered.
    pub to: CommandState,
    /// Phase being dispatched.
    pub transition: CallbackPhase,
}

impl ChainKey {
    /// Create a key.
    #[must_use]
    pub const fn new(
        kind: CallbackKind,
        from: CommandState,
        to: CommandState,
        transition: CallbackPhase,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            transition,
        }
    }
}

/// Chain cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that compiled a chain.
    pub misses: u64,
    /// Number of cached chains.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Registry of callbacks for one command type.
///
/// # Example
///
/// ```rust,ignore
/// use cadence::callback::{
///     CallbackCondition, CallbackPhase, CallbackRegistry, Priority, before_fn,
/// };
///
/// let registry = CallbackRegistry::<u64>::builder()
///     .before_with(
///         before_fn(|ctx| { tracing::info!(%ctx, "authorising"); Ok(()) }),
///         Priority::HIGH,
///         CallbackCondition::on(CallbackPhase::Execute),
///     )
///     .build_sealed();
/// ```
pub struct CallbackRegistry<O>
where
    O: Send + 'static,
{
    callbacks: Vec<Arc<RegisteredCallback<O>>>,
    config: RegistryConfig,
    sealed: bool,
    /// Chains compiled by `precompile`; read without locking.
    precompiled: HashMap<ChainKey, CompiledChain<O>>,
    /// Chains compiled on first lookup.
    lazy: RwLock<HashMap<ChainKey, CompiledChain<O>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<O> Default for CallbackRegistry<O>
where
    O: Send + 'static,
{
    fn default() -> Self {
        Self::with_config(RegistryConfig::default())
    }
}

impl<O> CallbackRegistry<O>
where
    O: Send + 'static,
{
    /// Create an empty registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with explicit settings.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            callbacks: Vec::new(),
            config,
            sealed: false,
            precompiled: HashMap::new(),
            lazy: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a builder for fluent construction.
    #[must_use]
    pub fn builder() -> CallbackRegistryBuilder<O> {
        CallbackRegistryBuilder::new()
    }

    /// Settings this registry was created with.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a callback.
    ///
    /// Nothing is sorted or compiled here. Any chain compiled so far is
    /// discarded so later lookups see the new callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistrySealed`] after [`seal`](Self::seal), unless the
    /// registry is configured to ignore late registrations.
    pub fn register(
        &mut self,
        handler: CallbackHandler<O>,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Result<()> {
        if self.sealed {
            return match self.config.late_registration {
                LateRegistration::Reject => Err(Error::RegistrySealed),
                LateRegistration::Ignore => {
                    warn!(
                        kind = %handler.kind(),
                        priority = priority.value(),
                        "ignoring callback registered after seal"
                    );
                    Ok(())
                }
            };
        }
        self.push(handler, priority, condition);
        Ok(())
    }

    /// Register a before callback.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_before(
        &mut self,
        callback: impl BeforeCallback + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Result<()> {
        self.register(CallbackHandler::before(callback), priority, condition)
    }

    /// Register an after callback.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_after(
        &mut self,
        callback: impl AfterCallback<O> + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Result<()> {
        self.register(CallbackHandler::after(callback), priority, condition)
    }

    /// Register an around callback.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_around(
        &mut self,
        callback: impl AroundCallback<O> + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Result<()> {
        self.register(CallbackHandler::around(callback), priority, condition)
    }

    /// Register an error callback.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_error(
        &mut self,
        callback: impl ErrorCallback + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Result<()> {
        self.register(CallbackHandler::error(callback), priority, condition)
    }

    fn push(
        &mut self,
        handler: CallbackHandler<O>,
        priority: Priority,
        condition: CallbackCondition,
    ) {
        let sequence = self.callbacks.len() as u64;
        debug!(
            kind = %handler.kind(),
            priority = priority.value(),
            sequence,
            "callback registered"
        );
        self.callbacks.push(Arc::new(RegisteredCallback::new(
            handler, condition, priority, sequence,
        )));

        // Invalidate cache
        self.precompiled.clear();
        self.lazy
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Mark the registry read-only.
    ///
    /// With `precompile_on_seal` set (the default) every chain is compiled
    /// here as well. Sealing twice is a no-op.
    pub fn seal(&mut self) {
        if self.sealed {
            return;
        }
        self.sealed = true;
        if self.config.precompile_on_seal {
            self.precompile_all();
        }
        info!(
            callbacks = self.callbacks.len(),
            chains = self.precompiled.len(),
            "callback registry sealed"
        );
    }

    /// Whether [`seal`](Self::seal) was called.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Whether any callback is registered at all.
    #[must_use]
    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.is_empty()
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Number of registered callbacks of one kind.
    #[must_use]
    pub fn count_of(&self, kind: CallbackKind) -> usize {
        self.callbacks.iter().filter(|cb| cb.kind() == kind).count()
    }

    /// Dispatch-ordered callbacks of `kind` matching the transition.
    ///
    /// Served from the cache when possible; compiled and cached otherwise.
    #[must_use]
    pub fn get(
        &self,
        kind: CallbackKind,
        from: CommandState,
        to: CommandState,
        transition: CallbackPhase,
    ) -> CompiledChain<O> {
        let key = ChainKey::new(kind, from, to, transition);

        if let Some(chain) = self.precompiled.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(chain);
        }

        if let Some(chain) = self
            .lazy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(chain);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let chain = self.compile(&key);
        let mut lazy = self.lazy.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(lazy.entry(key).or_insert(chain))
    }

    /// Compile the chains for every `edge` crossed with every phase, for
    /// every kind.
    ///
    /// Only warms the cache: [`get`](Self::get) returns the same chains with
    /// or without it.
    pub fn precompile(
        &mut self,
        edges: impl IntoIterator<Item = TransitionEdge>,
        phases: &[CallbackPhase],
    ) {
        let edges: Vec<_> = edges.into_iter().collect();
        let mut compiled = 0usize;
        for edge in &edges {
            for &phase in phases {
                for kind in CallbackKind::ALL {
                    let key = ChainKey::new(kind, edge.from, edge.to, phase);
                    if self.precompiled.contains_key(&key) {
                        continue;
                    }
                    let chain = self.compile(&key);
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    self.precompiled.insert(key, chain);
                    compiled += 1;
                }
            }
        }
        debug!(
            edges = edges.len(),
            phases = phases.len(),
            compiled,
            "precompiled callback chains"
        );
    }

    /// Precompile every legal transition crossed with every phase.
    pub fn precompile_all(&mut self) {
        self.precompile(TransitionTable.edges(), &CallbackPhase::ALL);
    }

    /// Cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let lazy = self
            .lazy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.precompiled.len() + lazy,
        }
    }

    /// Filter and sort. The only place dispatch order is decided.
    fn compile(&self, key: &ChainKey) -> CompiledChain<O> {
        let mut chain: Vec<_> = self
            .callbacks
            .iter()
            .filter(|cb| {
                cb.kind() == key.kind && cb.condition().matches(key.from, key.to, key.transition)
            })
            .map(Arc::clone)
            .collect();
        chain.sort_by_key(|cb| cb.dispatch_key());
        chain.into()
    }
}

impl<O> fmt::Debug for CallbackRegistry<O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callbacks.len())
            .field("sealed", &self.sealed)
            .field("cache", &self.cache_stats())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`CallbackRegistry`] with a fluent API.
pub struct CallbackRegistryBuilder<O>
where
    O: Send + 'static,
{
    registry: CallbackRegistry<O>,
}

impl<O> Default for CallbackRegistryBuilder<O>
where
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for CallbackRegistryBuilder<O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistryBuilder")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<O> CallbackRegistryBuilder<O>
where
    O: Send + 'static,
{
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: CallbackRegistry::new(),
        }
    }

    /// Replace the registry settings.
    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.registry.config = config;
        self
    }

    /// Register a before callback on every transition.
    #[must_use]
    pub fn before(self, callback: impl BeforeCallback + 'static) -> Self {
        self.before_with(callback, Priority::NORMAL, CallbackCondition::any())
    }

    /// Register a before callback with priority and condition.
    #[must_use]
    pub fn before_with(
        mut self,
        callback: impl BeforeCallback + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Self {
        self.registry
            .push(CallbackHandler::before(callback), priority, condition);
        self
    }

    /// Register an after callback on every transition.
    #[must_use]
    pub fn after(self, callback: impl AfterCallback<O> + 'static) -> Self {
        self.after_with(callback, Priority::NORMAL, CallbackCondition::any())
    }

    /// Register an after callback with priority and condition.
    #[must_use]
    pub fn after_with(
        mut self,
        callback: impl AfterCallback<O> + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Self {
        self.registry
            .push(CallbackHandler::after(callback), priority, condition);
        self
    }

    /// Register an around callback on every transition.
    #[must_use]
    pub fn around(self, callback: impl AroundCallback<O> + 'static) -> Self {
        self.around_with(callback, Priority::NORMAL, CallbackCondition::any())
    }

    /// Register an around callback with priority and condition.
    #[must_use]
    pub fn around_with(
        mut self,
        callback: impl AroundCallback<O> + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Self {
        self.registry
            .push(CallbackHandler::around(callback), priority, condition);
        self
    }

    /// Register an error callback on every transition.
    #[must_use]
    pub fn on_error(self, callback: impl ErrorCallback + 'static) -> Self {
        self.on_error_with(callback, Priority::NORMAL, CallbackCondition::any())
    }

    /// Register an error callback with priority and condition.
    #[must_use]
    pub fn on_error_with(
        mut self,
        callback: impl ErrorCallback + 'static,
        priority: Priority,
        condition: CallbackCondition,
    ) -> Self {
        self.registry
            .push(CallbackHandler::error(callback), priority, condition);
        self
    }

    /// Add tracing callbacks (before, after, error) on every transition.
    #[must_use]
    pub fn with_logging(self, level: LogLevel) -> Self {
        let logging = LoggingCallbacks::with_level(level);
        self.before_with(logging, Priority::LOWEST, CallbackCondition::any())
            .after_with(logging, Priority::LOWEST, CallbackCondition::any())
            .on_error_with(logging, Priority::LOWEST, CallbackCondition::any())
    }

    /// Build an unsealed registry.
    #[must_use]
    pub fn build(self) -> CallbackRegistry<O> {
        self.registry
    }

    /// Build, seal and (per config) precompile the registry.
    #[must_use]
    pub fn build_sealed(mut self) -> CallbackRegistry<O> {
        self.registry.seal();
        self.registry
    }
}
