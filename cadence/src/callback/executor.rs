//! Dispatch of one phase through its callback chains.
//!
//! For a single transition the executor runs, in order:
//!
//! 1. every matching before callback,
//! 2. the around chain wrapping the phase action (see [`Next`]),
//! 3. every matching after callback, threading the result through each.
//!
//! A raised error at any step skips the rest, runs every matching error
//! callback as an observer, and is then returned unchanged.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::context::TransitionContext;
use super::handlers::{AroundCallback, CallbackKind};
use super::next::{Next, PhaseAction};
use super::registry::{CallbackRegistry, CompiledChain};
use crate::error::Result;

/// Runs phase actions through the callbacks of a shared registry.
pub struct CallbackExecutor<O>
where
    O: Send + 'static,
{
    registry: Arc<CallbackRegistry<O>>,
}

impl<O> Clone for CallbackExecutor<O>
where
    O: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<O> fmt::Debug for CallbackExecutor<O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackExecutor")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<O> CallbackExecutor<O>
where
    O: Send + 'static,
{
    /// Create an executor over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<CallbackRegistry<O>>) -> Self {
        Self { registry }
    }

    /// The registry callbacks are drawn from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<CallbackRegistry<O>> {
        &self.registry
    }

    /// Dispatch `action` for the transition described by `ctx`.
    ///
    /// With no callbacks registered at all the action is called directly.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a before callback, the around chain,
    /// the action, or an after callback, after every matching error callback
    /// has observed it.
    pub async fn execute(
        &self,
        ctx: &TransitionContext,
        action: &mut dyn PhaseAction<O>,
    ) -> Result<Option<O>> {
        if !self.registry.has_callbacks() {
            return action.call().await;
        }

        let chain = |kind| {
            self.registry
                .get(kind, ctx.from(), ctx.to(), ctx.transition())
        };
        let before = chain(CallbackKind::Before);
        let around = chain(CallbackKind::Around);
        let after = chain(CallbackKind::After);
        let errors = chain(CallbackKind::Error);

        trace!(
            transition = %ctx.transition(),
            before = before.len(),
            around = around.len(),
            after = after.len(),
            error = errors.len(),
            "dispatching"
        );

        match Self::dispatch(ctx, &before, &around, &after, action).await {
            Ok(result) => Ok(result),
            Err(err) => {
                for callback in errors.iter().filter_map(|cb| cb.as_error()) {
                    callback.on_error(ctx, &err).await;
                }
                Err(err)
            }
        }
    }

    async fn dispatch(
        ctx: &TransitionContext,
        before: &CompiledChain<O>,
        around: &CompiledChain<O>,
        after: &CompiledChain<O>,
        action: &mut dyn PhaseAction<O>,
    ) -> Result<Option<O>> {
        for callback in before.iter().filter_map(|cb| cb.as_before()) {
            callback.before(ctx).await?;
        }

        let wrappers: Vec<Arc<dyn AroundCallback<O>>> = around
            .iter()
            .filter_map(|cb| cb.as_around())
            .map(Arc::clone)
            .collect();
        let mut result = Next::new(ctx, &wrappers, action).run().await?;

        for callback in after.iter().filter_map(|cb| cb.as_after()) {
            result = callback.after(ctx, result).await?;
        }
        Ok(result)
    }
}
