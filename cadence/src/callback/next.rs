//! Around-chain composition.
//!
//! The around callbacks for one dispatch form a nested middleware stack. The
//! first callback in dispatch order is outermost: it receives a [`Next`] whose
//! [`run`](Next::run) invokes the second callback, and so on, until the
//! innermost `Next` invokes the phase action itself.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::context::TransitionContext;
use super::handlers::AroundCallback;
use crate::error::Result;

/// The work wrapped by a dispatch.
///
/// An action may be invoked more than once when an around callback retries,
/// or not at all when one short-circuits.
#[async_trait]
pub trait PhaseAction<O>: Send
where
    O: Send + 'static,
{
    /// Run the action once.
    async fn call(&mut self) -> Result<Option<O>>;
}

/// Adapter turning a synchronous closure into a [`PhaseAction`].
pub struct FnAction<F>(F);

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`PhaseAction`].
///
/// # Example
///
/// ```rust,ignore
/// let mut action = action_fn(|| Ok(Some(42)));
/// let result = executor.execute(&ctx, &mut action).await?;
/// ```
pub const fn action_fn<O, F>(f: F) -> FnAction<F>
where
    O: Send + 'static,
    F: FnMut() -> Result<Option<O>> + Send,
{
    FnAction(f)
}

#[async_trait]
impl<O, F> PhaseAction<O> for FnAction<F>
where
    O: Send + 'static,
    F: FnMut() -> Result<Option<O>> + Send,
{
    async fn call(&mut self) -> Result<Option<O>> {
        (self.0)()
    }
}

/// Handle to the remainder of an around chain.
///
/// Calling [`run`](Self::run) proceeds into the next around callback, or into
/// the phase action once the chain is exhausted. Not calling it skips
/// everything inside the current callback.
pub struct Next<'a, O>
where
    O: Send + 'static,
{
    ctx: &'a TransitionContext,
    chain: &'a [Arc<dyn AroundCallback<O>>],
    action: &'a mut dyn PhaseAction<O>,
}

impl<'a, O> Next<'a, O>
where
    O: Send + 'static,
{
    pub(crate) fn new(
        ctx: &'a TransitionContext,
        chain: &'a [Arc<dyn AroundCallback<O>>],
        action: &'a mut dyn PhaseAction<O>,
    ) -> Self {
        Self { ctx, chain, action }
    }

    /// The transition being dispatched.
    #[must_use]
    pub const fn context(&self) -> &TransitionContext {
        self.ctx
    }

    /// Number of around callbacks still between this handle and the action.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Proceed into the rest of the chain.
    ///
    /// May be called repeatedly; each call runs the inner chain again.
    ///
    /// # Errors
    ///
    /// Returns whatever the inner callbacks or the action raise.
    pub async fn run(&mut self) -> Result<Option<O>> {
        match self.chain.split_first() {
            Some((outer, rest)) => {
                let inner = Next::new(self.ctx, rest, &mut *self.action);
                outer.around(inner).await
            }
            None => self.action.call().await,
        }
    }
}

impl<O> fmt::Debug for Next<'_, O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("ctx", self.ctx)
            .field("remaining", &self.chain.len())
            .finish_non_exhaustive()
    }
}
