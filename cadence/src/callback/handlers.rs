//! Callback traits, kinds and priorities.
//!
//! Four kinds of callback can be hooked onto a transition:
//!
//! | Kind     | Trait              | Sees                        | Can change flow          |
//! |----------|--------------------|-----------------------------|--------------------------|
//! | before   | [`BeforeCallback`] | the transition              | by raising (aborts)      |
//! | around   | [`AroundCallback`] | the transition and [`Next`] | by skipping or repeating |
//! | after    | [`AfterCallback`]  | the result                  | by replacing the result  |
//! | error    | [`ErrorCallback`]  | the raised error            | never                    |
//!
//! Error callbacks return `()`. They observe a fault; they cannot swallow it.
//!
//! Every trait is object-safe. For quick registrations, the `*_fn` adapters
//! turn closures into callbacks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::condition::CallbackCondition;
use super::context::TransitionContext;
use super::next::Next;
use crate::error::{Error, Result};

/// Which hook slot a callback occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    /// Runs before the action.
    Before,
    /// Runs after a successful action, in a result pipeline.
    After,
    /// Wraps the action.
    Around,
    /// Observes a raised fault.
    Error,
}

impl CallbackKind {
    /// Every kind, in dispatch order.
    pub const ALL: [Self; 4] = [Self::Before, Self::Around, Self::After, Self::Error];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Around => "around",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch priority. Lower values run earlier.
///
/// Callbacks with equal priority run in registration order.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    /// Runs before everything else.
    pub const HIGHEST: Self = Self(-1000);
    /// Runs early.
    pub const HIGH: Self = Self(-100);
    /// The default.
    pub const NORMAL: Self = Self(0);
    /// Runs late.
    pub const LOW: Self = Self(100);
    /// Runs after everything else.
    pub const LOWEST: Self = Self(1000);

    /// Raw priority value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Callback run before the action.
///
/// Raising aborts the dispatch: remaining before callbacks, the action and
/// all after callbacks are skipped, and the error callbacks run.
#[async_trait]
pub trait BeforeCallback: Send + Sync {
    /// Inspect the transition before it runs.
    async fn before(&self, ctx: &TransitionContext) -> Result<()>;
}

/// Callback run after a successful action.
///
/// Each after callback receives the current result and returns the result
/// passed to the next one.
#[async_trait]
pub trait AfterCallback<O>: Send + Sync
where
    O: Send + 'static,
{
    /// Observe or transform the result.
    async fn after(&self, ctx: &TransitionContext, result: Option<O>) -> Result<Option<O>>;
}

/// Callback wrapping the action as middleware.
///
/// Call [`Next::run`] to proceed. Returning without calling it short-circuits
/// everything nested inside this callback.
#[async_trait]
pub trait AroundCallback<O>: Send + Sync
where
    O: Send + 'static,
{
    /// Wrap the rest of the chain.
    async fn around(&self, next: Next<'_, O>) -> Result<Option<O>>;
}

/// Observer notified when a dispatch raises.
///
/// The fault is re-raised after every error callback ran, whatever they do.
#[async_trait]
pub trait ErrorCallback: Send + Sync {
    /// Observe the fault.
    async fn on_error(&self, ctx: &TransitionContext, error: &Error);
}

/// A callback of any kind. The variant fixes the kind.
pub enum CallbackHandler<O>
where
    O: Send + 'static,
{
    /// Before callback.
    Before(Arc<dyn BeforeCallback>),
    /// After callback.
    After(Arc<dyn AfterCallback<O>>),
    /// Around callback.
    Around(Arc<dyn AroundCallback<O>>),
    /// Error callback.
    Error(Arc<dyn ErrorCallback>),
}

impl<O> CallbackHandler<O>
where
    O: Send + 'static,
{
    /// Wrap a before callback.
    #[must_use]
    pub fn before(callback: impl BeforeCallback + 'static) -> Self {
        Self::Before(Arc::new(callback))
    }

    /// Wrap an after callback.
    #[must_use]
    pub fn after(callback: impl AfterCallback<O> + 'static) -> Self {
        Self::After(Arc::new(callback))
    }

    /// Wrap an around callback.
    #[must_use]
    pub fn around(callback: impl AroundCallback<O> + 'static) -> Self {
        Self::Around(Arc::new(callback))
    }

    /// Wrap an error callback.
    #[must_use]
    pub fn error(callback: impl ErrorCallback + 'static) -> Self {
        Self::Error(Arc::new(callback))
    }

    /// The kind this handler is dispatched as.
    #[must_use]
    pub const fn kind(&self) -> CallbackKind {
        match self {
            Self::Before(_) => CallbackKind::Before,
            Self::After(_) => CallbackKind::After,
            Self::Around(_) => CallbackKind::Around,
            Self::Error(_) => CallbackKind::Error,
        }
    }
}

impl<O> Clone for CallbackHandler<O>
where
    O: Send + 'static,
{
    fn clone(&self) -> Self {
        match self {
            Self::Before(cb) => Self::Before(Arc::clone(cb)),
            Self::After(cb) => Self::After(Arc::clone(cb)),
            Self::Around(cb) => Self::Around(Arc::clone(cb)),
            Self::Error(cb) => Self::Error(Arc::clone(cb)),
        }
    }
}

impl<O> fmt::Debug for CallbackHandler<O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallbackHandler").field(&self.kind()).finish()
    }
}

/// A callback as stored in the registry.
pub struct RegisteredCallback<O>
where
    O: Send + 'static,
{
    handler: CallbackHandler<O>,
    condition: CallbackCondition,
    priority: Priority,
    sequence: u64,
}

impl<O> RegisteredCallback<O>
where
    O: Send + 'static,
{
    pub(crate) const fn new(
        handler: CallbackHandler<O>,
        condition: CallbackCondition,
        priority: Priority,
        sequence: u64,
    ) -> Self {
        Self {
            handler,
            condition,
            priority,
            sequence,
        }
    }

    /// The wrapped callback.
    #[must_use]
    pub const fn handler(&self) -> &CallbackHandler<O> {
        &self.handler
    }

    /// Kind of the wrapped callback.
    #[must_use]
    pub const fn kind(&self) -> CallbackKind {
        self.handler.kind()
    }

    /// Match condition.
    #[must_use]
    pub const fn condition(&self) -> &CallbackCondition {
        &self.condition
    }

    /// Dispatch priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Registration sequence number, the tie-breaker for equal priorities.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Sort key: priority first, then registration order.
    #[must_use]
    pub const fn dispatch_key(&self) -> (Priority, u64) {
        (self.priority, self.sequence)
    }

    pub(crate) fn as_before(&self) -> Option<&Arc<dyn BeforeCallback>> {
        match &self.handler {
            CallbackHandler::Before(cb) => Some(cb),
            _ => None,
        }
    }

    pub(crate) fn as_after(&self) -> Option<&Arc<dyn AfterCallback<O>>> {
        match &self.handler {
            CallbackHandler::After(cb) => Some(cb),
            _ => None,
        }
    }

    pub(crate) fn as_around(&self) -> Option<&Arc<dyn AroundCallback<O>>> {
        match &self.handler {
            CallbackHandler::Around(cb) => Some(cb),
            _ => None,
        }
    }

    pub(crate) fn as_error(&self) -> Option<&Arc<dyn ErrorCallback>> {
        match &self.handler {
            CallbackHandler::Error(cb) => Some(cb),
            _ => None,
        }
    }
}

impl<O> fmt::Debug for RegisteredCallback<O>
where
    O: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCallback")
            .field("kind", &self.kind())
            .field("condition", &self.condition)
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .finish()
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Before callback backed by a synchronous closure.
pub struct BeforeFn<F>(F);

/// After callback backed by a synchronous closure.
pub struct AfterFn<F>(F);

/// Around callback backed by a closure returning a boxed future.
pub struct AroundFn<F>(F);

/// Error callback backed by a synchronous closure.
pub struct ErrorFn<F>(F);

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl<F> fmt::Debug for $name<F> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($name)).finish_non_exhaustive()
                }
            }
        )*
    };
}

opaque_debug!(BeforeFn, AfterFn, AroundFn, ErrorFn);

/// Build a before callback from a closure.
pub const fn before_fn<F>(f: F) -> BeforeFn<F>
where
    F: Fn(&TransitionContext) -> Result<()> + Send + Sync,
{
    BeforeFn(f)
}

/// Build an after callback from a closure.
pub const fn after_fn<O, F>(f: F) -> AfterFn<F>
where
    O: Send + 'static,
    F: Fn(&TransitionContext, Option<O>) -> Result<Option<O>> + Send + Sync,
{
    AfterFn(f)
}

/// Build an around callback from a closure.
///
/// The closure receives the [`Next`] handle and returns a boxed future,
/// typically `Box::pin(async move { ... })`.
///
/// # Example
///
/// ```rust,ignore
/// let cached = around_fn::<u32, _>(|_next| Box::pin(async move { Ok(Some(7)) }));
/// ```
pub const fn around_fn<O, F>(f: F) -> AroundFn<F>
where
    O: Send + 'static,
    F: for<'a> Fn(Next<'a, O>) -> BoxFuture<'a, Result<Option<O>>> + Send + Sync,
{
    AroundFn(f)
}

/// Build an error callback from a closure.
pub const fn error_fn<F>(f: F) -> ErrorFn<F>
where
    F: Fn(&TransitionContext, &Error) + Send + Sync,
{
    ErrorFn(f)
}

#[async_trait]
impl<F> BeforeCallback for BeforeFn<F>
where
    F: Fn(&TransitionContext) -> Result<()> + Send + Sync,
{
    async fn before(&self, ctx: &TransitionContext) -> Result<()> {
        (self.0)(ctx)
    }
}

#[async_trait]
impl<O, F> AfterCallback<O> for AfterFn<F>
where
    O: Send + 'static,
    F: Fn(&TransitionContext, Option<O>) -> Result<Option<O>> + Send + Sync,
{
    async fn after(&self, ctx: &TransitionContext, result: Option<O>) -> Result<Option<O>> {
        (self.0)(ctx, result)
    }
}

#[async_trait]
impl<O, F> AroundCallback<O> for AroundFn<F>
where
    O: Send + 'static,
    F: for<'a> Fn(Next<'a, O>) -> BoxFuture<'a, Result<Option<O>>> + Send + Sync,
{
    async fn around(&self, next: Next<'_, O>) -> Result<Option<O>> {
        (self.0)(next).await
    }
}

#[async_trait]
impl<F> ErrorCallback for ErrorFn<F>
where
    F: Fn(&TransitionContext, &Error) + Send + Sync,
{
    async fn on_error(&self, ctx: &TransitionContext, error: &Error) {
        (self.0)(ctx, error);
    }
}
