//! Conditional, priority-ordered callback dispatch.
//!
//! Callbacks hook cross-cutting behavior onto individual lifecycle
//! transitions without touching the command body:
//!
//! - **Four kinds**: before, after, around (nested middleware) and error
//!   (observer only; it cannot suppress the error)
//! - **Conditions**: filter on source state, target state and phase
//! - **Priority ordering**: lower runs first, ties by registration order
//! - **Compiled chains**: matching callbacks are sorted once per transition
//!   and cached; the registry is sealed before executions share it
//!
//! # Example
//!
//! ```rust,ignore
//! use cadence::callback::{
//!     CallbackCondition, CallbackPhase, CallbackRegistry, LogLevel, Priority, Retry, before_fn,
//! };
//!
//! let registry = CallbackRegistry::<Receipt>::builder()
//!     .before_with(
//!         before_fn(|ctx| {
//!             tracing::info!(%ctx, "authorising");
//!             Ok(())
//!         }),
//!         Priority::HIGH,
//!         CallbackCondition::on(CallbackPhase::Execute),
//!     )
//!     .around_with(Retry::new(3), Priority::NORMAL, CallbackCondition::on(CallbackPhase::Execute))
//!     .with_logging(LogLevel::Debug)
//!     .build_sealed();
//! ```

mod builtins;
mod condition;
mod context;
mod executor;
mod handlers;
mod logging;
mod next;
mod phase;
mod registry;

pub use builtins::{PhaseMetrics, PhaseMetricsSnapshot, PhaseStats, PhaseTimer, Retry, Timeout};
pub use condition::CallbackCondition;
pub use context::TransitionContext;
pub use executor::CallbackExecutor;
pub use handlers::{
    AfterCallback, AfterFn, AroundCallback, AroundFn, BeforeCallback, BeforeFn, CallbackHandler,
    CallbackKind, ErrorCallback, ErrorFn, Priority, RegisteredCallback, after_fn, around_fn,
    before_fn, error_fn,
};
pub use logging::{LogLevel, LoggingCallbacks};
pub use next::{FnAction, Next, PhaseAction, action_fn};
pub use phase::CallbackPhase;
pub use registry::{CacheStats, CallbackRegistry, CallbackRegistryBuilder, ChainKey, CompiledChain};

pub(crate) use logging::log_at_level;
