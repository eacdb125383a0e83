//! Tracing-based logging callbacks.
//!
//! [`LoggingCallbacks`] implements the before, after and error callback traits
//! and emits one structured event per dispatch at a configurable level.
//!
//! # Example
//!
//! ```rust,ignore
//! use cadence::callback::{CallbackRegistry, LogLevel};
//!
//! let registry = CallbackRegistry::<u64>::builder()
//!     .with_logging(LogLevel::Debug)
//!     .build_sealed();
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::TransitionContext;
use super::handlers::{AfterCallback, BeforeCallback, ErrorCallback};
use crate::error::{Error, Result};

/// Log verbosity level for callback events.
///
/// Maps directly to `tracing` levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level logging (most verbose).
    Trace,
    /// Debug-level logging.
    Debug,
    /// Info-level logging (default).
    #[default]
    Info,
    /// Warn-level logging.
    Warn,
}

/// Emit a log event at the specified level using `tracing` macros.
macro_rules! log_at_level {
    ($level:expr, $($arg:tt)*) => {
        match $level {
            $crate::callback::LogLevel::Trace => tracing::trace!($($arg)*),
            $crate::callback::LogLevel::Debug => tracing::debug!($($arg)*),
            $crate::callback::LogLevel::Info => tracing::info!($($arg)*),
            $crate::callback::LogLevel::Warn => tracing::warn!($($arg)*),
        }
    };
}

pub(crate) use log_at_level;

/// Callbacks that log every transition via `tracing`.
///
/// Errors are always logged at `warn`, whatever the configured level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCallbacks {
    level: LogLevel,
}

impl LoggingCallbacks {
    /// Create logging callbacks at the default level (INFO).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create logging callbacks at a custom level.
    #[must_use]
    pub const fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

#[async_trait]
impl BeforeCallback for LoggingCallbacks {
    async fn before(&self, ctx: &TransitionContext) -> Result<()> {
        log_at_level!(
            self.level,
            execution_id = %ctx.execution_id(),
            command = ctx.command(),
            transition = %ctx.transition(),
            from = %ctx.from(),
            to = %ctx.to(),
            "Phase started"
        );
        Ok(())
    }
}

#[async_trait]
impl<O> AfterCallback<O> for LoggingCallbacks
where
    O: Send + 'static,
{
    async fn after(&self, ctx: &TransitionContext, result: Option<O>) -> Result<Option<O>> {
        log_at_level!(
            self.level,
            execution_id = %ctx.execution_id(),
            command = ctx.command(),
            transition = %ctx.transition(),
            has_output = result.is_some(),
            "Phase completed"
        );
        Ok(result)
    }
}

#[async_trait]
impl ErrorCallback for LoggingCallbacks {
    async fn on_error(&self, ctx: &TransitionContext, error: &Error) {
        tracing::warn!(
            execution_id = %ctx.execution_id(),
            command = ctx.command(),
            transition = %ctx.transition(),
            error = %error,
            "Phase raised"
        );
    }
}
