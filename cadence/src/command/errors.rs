use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One accumulated business or validation error.
///
/// # Example
///
/// ```rust,ignore
/// use cadence::command::CommandError;
///
/// let err = CommandError::new("invalid_email", "is not an email address")
///     .at(["user", "email"])
///     .with_context(serde_json::json!({ "value": "bob@" }));
/// assert_eq!(err.to_string(), "user.email: is not an email address (invalid_email)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    /// Stable machine-readable error code.
    pub symbol: String,
    /// Location of the offending value, outermost segment first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// Free-form details.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl CommandError {
    /// Create an error with no path and no context.
    #[must_use]
    pub fn new(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            path: Vec::new(),
            message: message.into(),
            context: Value::Null,
        }
    }

    /// Set the path.
    #[must_use]
    pub fn at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Attach free-form details.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "{}: ", self.path.join("."))?;
        }
        write!(f, "{} ({})", self.message, self.symbol)
    }
}

/// Errors accumulated over one execution.
///
/// Phases record problems here instead of raising. The orchestrator checks
/// [`has_errors`](Self::has_errors) after every phase and stops with a
/// failure outcome once it is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCollection {
    errors: Vec<CommandError>,
}

impl ErrorCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Record an error.
    pub fn push(&mut self, error: CommandError) {
        self.errors.push(error);
    }

    /// Record an error built from its parts.
    pub fn add(&mut self, symbol: impl Into<String>, message: impl Into<String>) {
        self.push(CommandError::new(symbol, message));
    }

    /// Record an error at `path`.
    pub fn add_at<I, S>(&mut self, path: I, symbol: impl Into<String>, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(CommandError::new(symbol, message).at(path));
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandError> + '_ {
        self.errors.iter()
    }

    /// Symbols of all recorded errors, in recording order.
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.symbol.as_str()).collect()
    }

    /// Whether an error with `symbol` was recorded.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.errors.iter().any(|e| e.symbol == symbol)
    }

    /// Consume into the recorded errors.
    #[must_use]
    pub fn into_vec(self) -> Vec<CommandError> {
        self.errors
    }
}

impl Extend<CommandError> for ErrorCollection {
    fn extend<T: IntoIterator<Item = CommandError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<CommandError> for ErrorCollection {
    fn from_iter<T: IntoIterator<Item = CommandError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorCollection {
    type Item = CommandError;
    type IntoIter = std::vec::IntoIter<CommandError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a CommandError;
    type IntoIter = std::slice::Iter<'a, CommandError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
