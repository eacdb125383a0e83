use serde::Serialize;

use crate::command::ErrorCollection;

/// Externally visible result of a run that did not raise.
///
/// Raised faults are not outcomes: they are returned as
/// [`Err`](crate::Error) from [`run`](super::CommandExecution::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<O> {
    /// All seven phases completed; carries the execute phase's value.
    Success(O),
    /// A phase recorded errors; carries them.
    Failure(ErrorCollection),
}

impl<O> Outcome<O> {
    /// True for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// True for [`Outcome::Failure`].
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow the success value.
    #[must_use]
    pub const fn value(&self) -> Option<&O> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrow the recorded errors.
    #[must_use]
    pub const fn errors(&self) -> Option<&ErrorCollection> {
        match self {
            Self::Success(_) => None,
            Self::Failure(errors) => Some(errors),
        }
    }

    /// Take the success value.
    #[must_use]
    pub fn into_value(self) -> Option<O> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the recorded errors for [`Outcome::Failure`].
    pub fn into_result(self) -> Result<O, ErrorCollection> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(errors) => Err(errors),
        }
    }

    /// Map the success value.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(O) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(errors) => Outcome::Failure(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_accessors() {
        let outcome = Outcome::Success(3);
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), Some(&3));
        assert!(outcome.errors().is_none());
        assert_eq!(outcome.map(|v| v * 2).into_result(), Ok(6));
    }

    #[test]
    fn failure_accessors() {
        let mut errors = ErrorCollection::new();
        errors.add("blank", "must not be blank");
        let outcome: Outcome<u32> = Outcome::Failure(errors.clone());

        assert!(outcome.is_failure());
        assert_eq!(outcome.errors(), Some(&errors));
        assert_eq!(outcome.clone().into_value(), None);
        assert_eq!(outcome.into_result(), Err(errors));
    }

    #[test]
    fn serializes_with_status_tag() {
        let value = serde_json::to_value(Outcome::Success("ok")).unwrap();
        assert_eq!(value, json!({ "status": "success", "value": "ok" }));

        let mut errors = ErrorCollection::new();
        errors.add("x", "y");
        let value = serde_json::to_value(Outcome::<()>::Failure(errors)).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["value"][0]["symbol"], "x");
    }
}
