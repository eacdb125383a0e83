//! The business side of an execution.
//!
//! A [`Command`] supplies one method per lifecycle phase. Every method but
//! [`execute`](Command::execute) defaults to doing nothing. Phases report
//! business problems by recording them in the shared [`ErrorCollection`];
//! returning `Err` is reserved for unexpected faults.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use cadence::command::{Command, ErrorCollection};
//!
//! struct CreateUser {
//!     email: String,
//! }
//!
//! #[async_trait]
//! impl Command for CreateUser {
//!     const NAME: &'static str = "CreateUser";
//!     type Output = u64;
//!
//!     async fn cast_and_validate_inputs(
//!         &mut self,
//!         errors: &mut ErrorCollection,
//!     ) -> cadence::Result<()> {
//!         if !self.email.contains('@') {
//!             errors.add_at(["email"], "invalid_email", "is not an email address");
//!         }
//!         Ok(())
//!     }
//!
//!     async fn execute(&mut self, _errors: &mut ErrorCollection) -> cadence::Result<Option<u64>> {
//!         Ok(Some(42))
//!     }
//! }
//! ```

mod errors;
mod transaction;

pub use errors::{CommandError, ErrorCollection};
pub use transaction::{NoopTransaction, TransactionManager};

use async_trait::async_trait;

use crate::error::Result;

/// A unit of business work executed through the fixed phase sequence.
#[async_trait]
pub trait Command: Send {
    /// Stable name used in logs and callback contexts.
    const NAME: &'static str;

    /// Value produced by a successful run.
    type Output: Send + 'static;

    /// Coerce and check raw inputs.
    async fn cast_and_validate_inputs(&mut self, _errors: &mut ErrorCollection) -> Result<()> {
        Ok(())
    }

    /// Load the records the command operates on.
    async fn load_records(&mut self, _errors: &mut ErrorCollection) -> Result<()> {
        Ok(())
    }

    /// Check the loaded records.
    async fn validate_records(&mut self, _errors: &mut ErrorCollection) -> Result<()> {
        Ok(())
    }

    /// Business-rule validation across inputs and records.
    async fn validate(&mut self, _errors: &mut ErrorCollection) -> Result<()> {
        Ok(())
    }

    /// Perform the work.
    ///
    /// Returning `None` is only meaningful together with recorded errors; a
    /// `None` with an empty collection ends the run with
    /// [`Error::MissingOutput`](crate::Error::MissingOutput).
    async fn execute(&mut self, errors: &mut ErrorCollection) -> Result<Option<Self::Output>>;
}
