use async_trait::async_trait;

use crate::callback::{CallbackPhase, PhaseAction};
use crate::command::{Command, ErrorCollection, TransactionManager};
use crate::error::Result;

/// Phase action dispatching one phase to the command or transaction manager.
///
/// Only the execute phase yields a value.
pub(super) struct PhaseStep<'a, C>
where
    C: Command,
{
    pub(super) phase: CallbackPhase,
    pub(super) command: &'a mut C,
    pub(super) errors: &'a mut ErrorCollection,
    pub(super) transaction: &'a mut dyn TransactionManager,
    pub(super) transaction_open: &'a mut bool,
}

#[async_trait]
impl<C> PhaseAction<C::Output> for PhaseStep<'_, C>
where
    C: Command,
{
    async fn call(&mut self) -> Result<Option<C::Output>> {
        match self.phase {
            CallbackPhase::OpenTransaction => {
                self.transaction.open_transaction().await?;
                *self.transaction_open = true;
                Ok(None)
            }
            CallbackPhase::CastAndValidateInputs => {
                self.command.cast_and_validate_inputs(self.errors).await?;
                Ok(None)
            }
            CallbackPhase::LoadRecords => {
                self.command.load_records(self.errors).await?;
                Ok(None)
            }
            CallbackPhase::ValidateRecords => {
                self.command.validate_records(self.errors).await?;
                Ok(None)
            }
            CallbackPhase::Validate => {
                self.command.validate(self.errors).await?;
                Ok(None)
            }
            CallbackPhase::Execute => self.command.execute(self.errors).await,
            CallbackPhase::CommitTransaction => {
                self.transaction.commit_transaction().await?;
                *self.transaction_open = false;
                Ok(None)
            }
        }
    }
}
