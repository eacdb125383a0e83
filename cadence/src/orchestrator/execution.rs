use std::fmt;

use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use super::outcome::Outcome;
use super::step::PhaseStep;
use crate::callback::{CallbackExecutor, CallbackPhase, TransitionContext, log_at_level};
use crate::command::{Command, ErrorCollection, TransactionManager};
use crate::config::ExecutionConfig;
use crate::error::{Error, Result};
use crate::state::{CommandState, StateMachine, TransitionHistory};

/// One run of one command instance.
///
/// Owns everything mutable about the run: the command, its state machine,
/// its error collection and its transaction manager. Nothing here is shared
/// with other executions.
pub struct CommandExecution<C>
where
    C: Command,
{
    id: Uuid,
    command: C,
    machine: StateMachine,
    errors: ErrorCollection,
    transaction: Box<dyn TransactionManager>,
    transaction_open: bool,
    executor: CallbackExecutor<C::Output>,
    config: ExecutionConfig,
}

impl<C> CommandExecution<C>
where
    C: Command,
{
    pub(super) fn new(
        command: C,
        transaction: Box<dyn TransactionManager>,
        executor: CallbackExecutor<C::Output>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            command,
            machine: StateMachine::new(),
            errors: ErrorCollection::new(),
            transaction,
            transaction_open: false,
            executor,
            config,
        }
    }

    /// Unique id of this execution, also carried by every callback context.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The command being executed.
    #[must_use]
    pub const fn command(&self) -> &C {
        &self.command
    }

    /// Consume the execution, returning the command.
    #[must_use]
    pub fn into_command(self) -> C {
        self.command
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CommandState {
        self.machine.state()
    }

    /// Current lifecycle state name.
    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        self.machine.state_name()
    }

    /// Every transition taken so far.
    #[must_use]
    pub const fn transition_history(&self) -> &TransitionHistory {
        self.machine.history()
    }

    /// Errors recorded so far.
    #[must_use]
    pub const fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    /// True once the run has finished, however it ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.machine.is_terminal()
    }

    /// Drive the command through all seven phases.
    ///
    /// Returns `Ok(Outcome::Success)` when every phase completes without
    /// recording errors, and `Ok(Outcome::Failure)` as soon as a phase records
    /// any. A fault raised by a phase or a callback moves the machine to
    /// `Errored` and is returned as `Err`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if this execution was run before.
    /// - [`Error::MissingOutput`] if the execute phase yields no value and
    ///   records no errors.
    /// - [`Error::IllegalTransition`] if the phase sequence is violated.
    /// - Any error raised by the command, the transaction manager or a
    ///   callback.
    pub async fn run(&mut self) -> Result<Outcome<C::Output>> {
        let span = info_span!("command", command = C::NAME, execution_id = %self.id);
        self.run_phases().instrument(span).await
    }

    /// Run on the current thread, blocking until the run completes.
    ///
    /// Phase ordering is identical to [`run`](Self::run). Callbacks that need
    /// a Tokio timer, such as [`Timeout`](crate::callback::Timeout), are not
    /// usable here.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_blocking(&mut self) -> Result<Outcome<C::Output>> {
        futures::executor::block_on(self.run())
    }

    async fn run_phases(&mut self) -> Result<Outcome<C::Output>> {
        if self.machine.state() != CommandState::Initialized {
            return Err(Error::AlreadyStarted {
                state: self.machine.state(),
            });
        }
        log_at_level!(self.config.log_level, "Command started");

        let mut output = None;
        for phase in CallbackPhase::ALL {
            let from = self.machine.state();
            let to = phase.target_state();
            if !self.machine.transition_to(to) {
                return Err(self.invariant_violation(from, to).await);
            }

            let ctx = TransitionContext::for_transition(self.id, C::NAME, from, to, phase);
            let mut step = PhaseStep {
                phase,
                command: &mut self.command,
                errors: &mut self.errors,
                transaction: &mut *self.transaction,
                transaction_open: &mut self.transaction_open,
            };
            let dispatched = self.executor.execute(&ctx, &mut step).await;
            let result = match dispatched {
                Ok(result) => result,
                Err(err) => return Err(self.abort(err).await),
            };

            if self.errors.has_errors() {
                return Ok(self.fail().await);
            }
            if phase == CallbackPhase::Execute {
                output = result;
                if output.is_none() {
                    return Err(self.abort(Error::MissingOutput).await);
                }
            }
        }

        let Some(output) = output else {
            return Err(self.abort(Error::MissingOutput).await);
        };
        let from = self.machine.state();
        if !self.machine.succeed() {
            return Err(self
                .invariant_violation(from, CommandState::Succeeded)
                .await);
        }
        log_at_level!(self.config.log_level, "Command succeeded");
        Ok(Outcome::Success(output))
    }

    /// Soft failure: recorded errors end the run.
    async fn fail(&mut self) -> Outcome<C::Output> {
        self.rollback().await;
        self.machine.fail();
        log_at_level!(
            self.config.log_level,
            errors = self.errors.len(),
            symbols = ?self.errors.symbols(),
            "Command failed"
        );
        Outcome::Failure(self.errors.clone())
    }

    /// Raised fault: the error is returned after the machine enters `Errored`.
    async fn abort(&mut self, err: Error) -> Error {
        self.rollback().await;
        self.machine.error();
        warn!(state = %self.machine.state(), error = %err, "Command errored");
        err
    }

    async fn invariant_violation(&mut self, from: CommandState, to: CommandState) -> Error {
        error!(%from, %to, "illegal transition requested by orchestrator");
        self.rollback().await;
        self.machine.error();
        Error::IllegalTransition { from, to }
    }

    async fn rollback(&mut self) {
        if !self.transaction_open || !self.config.rollback_on_failure {
            return;
        }
        self.transaction_open = false;
        match self.transaction.rollback_transaction().await {
            Ok(()) => debug!("transaction rolled back"),
            Err(err) => warn!(error = %err, "transaction rollback failed"),
        }
    }
}

impl<C> fmt::Debug for CommandExecution<C>
where
    C: Command,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecution")
            .field("id", &self.id)
            .field("command", &C::NAME)
            .field("state", &self.machine.state())
            .field("errors", &self.errors.len())
            .field("transaction_open", &self.transaction_open)
            .finish_non_exhaustive()
    }
}
