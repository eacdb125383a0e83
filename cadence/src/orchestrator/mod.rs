//! Sequencing of the seven lifecycle phases.
//!
//! An [`ExecutionOrchestrator`] is created once per command type around a
//! sealed [`CallbackRegistry`]. Each command instance gets its own
//! [`CommandExecution`], which walks the phases in order:
//!
//! | Phase                      | State entered                |
//! |----------------------------|------------------------------|
//! | `open_transaction`         | `opening_transaction`        |
//! | `cast_and_validate_inputs` | `casting_and_validating_inputs` |
//! | `load_records`             | `loading_records`            |
//! | `validate_records`         | `validating_records`         |
//! | `validate`                 | `validating`                 |
//! | `execute`                  | `executing`                  |
//! | `commit_transaction`       | `committing_transaction`     |
//!
//! After every phase the error collection is checked; recorded errors end
//! the run in `failed` with [`Outcome::Failure`]. A raised fault ends it in
//! `errored` and is returned as `Err`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cadence::prelude::*;
//!
//! let registry = CallbackRegistry::builder()
//!     .with_logging(LogLevel::Debug)
//!     .build_sealed();
//! let registry = Arc::new(registry);
//! let orchestrator = ExecutionOrchestrator::<CreateUser>::new(registry);
//!
//! let mut execution = orchestrator.prepare(CreateUser { email: "a@b.c".into() });
//! match execution.run().await? {
//!     Outcome::Success(id) => println!("created {id}"),
//!     Outcome::Failure(errors) => println!("rejected: {errors}"),
//! }
//! assert!(execution.is_terminal());
//! ```

mod execution;
mod outcome;
mod step;

pub use execution::CommandExecution;
pub use outcome::Outcome;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use crate::callback::{CallbackExecutor, CallbackRegistry};
use crate::command::{Command, NoopTransaction, TransactionManager};
use crate::config::ExecutionConfig;
use crate::error::Result;

/// Per-command-type factory for executions.
///
/// Cheap to clone; clones share the registry.
pub struct ExecutionOrchestrator<C>
where
    C: Command,
{
    executor: CallbackExecutor<C::Output>,
    config: ExecutionConfig,
    _command: PhantomData<fn() -> C>,
}

impl<C> ExecutionOrchestrator<C>
where
    C: Command,
{
    /// Create an orchestrator dispatching through `registry`.
    ///
    /// The registry should be sealed; an unsealed one is accepted but logged.
    #[must_use]
    pub fn new(registry: Arc<CallbackRegistry<C::Output>>) -> Self {
        if !registry.is_sealed() {
            warn!(
                command = C::NAME,
                "callback registry is not sealed; chains are compiled lazily"
            );
        }
        Self {
            executor: CallbackExecutor::new(registry),
            config: ExecutionConfig::default(),
            _command: PhantomData,
        }
    }

    /// Create an orchestrator with no callbacks at all.
    #[must_use]
    pub fn without_callbacks() -> Self {
        let mut registry = CallbackRegistry::new();
        registry.seal();
        Self::new(Arc::new(registry))
    }

    /// Replace the execution settings.
    #[must_use]
    pub const fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Execution settings.
    #[must_use]
    pub const fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// The shared registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<CallbackRegistry<C::Output>> {
        self.executor.registry()
    }

    /// Prepare an execution with no transaction manager.
    #[must_use]
    pub fn prepare(&self, command: C) -> CommandExecution<C> {
        self.prepare_with_transaction(command, NoopTransaction)
    }

    /// Prepare an execution using `transaction` for the transaction phases.
    #[must_use]
    pub fn prepare_with_transaction(
        &self,
        command: C,
        transaction: impl TransactionManager + 'static,
    ) -> CommandExecution<C> {
        CommandExecution::new(
            command,
            Box::new(transaction),
            self.executor.clone(),
            self.config,
        )
    }

    /// Prepare and run `command` in one step.
    ///
    /// # Errors
    ///
    /// See [`CommandExecution::run`].
    pub async fn execute(&self, command: C) -> Result<Outcome<C::Output>> {
        self.prepare(command).run().await
    }
}

impl<C> Clone for ExecutionOrchestrator<C>
where
    C: Command,
{
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            config: self.config,
            _command: PhantomData,
        }
    }
}

impl<C> fmt::Debug for ExecutionOrchestrator<C>
where
    C: Command,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOrchestrator")
            .field("command", &C::NAME)
            .field("executor", &self.executor)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::callback::{CallbackCondition, CallbackPhase, Priority, before_fn, error_fn};
    use crate::command::ErrorCollection;
    use crate::error::Error;
    use crate::state::CommandState;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records which phases ran; optionally records an error or raises in one.
    #[derive(Default)]
    struct Probe {
        ran: Vec<&'static str>,
        reject_in: Option<CallbackPhase>,
        raise_in: Option<CallbackPhase>,
    }

    impl Probe {
        fn step(&mut self, phase: CallbackPhase, errors: &mut ErrorCollection) -> Result<()> {
            self.ran.push(phase.as_str());
            if self.raise_in == Some(phase) {
                return Err(Error::action(format!("{phase} exploded")));
            }
            if self.reject_in == Some(phase) {
                errors.add("rejected", format!("rejected in {phase}"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Command for Probe {
        const NAME: &'static str = "Probe";
        type Output = usize;

        async fn cast_and_validate_inputs(&mut self, errors: &mut ErrorCollection) -> Result<()> {
            self.step(CallbackPhase::CastAndValidateInputs, errors)
        }

        async fn load_records(&mut self, errors: &mut ErrorCollection) -> Result<()> {
            self.step(CallbackPhase::LoadRecords, errors)
        }

        async fn validate_records(&mut self, errors: &mut ErrorCollection) -> Result<()> {
            self.step(CallbackPhase::ValidateRecords, errors)
        }

        async fn validate(&mut self, errors: &mut ErrorCollection) -> Result<()> {
            self.step(CallbackPhase::Validate, errors)
        }

        async fn execute(&mut self, errors: &mut ErrorCollection) -> Result<Option<usize>> {
            self.step(CallbackPhase::Execute, errors)?;
            Ok(Some(self.ran.len()))
        }
    }

    /// Transaction manager logging every call into a shared log.
    #[derive(Clone, Default)]
    struct Ledger {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl Ledger {
        fn calls(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionManager for Ledger {
        async fn open_transaction(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("open");
            Ok(())
        }

        async fn commit_transaction(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("commit");
            if self.fail_commit {
                return Err(Error::transaction("commit refused"));
            }
            Ok(())
        }

        async fn rollback_transaction(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("rollback");
            if self.fail_rollback {
                return Err(Error::transaction("rollback refused"));
            }
            Ok(())
        }
    }

    mod success {
        use super::*;

        #[tokio::test]
        async fn runs_every_phase_in_order() {
            let orchestrator = ExecutionOrchestrator::<Probe>::without_callbacks();
            let ledger = Ledger::default();
            let mut execution =
                orchestrator.prepare_with_transaction(Probe::default(), ledger.clone());

            let outcome = execution.run().await.unwrap();

            assert_eq!(outcome, Outcome::Success(5));
            assert_eq!(execution.state(), CommandState::Succeeded);
            assert_eq!(execution.state_name(), "succeeded");
            assert_eq!(
                execution.command().ran,
                vec![
                    "cast_and_validate_inputs",
                    "load_records",
                    "validate_records",
                    "validate",
                    "execute"
                ]
            );
            assert_eq!(ledger.calls(), vec!["open", "commit"]);
            assert_eq!(execution.transition_history().len(), 8);
            assert!(execution.errors().is_empty());
        }

        #[tokio::test]
        async fn contexts_carry_execution_id() {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let registry = CallbackRegistry::builder()
                .before(before_fn(move |ctx| {
                    sink.lock().unwrap().push((ctx.execution_id(), ctx.transition()));
                    Ok(())
                }))
                .build_sealed();
            let orchestrator = ExecutionOrchestrator::<Probe>::new(Arc::new(registry));

            let mut execution = orchestrator.prepare(Probe::default());
            execution.run().await.unwrap();

            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 7);
            assert!(seen.iter().all(|(id, _)| *id == execution.id()));
            let phases: Vec<_> = seen.iter().map(|(_, phase)| *phase).collect();
            assert_eq!(phases, CallbackPhase::ALL.to_vec());
        }

        #[test]
        fn blocking_run_matches_async() {
            let orchestrator = ExecutionOrchestrator::<Probe>::without_callbacks();
            let mut execution = orchestrator.prepare(Probe::default());

            let outcome = execution.run_blocking().unwrap();
            assert_eq!(outcome.into_value(), Some(5));
            assert!(execution.is_terminal());
        }
    }

    mod failure {
        use super::*;

        #[tokio::test]
        async fn recorded_errors_stop_the_run() {
            let orchestrator = ExecutionOrchestrator::<Probe>::without_callbacks();
            let ledger = Ledger::default();
            let probe = Probe {
                reject_in: Some(CallbackPhase::LoadRecords),
                ..Probe::default()
            };
            let mut execution = orchestrator.prepare_with_transaction(probe, ledger.clone());

            let outcome = execution.run().await.unwrap();

            let errors = outcome.errors().unwrap();
            assert_eq!(errors.symbols(), vec!["rejected"]);
            assert_eq!(execution.state(), CommandState::Failed);
            assert_eq!(
                execution.command().ran,
                vec!["cast_and_validate_inputs", "load_records"]
            );
            assert_eq!(ledger.calls(), vec!["open", "rollback"]);
            let last = execution.transition_history().last().unwrap();
            assert_eq!(last.from, CommandState::LoadingRecords);
            assert_eq!(last.to, CommandState::Failed);
        }

        #[tokio::test]
        async fn rollback_can_be_disabled() {
            let config = ExecutionConfig {
                rollback_on_failure: false,
                ..ExecutionConfig::default()
            };
            let orchestrator =
                ExecutionOrchestrator::<Probe>::without_callbacks().with_config(config);
            let ledger = Ledger::default();
            let probe = Probe {
                reject_in: Some(CallbackPhase::Validate),
                ..Probe::default()
            };

            let mut execution = orchestrator.prepare_with_transaction(probe, ledger.clone());
            let outcome = execution.run().await.unwrap();

            assert!(outcome.is_failure());
            assert_eq!(ledger.calls(), vec!["open"]);
        }
    }

    mod errors {
        use super::*;

        #[tokio::test]
        async fn raised_fault_is_returned_after_error_callbacks() {
            let observed = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&observed);
            let registry = CallbackRegistry::builder()
                .on_error_with(
                    error_fn(move |ctx, _| {
                        assert_eq!(ctx.transition(), CallbackPhase::Validate);
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                    Priority::NORMAL,
                    CallbackCondition::any(),
                )
                .build_sealed();
            let orchestrator = ExecutionOrchestrator::<Probe>::new(Arc::new(registry));
            let ledger = Ledger::default();
            let probe = Probe {
                raise_in: Some(CallbackPhase::Validate),
                ..Probe::default()
            };

            let mut execution = orchestrator.prepare_with_transaction(probe, ledger.clone());
            let err = execution.run().await.unwrap_err();

            assert_eq!(err.to_string(), "action error: validate exploded");
            assert_eq!(execution.state(), CommandState::Errored);
            assert_eq!(observed.load(Ordering::SeqCst), 1);
            assert_eq!(ledger.calls(), vec!["open", "rollback"]);
        }

        #[tokio::test]
        async fn failed_commit_is_rolled_back() {
            let orchestrator = ExecutionOrchestrator::<Probe>::without_callbacks();
            let ledger = Ledger {
                fail_commit: true,
                fail_rollback: true,
                ..Ledger::default()
            };

            let mut execution =
                orchestrator.prepare_with_transaction(Probe::default(), ledger.clone());
            let err = execution.run().await.unwrap_err();

            assert!(matches!(err, Error::Transaction(ref msg) if msg == "commit refused"));
            assert_eq!(execution.state(), CommandState::Errored);
            assert_eq!(ledger.calls(), vec!["open", "commit", "rollback"]);
        }

        #[tokio::test]
        async fn missing_output_is_a_fault() {
            struct Silent;

            #[async_trait]
            impl Command for Silent {
                const NAME: &'static str = "Silent";
                type Output = ();

                async fn execute(&mut self, _errors: &mut ErrorCollection) -> Result<Option<()>> {
                    Ok(None)
                }
            }

            let orchestrator = ExecutionOrchestrator::<Silent>::without_callbacks();
            let ledger = Ledger::default();
            let mut execution = orchestrator.prepare_with_transaction(Silent, ledger.clone());

            let err = execution.run().await.unwrap_err();
            assert!(matches!(err, Error::MissingOutput));
            assert_eq!(execution.state(), CommandState::Errored);
            assert_eq!(ledger.calls(), vec!["open", "rollback"]);
        }

        #[tokio::test]
        async fn second_run_is_rejected() {
            let orchestrator = ExecutionOrchestrator::<Probe>::without_callbacks();
            let mut execution = orchestrator.prepare(Probe::default());
            execution.run().await.unwrap();

            let err = execution.run().await.unwrap_err();
            assert!(matches!(
                err,
                Error::AlreadyStarted {
                    state: CommandState::Succeeded
                }
            ));
            assert!(err.is_internal());
            assert_eq!(execution.transition_history().len(), 8);
        }
    }
}
