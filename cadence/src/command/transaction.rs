use async_trait::async_trait;

use crate::error::Result;

/// Transaction boundary around one execution.
///
/// `open_transaction` runs as the first phase and `commit_transaction` as the
/// last. When a run fails or errors after opening and before committing,
/// `rollback_transaction` is called (unless disabled in
/// [`ExecutionConfig`](crate::config::ExecutionConfig)).
#[async_trait]
pub trait TransactionManager: Send {
    /// Begin a transaction.
    async fn open_transaction(&mut self) -> Result<()>;

    /// Make the transaction's effects durable.
    async fn commit_transaction(&mut self) -> Result<()>;

    /// Discard the transaction's effects.
    async fn rollback_transaction(&mut self) -> Result<()>;
}

/// Transaction manager that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransaction;

#[async_trait]
impl TransactionManager for NoopTransaction {
    async fn open_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        Ok(())
    }
}
