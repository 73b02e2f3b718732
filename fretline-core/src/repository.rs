use crate::account::Account;
use async_trait::async_trait;
use uuid::Uuid;

/// Failure surfaced by a persistence backend.
///
/// The engine talks to storage through narrow repository traits (read by
/// key, conditional write with an expected version, append-only history)
/// so any transactional document store can sit behind them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },
}

/// Read-only access to dealer accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
}
