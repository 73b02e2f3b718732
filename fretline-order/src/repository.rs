use crate::models::Order;
use async_trait::async_trait;
use fretline_core::StoreError;
use uuid::Uuid;

/// Persistence for orders.
///
/// `update` is a conditional write: it must fail with
/// `StoreError::Conflict` when the stored version differs from
/// `expected_version`, and returns the new version on success. Backed by
/// any store offering read-by-key plus a predicate/version-checked write.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn update(&self, order: &Order, expected_version: u64) -> Result<u64, StoreError>;

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Order>, StoreError>;
}
