use async_trait::async_trait;
use fretline_catalog::{CatalogItem, CatalogRepository, PriceRecord, PriceRepository};
use fretline_core::{Account, AccountDirectory, StoreError};
use fretline_order::{Order, OrderRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of the repository traits.
///
/// Orders get the same conditional-write semantics a transactional
/// document store would provide: the write only lands if the stored
/// version matches the expected one.
pub struct MemoryStore {
    items: RwLock<HashMap<Uuid, CatalogItem>>,
    prices: RwLock<HashMap<(Uuid, String), PriceRecord>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            prices: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert_account(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn item(&self, id: Uuid) -> Result<Option<CatalogItem>, StoreError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn insert_item(&self, item: &CatalogItem) -> Result<(), StoreError> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }
}

#[async_trait]
impl PriceRepository for MemoryStore {
    async fn price_record(
        &self,
        item_id: Uuid,
        currency: &str,
    ) -> Result<Option<PriceRecord>, StoreError> {
        Ok(self
            .prices
            .read()
            .await
            .get(&(item_id, currency.to_string()))
            .cloned())
    }

    async fn upsert_price_record(&self, record: &PriceRecord) -> Result<(), StoreError> {
        self.prices
            .write()
            .await
            .insert((record.item_id, record.currency.clone()), record.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update(&self, order: &Order, expected_version: u64) -> Result<u64, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::Backend(format!("order {} not stored", order.id)))?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: stored.version,
            });
        }
        *stored = order.clone();
        stored.version = expected_version + 1;
        Ok(stored.version)
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.account_id == account_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretline_order::OrderStatus;

    #[tokio::test]
    async fn test_conditional_write_rejects_stale_version() {
        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();
        let order = Order::new_draft(account_id, account_id, vec![]);
        store.insert(&order).await.unwrap();

        let mut fresh = order.clone();
        fresh.record_transition(OrderStatus::Cancelled, account_id);
        let new_version = store.update(&fresh, 1).await.unwrap();
        assert_eq!(new_version, 2);

        // A writer still holding version 1 must lose.
        let err = store.update(&order, 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_account_directory_roundtrip() {
        let store = MemoryStore::new();
        let account = Account {
            id: Uuid::new_v4(),
            tier_id: Some("TIER_A".to_string()),
            currency: "USD".to_string(),
            territory: "EMEA".to_string(),
            payment_terms: "NET30".to_string(),
        };
        store.insert_account(account.clone()).await;
        let loaded = store.account(account.id).await.unwrap().unwrap();
        assert_eq!(loaded.territory, "EMEA");
    }
}
