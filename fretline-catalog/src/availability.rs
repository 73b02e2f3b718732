use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Stock position for one item.
///
/// `qty_available + qty_allocated` is conserved across reserve/release
/// pairs; only an external stock adjustment (`set_stock`) changes the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub item_id: Uuid,
    pub qty_available: u32,
    pub qty_allocated: u32,
}

/// Opaque receipt for one successful allocation; releasing it returns
/// exactly the reserved quantity to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    pub token_id: Uuid,
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Conservation has been broken by the caller: more stock was released
    /// than is allocated. Fatal, never retried or absorbed.
    #[error("ledger invariant violation on item {item_id}: released {released} with {allocated} allocated")]
    InvariantViolation {
        item_id: Uuid,
        released: u32,
        allocated: u32,
    },
}

/// Tracks available/allocated stock per item with atomic reserve/release.
///
/// Each record sits behind its own mutex, so check-and-decrement is one
/// indivisible step per item: two concurrent reserves can never both
/// observe the same free units. Reserves on different items proceed in
/// parallel.
pub struct AvailabilityLedger {
    records: RwLock<HashMap<Uuid, Arc<Mutex<AvailabilityRecord>>>>,
}

impl AvailabilityLedger {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// External stock adjustment: sets the free quantity, leaving current
    /// allocations untouched. The only entrypoint that changes the
    /// available+allocated sum.
    pub async fn set_stock(&self, item_id: Uuid, qty_available: u32) {
        let record = self.record_handle(item_id).await;
        let mut record = record.lock().await;
        record.qty_available = qty_available;
    }

    /// Current stock position, if the item is tracked.
    pub async fn snapshot(&self, item_id: Uuid) -> Option<AvailabilityRecord> {
        let records = self.records.read().await;
        match records.get(&item_id) {
            Some(record) => Some(record.lock().await.clone()),
            None => None,
        }
    }

    /// Atomically reserve `quantity` units of `item_id`.
    ///
    /// On failure nothing is mutated and the current availability is
    /// reported so the caller can surface a precise shortfall. An item the
    /// ledger has never seen has nothing to allocate.
    pub async fn reserve(
        &self,
        item_id: Uuid,
        quantity: u32,
    ) -> Result<ReservationToken, LedgerError> {
        let record = {
            let records = self.records.read().await;
            match records.get(&item_id) {
                Some(record) => Arc::clone(record),
                None => {
                    return Err(LedgerError::InsufficientStock {
                        requested: quantity,
                        available: 0,
                    });
                }
            }
        };

        let mut record = record.lock().await;
        if record.qty_available < quantity {
            return Err(LedgerError::InsufficientStock {
                requested: quantity,
                available: record.qty_available,
            });
        }
        record.qty_available -= quantity;
        record.qty_allocated += quantity;

        Ok(ReservationToken {
            token_id: Uuid::new_v4(),
            item_id,
            quantity,
        })
    }

    /// Return a previously reserved quantity to the pool.
    pub async fn release(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        let record = {
            let records = self.records.read().await;
            records.get(&token.item_id).map(Arc::clone)
        };
        let record = record.ok_or(LedgerError::InvariantViolation {
            item_id: token.item_id,
            released: token.quantity,
            allocated: 0,
        })?;

        let mut record = record.lock().await;
        if record.qty_allocated < token.quantity {
            return Err(LedgerError::InvariantViolation {
                item_id: token.item_id,
                released: token.quantity,
                allocated: record.qty_allocated,
            });
        }
        record.qty_allocated -= token.quantity;
        record.qty_available += token.quantity;
        Ok(())
    }

    async fn record_handle(&self, item_id: Uuid) -> Arc<Mutex<AvailabilityRecord>> {
        let mut records = self.records.write().await;
        Arc::clone(records.entry(item_id).or_insert_with(|| {
            Arc::new(Mutex::new(AvailabilityRecord {
                item_id,
                qty_available: 0,
                qty_allocated: 0,
            }))
        }))
    }
}

impl Default for AvailabilityLedger {
    fn default() -> Self {
        Self::new()
    }
}
