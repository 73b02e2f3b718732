use crate::item::CatalogItem;
use crate::pricing::PriceRecord;
use async_trait::async_trait;
use fretline_core::StoreError;
use uuid::Uuid;

/// Read access to catalog item definitions.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn item(&self, id: Uuid) -> Result<Option<CatalogItem>, StoreError>;

    async fn insert_item(&self, item: &CatalogItem) -> Result<(), StoreError>;
}

/// Access to price records, keyed by (item, currency).
#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn price_record(
        &self,
        item_id: Uuid,
        currency: &str,
    ) -> Result<Option<PriceRecord>, StoreError>;

    async fn upsert_price_record(&self, record: &PriceRecord) -> Result<(), StoreError>;
}
