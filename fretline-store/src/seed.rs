use crate::memory::MemoryStore;
use chrono::{Duration, Utc};
use fretline_catalog::{
    AvailabilityLedger, CatalogItem, CatalogRepository, OptionDef, OptionKind, OptionValue,
    PriceRecord, PriceRepository, Promo, PromoKind,
};
use fretline_core::{Account, StoreError};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Item and account ids of the demo data, for wiring and tests.
pub struct SeedIds {
    pub strat_id: Uuid,
    pub jazz_id: Uuid,
    pub dealer_account_id: Uuid,
}

/// Load a small demo catalog: two guitars with options, USD pricing with a
/// tier ladder and a running promo, one dealer account, and opening stock.
pub async fn load_demo_catalog(
    store: &MemoryStore,
    ledger: &AvailabilityLedger,
) -> Result<SeedIds, StoreError> {
    let strat = CatalogItem {
        id: Uuid::new_v4(),
        sku: "ST-62".to_string(),
        name: "Strat '62 Reissue".to_string(),
        series: "Vintage".to_string(),
        base_specs: BTreeMap::from([
            ("body".to_string(), "Alder".to_string()),
            ("neck".to_string(), "Maple".to_string()),
            ("frets".to_string(), "21".to_string()),
        ]),
        options: vec![
            OptionDef {
                option_id: "hardware_colour".to_string(),
                label: "Hardware Colour".to_string(),
                kind: OptionKind::Enumerated,
                required: true,
                values: vec![
                    OptionValue {
                        value_id: "black".to_string(),
                        label: "Black".to_string(),
                        sku_suffix: "-BLK".to_string(),
                        price_adjustment_minor: 0,
                        images: vec!["st62-blk.jpg".to_string()],
                    },
                    OptionValue {
                        value_id: "gold".to_string(),
                        label: "Gold".to_string(),
                        sku_suffix: "-GLD".to_string(),
                        price_adjustment_minor: 12_000,
                        images: vec!["st62-gld.jpg".to_string()],
                    },
                ],
            },
            OptionDef {
                option_id: "pickguard".to_string(),
                label: "Pickguard".to_string(),
                kind: OptionKind::Enumerated,
                required: false,
                values: vec![OptionValue {
                    value_id: "tortoise".to_string(),
                    label: "Tortoise Shell".to_string(),
                    sku_suffix: "-TRT".to_string(),
                    price_adjustment_minor: 4_500,
                    images: vec![],
                }],
            },
        ],
    };

    let jazz = CatalogItem {
        id: Uuid::new_v4(),
        sku: "JB-75".to_string(),
        name: "Jazz Bass '75".to_string(),
        series: "Classic".to_string(),
        base_specs: BTreeMap::from([
            ("body".to_string(), "Ash".to_string()),
            ("strings".to_string(), "4".to_string()),
        ]),
        options: vec![OptionDef {
            option_id: "scale_mm".to_string(),
            label: "Scale Length (mm)".to_string(),
            kind: OptionKind::Numeric,
            required: false,
            values: vec![],
        }],
    };

    let dealer_account = Account {
        id: Uuid::new_v4(),
        tier_id: Some("TIER_A".to_string()),
        currency: "USD".to_string(),
        territory: "EMEA".to_string(),
        payment_terms: "NET30".to_string(),
    };

    for item in [&strat, &jazz] {
        item.validate()
            .map_err(|err| StoreError::Backend(format!("seed item {}: {err}", item.sku)))?;
        store.insert_item(item).await?;
    }
    store
        .upsert_price_record(&PriceRecord {
            item_id: strat.id,
            currency: "USD".to_string(),
            base_price_minor: 150_000,
            tier_prices: HashMap::from([
                ("TIER_A".to_string(), 120_000),
                ("TIER_B".to_string(), 135_000),
            ]),
            account_overrides: HashMap::new(),
            promo: None,
        })
        .await?;
    store
        .upsert_price_record(&PriceRecord {
            item_id: jazz.id,
            currency: "USD".to_string(),
            base_price_minor: 180_000,
            tier_prices: HashMap::from([("TIER_A".to_string(), 155_000)]),
            account_overrides: HashMap::new(),
            promo: Some(Promo {
                kind: PromoKind::PercentOff,
                amount: 500,
                valid_until: Utc::now() + Duration::days(30),
            }),
        })
        .await?;
    store.insert_account(dealer_account.clone()).await;

    ledger.set_stock(strat.id, 25).await;
    ledger.set_stock(jazz.id, 8).await;

    tracing::info!("demo catalog seeded: 2 items, 1 dealer account");
    Ok(SeedIds {
        strat_id: strat.id,
        jazz_id: jazz.id,
        dealer_account_id: dealer_account.id,
    })
}
