use crate::models::{Order, OrderLine, OrderStatus};
use crate::repository::OrderRepository;
use fretline_catalog::{
    compose, AvailabilityLedger, CatalogRepository, LedgerError, OptionError, PriceResolver,
    PricingError, ReservationToken, Selection,
};
use fretline_core::{Principal, Role, StoreError};
use fretline_shared::Money;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("catalog item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("order has no lines")]
    EmptyOrder,

    #[error("line quantity must be at least 1")]
    InvalidQuantity,

    #[error("{role} {account_id} is not permitted to {action}")]
    Unauthorized {
        account_id: Uuid,
        role: Role,
        action: &'static str,
    },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Options(#[from] OptionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A line as supplied by the dealer while configuring a draft.
#[derive(Debug, Clone)]
pub struct DraftLine {
    pub item_id: Uuid,
    pub selected_options: HashMap<String, Selection>,
    pub quantity: u32,
}

/// Owns the order state machine.
///
/// Every mutation comes through here: drafts are created and edited by the
/// owning dealer, submission prices each line and reserves stock, admins
/// advance the production chain one step at a time, and cancellation
/// returns any held stock. Mutations on one order are serialized through a
/// per-order mutex and persisted with a version-checked write.
pub struct OrderLifecycleManager {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    resolver: PriceResolver,
    ledger: Arc<AvailabilityLedger>,
    order_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OrderLifecycleManager {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        resolver: PriceResolver,
        ledger: Arc<AvailabilityLedger>,
    ) -> Self {
        Self {
            orders,
            catalog,
            resolver,
            ledger,
            order_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a DRAFT order owned by the acting dealer account.
    pub async fn create_draft(
        &self,
        principal: &Principal,
        lines: Vec<DraftLine>,
    ) -> Result<Order, OrderError> {
        if !principal.role.is_dealer_side() {
            return Err(self.unauthorized(principal, "create orders"));
        }
        let lines = self.build_lines(lines).await?;
        let order = Order::new_draft(principal.account_id, principal.account_id, lines);
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id, account_id = %order.account_id, "draft order created");
        Ok(order)
    }

    /// Replace the lines of a DRAFT order.
    pub async fn update_lines(
        &self,
        order_id: Uuid,
        principal: &Principal,
        lines: Vec<DraftLine>,
    ) -> Result<Order, OrderError> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load(order_id).await?;
        if order.status != OrderStatus::Draft {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Draft,
            });
        }
        if !principal.owns(order.account_id) {
            return Err(self.unauthorized(principal, "edit this order"));
        }
        order.lines = self.build_lines(lines).await?;
        self.save(&mut order).await?;
        Ok(order)
    }

    /// Fetch an order, visible to its owner and to admins.
    pub async fn get_order(&self, order_id: Uuid, principal: &Principal) -> Result<Order, OrderError> {
        let order = self.load(order_id).await?;
        if principal.role != Role::Admin && !principal.owns(order.account_id) {
            return Err(self.unauthorized(principal, "view this order"));
        }
        Ok(order)
    }

    /// All orders of one account, for the dealer dashboard.
    pub async fn list_orders(
        &self,
        account_id: Uuid,
        principal: &Principal,
    ) -> Result<Vec<Order>, OrderError> {
        if principal.role != Role::Admin && !principal.owns(account_id) {
            return Err(self.unauthorized(principal, "list these orders"));
        }
        Ok(self.orders.list_for_account(account_id).await?)
    }

    /// Single transition entrypoint; routes to the submit and cancel flows
    /// where those carry side effects.
    pub async fn transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        principal: &Principal,
    ) -> Result<Order, OrderError> {
        match target {
            OrderStatus::Submitted => self.submit(order_id, principal).await,
            OrderStatus::Cancelled => self.cancel(order_id, principal).await,
            _ => self.advance(order_id, target, principal).await,
        }
    }

    /// DRAFT -> SUBMITTED.
    ///
    /// Prices and composes every line, computes the subtotal, then
    /// reserves stock line by line. Reservation across lines is not
    /// atomic; if any line comes up short, every reservation already made
    /// for this submission is released and the order stays DRAFT.
    pub async fn submit(&self, order_id: Uuid, principal: &Principal) -> Result<Order, OrderError> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load(order_id).await?;
        if order.status != OrderStatus::Draft {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Submitted,
            });
        }
        if !principal.owns(order.account_id) {
            return Err(self.unauthorized(principal, "submit this order"));
        }
        if order.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        // Authoritative price and SKU per line, as of now.
        let as_of = chrono::Utc::now();
        let mut subtotal = Money::zero(principal.currency.as_str());
        for line in &mut order.lines {
            let item = self
                .catalog
                .item(line.item_id)
                .await?
                .ok_or(OrderError::ItemNotFound(line.item_id))?;
            let base = self
                .resolver
                .resolve(item.id, principal, &principal.currency, as_of)
                .await?;
            let composed = compose(&item, &line.selected_options)?;
            let unit_price = base.with_delta(composed.price_delta_minor);
            subtotal = subtotal.plus(&unit_price.times(line.quantity));
            line.resolved_sku = Some(composed.sku);
            line.unit_price = Some(unit_price);
        }
        order.subtotal = Some(subtotal);

        let mut tokens: Vec<ReservationToken> = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            match self.ledger.reserve(line.item_id, line.quantity).await {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    tracing::warn!(
                        order_id = %order.id,
                        item_id = %line.item_id,
                        %err,
                        "reservation failed, rolling back submission"
                    );
                    self.release_all(&tokens).await?;
                    return Err(err.into());
                }
            }
        }

        order.reservations = tokens;
        order.record_transition(OrderStatus::Submitted, principal.account_id);
        if let Err(err) = self.save(&mut order).await {
            // The write lost; hand the stock back before surfacing.
            self.release_all(&order.reservations).await?;
            return Err(err.into());
        }
        tracing::info!(order_id = %order.id, subtotal = ?order.subtotal, "order submitted");
        Ok(order)
    }

    /// Admin-only monotonic advance: SUBMITTED -> APPROVED ->
    /// IN_PRODUCTION -> SHIPPED -> COMPLETED, one step at a time.
    async fn advance(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        principal: &Principal,
    ) -> Result<Order, OrderError> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load(order_id).await?;
        if !OrderStatus::can_transition(order.status, target) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }
        if principal.role != Role::Admin {
            return Err(self.unauthorized(principal, "advance this order"));
        }
        order.record_transition(target, principal.account_id);
        self.save(&mut order).await?;
        if order.status.is_terminal() {
            self.discard_order_lock(order_id).await;
        }
        tracing::info!(order_id = %order.id, status = %order.status, "order advanced");
        Ok(order)
    }

    /// Terminal cancellation. Owners may cancel from DRAFT/SUBMITTED,
    /// admins also from APPROVED; any stock held by the order goes back.
    async fn cancel(&self, order_id: Uuid, principal: &Principal) -> Result<Order, OrderError> {
        let lock = self.order_lock(order_id).await;
        let _guard = lock.lock().await;

        let mut order = self.load(order_id).await?;
        if !OrderStatus::can_transition(order.status, OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }
        let permitted = match principal.role {
            Role::Admin => true,
            _ => {
                principal.owns(order.account_id)
                    && matches!(order.status, OrderStatus::Draft | OrderStatus::Submitted)
            }
        };
        if !permitted {
            return Err(self.unauthorized(principal, "cancel this order"));
        }

        self.release_all(&order.reservations).await?;
        order.reservations.clear();
        order.record_transition(OrderStatus::Cancelled, principal.account_id);
        self.save(&mut order).await?;
        self.discard_order_lock(order_id).await;
        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    async fn build_lines(&self, lines: Vec<DraftLine>) -> Result<Vec<OrderLine>, OrderError> {
        let mut built = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity);
            }
            if self.catalog.item(line.item_id).await?.is_none() {
                return Err(OrderError::ItemNotFound(line.item_id));
            }
            built.push(OrderLine {
                item_id: line.item_id,
                selected_options: line.selected_options,
                quantity: line.quantity,
                resolved_sku: None,
                unit_price: None,
            });
        }
        Ok(built)
    }

    /// Compensating rollback, newest reservation first. An invariant
    /// violation here outranks whatever triggered the rollback.
    async fn release_all(&self, tokens: &[ReservationToken]) -> Result<(), LedgerError> {
        for token in tokens.iter().rev() {
            self.ledger.release(token).await?;
        }
        Ok(())
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    async fn save(&self, order: &mut Order) -> Result<(), StoreError> {
        order.version = self.orders.update(order, order.version).await?;
        Ok(())
    }

    async fn order_lock(&self, order_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.order_locks.lock().await;
        Arc::clone(
            locks
                .entry(order_id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Terminal orders take no further mutations; dropping the map entry
    /// keeps the lock table bounded by the number of live orders. In-flight
    /// holders keep their own `Arc` to the mutex.
    async fn discard_order_lock(&self, order_id: Uuid) {
        self.order_locks.lock().await.remove(&order_id);
    }

    fn unauthorized(&self, principal: &Principal, action: &'static str) -> OrderError {
        OrderError::Unauthorized {
            account_id: principal.account_id,
            role: principal.role,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fretline_catalog::{
        CatalogItem, OptionDef, OptionKind, OptionValue, PriceRecord, PriceRepository,
    };
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    struct MemOrders(RwLock<HashMap<Uuid, Order>>);

    #[async_trait]
    impl OrderRepository for MemOrders {
        async fn insert(&self, order: &Order) -> Result<(), StoreError> {
            self.0.write().await.insert(order.id, order.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
            Ok(self.0.read().await.get(&id).cloned())
        }

        async fn update(&self, order: &Order, expected_version: u64) -> Result<u64, StoreError> {
            let mut orders = self.0.write().await;
            let stored = orders
                .get_mut(&order.id)
                .ok_or_else(|| StoreError::Backend("missing order".to_string()))?;
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
            Ok(self
                .0
                .read()
                .await
                .values()
                .filter(|o| o.account_id == account_id)
                .cloned()
                .collect())
        }
    }

    struct MemCatalog(RwLock<HashMap<Uuid, CatalogItem>>);

    #[async_trait]
    impl CatalogRepository for MemCatalog {
        async fn item(&self, id: Uuid) -> Result<Option<CatalogItem>, StoreError> {
            Ok(self.0.read().await.get(&id).cloned())
        }

        async fn insert_item(&self, item: &CatalogItem) -> Result<(), StoreError> {
            self.0.write().await.insert(item.id, item.clone());
            Ok(())
        }
    }

    struct MemPrices(RwLock<HashMap<(Uuid, String), PriceRecord>>);

    #[async_trait]
    impl PriceRepository for MemPrices {
        async fn price_record(
            &self,
            item_id: Uuid,
            currency: &str,
        ) -> Result<Option<PriceRecord>, StoreError> {
            Ok(self
                .0
                .read()
                .await
                .get(&(item_id, currency.to_string()))
                .cloned())
        }

        async fn upsert_price_record(&self, record: &PriceRecord) -> Result<(), StoreError> {
            self.0
                .write()
                .await
                .insert((record.item_id, record.currency.clone()), record.clone());
            Ok(())
        }
    }

    struct Rig {
        manager: OrderLifecycleManager,
        catalog: Arc<MemCatalog>,
        prices: Arc<MemPrices>,
        ledger: Arc<AvailabilityLedger>,
        item_id: Uuid,
    }

    async fn rig(stock: u32) -> Rig {
        let item = CatalogItem {
            id: Uuid::new_v4(),
            sku: "ST-62".to_string(),
            name: "Strat '62".to_string(),
            series: "Vintage".to_string(),
            base_specs: BTreeMap::new(),
            options: vec![OptionDef {
                option_id: "hardware_colour".to_string(),
                label: "Hardware Colour".to_string(),
                kind: OptionKind::Enumerated,
                required: true,
                values: vec![OptionValue {
                    value_id: "black".to_string(),
                    label: "Black".to_string(),
                    sku_suffix: "-BLK".to_string(),
                    price_adjustment_minor: 0,
                    images: vec![],
                }],
            }],
        };
        let record = PriceRecord {
            item_id: item.id,
            currency: "USD".to_string(),
            base_price_minor: 150_000,
            tier_prices: HashMap::from([("TIER_A".to_string(), 120_000)]),
            account_overrides: HashMap::new(),
            promo: None,
        };

        let catalog = Arc::new(MemCatalog(RwLock::new(HashMap::new())));
        catalog.insert_item(&item).await.unwrap();
        let prices = Arc::new(MemPrices(RwLock::new(HashMap::new())));
        prices.upsert_price_record(&record).await.unwrap();
        let ledger = Arc::new(AvailabilityLedger::new());
        ledger.set_stock(item.id, stock).await;

        let manager = OrderLifecycleManager::new(
            Arc::new(MemOrders(RwLock::new(HashMap::new()))),
            Arc::clone(&catalog) as Arc<dyn CatalogRepository>,
            PriceResolver::new(Arc::clone(&prices) as Arc<dyn PriceRepository>),
            Arc::clone(&ledger),
        );
        Rig {
            manager,
            catalog,
            prices,
            ledger,
            item_id: item.id,
        }
    }

    fn dealer() -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            role: Role::Dealer,
            tier_id: Some("TIER_A".to_string()),
            currency: "USD".to_string(),
        }
    }

    fn admin() -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            role: Role::Admin,
            tier_id: None,
            currency: "USD".to_string(),
        }
    }

    fn line(item_id: Uuid, quantity: u32) -> DraftLine {
        DraftLine {
            item_id,
            selected_options: HashMap::from([(
                "hardware_colour".to_string(),
                Selection::Choice("black".to_string()),
            )]),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let rig = rig(10).await;
        let dealer = dealer();
        let admin = admin();

        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 2)])
            .await
            .unwrap();
        let order = rig.manager.submit(order.id, &dealer).await.unwrap();

        assert_eq!(order.status, OrderStatus::Submitted);
        assert_eq!(order.lines[0].resolved_sku.as_deref(), Some("ST-62-BLK"));
        assert_eq!(
            order.lines[0].unit_price.as_ref().unwrap().amount_minor,
            120_000
        );
        assert_eq!(order.subtotal.as_ref().unwrap().amount_minor, 240_000);

        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (8, 2));

        for target in [
            OrderStatus::Approved,
            OrderStatus::InProduction,
            OrderStatus::Shipped,
            OrderStatus::Completed,
        ] {
            let order = rig.manager.transition(order.id, target, &admin).await.unwrap();
            assert_eq!(order.status, target);
        }

        let order = rig.manager.get_order(order.id, &admin).await.unwrap();
        assert_eq!(order.status_history.len(), 6);
    }

    #[tokio::test]
    async fn test_exact_stock_then_shortfall() {
        let rig = rig(5).await;
        let first = dealer();
        let second = dealer();

        let order = rig
            .manager
            .create_draft(&first, vec![line(rig.item_id, 5)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &first).await.unwrap();
        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (0, 5));

        let order = rig
            .manager
            .create_draft(&second, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        let err = rig.manager.submit(order.id, &second).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::Ledger(LedgerError::InsufficientStock {
                requested: 1,
                available: 0
            })
        ));
        // The failed order stays DRAFT.
        let order = rig.manager.get_order(order.id, &second).await.unwrap();
        assert_eq!(order.status, OrderStatus::Draft);
    }

    #[tokio::test]
    async fn test_partial_reservation_rolls_back() {
        let rig = rig(10).await;
        let dealer = dealer();

        // Second line prices fine but is out of stock, so its reservation
        // fails after the first line already reserved.
        let other_item = CatalogItem {
            id: Uuid::new_v4(),
            sku: "TL-52".to_string(),
            name: "Tele '52".to_string(),
            series: "Vintage".to_string(),
            base_specs: BTreeMap::new(),
            options: vec![],
        };
        rig.catalog.insert_item(&other_item).await.unwrap();
        rig.prices
            .upsert_price_record(&PriceRecord {
                item_id: other_item.id,
                currency: "USD".to_string(),
                base_price_minor: 130_000,
                tier_prices: HashMap::new(),
                account_overrides: HashMap::new(),
                promo: None,
            })
            .await
            .unwrap();
        rig.ledger.set_stock(other_item.id, 0).await;

        let order = rig
            .manager
            .create_draft(
                &dealer,
                vec![
                    line(rig.item_id, 3),
                    DraftLine {
                        item_id: other_item.id,
                        selected_options: HashMap::new(),
                        quantity: 1,
                    },
                ],
            )
            .await
            .unwrap();
        let err = rig.manager.submit(order.id, &dealer).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::Ledger(LedgerError::InsufficientStock {
                requested: 1,
                available: 0
            })
        ));

        // The first line's reservation was compensated away.
        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (10, 0));
        let order = rig.manager.get_order(order.id, &dealer).await.unwrap();
        assert_eq!(order.status, OrderStatus::Draft);
    }

    #[tokio::test]
    async fn test_draft_cancel_touches_no_stock() {
        let rig = rig(5).await;
        let dealer = dealer();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 2)])
            .await
            .unwrap();
        let order = rig
            .manager
            .transition(order.id, OrderStatus::Cancelled, &dealer)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (5, 0));
    }

    #[tokio::test]
    async fn test_cancel_after_submit_releases_stock() {
        let rig = rig(5).await;
        let dealer = dealer();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 4)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();

        rig.manager
            .transition(order.id, OrderStatus::Cancelled, &dealer)
            .await
            .unwrap();
        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (5, 0));
    }

    #[tokio::test]
    async fn test_admin_cancel_from_approved_releases_stock() {
        let rig = rig(5).await;
        let dealer = dealer();
        let admin = admin();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 3)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();
        rig.manager
            .transition(order.id, OrderStatus::Approved, &admin)
            .await
            .unwrap();

        // The owner may no longer cancel from APPROVED.
        let err = rig
            .manager
            .transition(order.id, OrderStatus::Cancelled, &dealer)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));

        rig.manager
            .transition(order.id, OrderStatus::Cancelled, &admin)
            .await
            .unwrap();
        let snap = rig.ledger.snapshot(rig.item_id).await.unwrap();
        assert_eq!((snap.qty_available, snap.qty_allocated), (5, 0));
    }

    #[tokio::test]
    async fn test_dealer_cannot_advance() {
        let rig = rig(5).await;
        let dealer = dealer();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();
        let err = rig
            .manager
            .transition(order.id, OrderStatus::Approved, &dealer)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_no_state_skipping() {
        let rig = rig(5).await;
        let dealer = dealer();
        let admin = admin();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();
        let err = rig
            .manager
            .transition(order.id, OrderStatus::Shipped, &admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Submitted,
                to: OrderStatus::Shipped
            }
        ));
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        let rig = rig(5).await;
        let dealer = dealer();
        let admin = admin();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager
            .transition(order.id, OrderStatus::Cancelled, &dealer)
            .await
            .unwrap();

        for target in [OrderStatus::Submitted, OrderStatus::Approved, OrderStatus::Cancelled] {
            let err = rig
                .manager
                .transition(order.id, target, &admin)
                .await
                .unwrap_err();
            assert!(matches!(err, OrderError::InvalidTransition { .. }), "{target}");
        }
    }

    #[tokio::test]
    async fn test_foreign_dealer_cannot_touch_order() {
        let rig = rig(5).await;
        let owner = dealer();
        let intruder = dealer();
        let order = rig
            .manager
            .create_draft(&owner, vec![line(rig.item_id, 1)])
            .await
            .unwrap();

        let err = rig.manager.submit(order.id, &intruder).await.unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
        let err = rig
            .manager
            .get_order(order.id, &intruder)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_admin_cannot_create_drafts() {
        let rig = rig(5).await;
        let err = rig
            .manager
            .create_draft(&admin(), vec![line(rig.item_id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_update_lines_only_while_draft() {
        let rig = rig(5).await;
        let dealer = dealer();
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager
            .update_lines(order.id, &dealer, vec![line(rig.item_id, 3)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();

        let err = rig
            .manager
            .update_lines(order.id, &dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_terminal_order_sheds_its_lock_entry() {
        let rig = rig(5).await;
        let dealer = dealer();
        let admin = admin();

        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();
        assert!(rig
            .manager
            .order_locks
            .lock()
            .await
            .contains_key(&order.id));

        rig.manager
            .transition(order.id, OrderStatus::Cancelled, &admin)
            .await
            .unwrap();
        assert!(!rig
            .manager
            .order_locks
            .lock()
            .await
            .contains_key(&order.id));

        // Completing an order through the full chain sheds it too.
        let order = rig
            .manager
            .create_draft(&dealer, vec![line(rig.item_id, 1)])
            .await
            .unwrap();
        rig.manager.submit(order.id, &dealer).await.unwrap();
        for target in [
            OrderStatus::Approved,
            OrderStatus::InProduction,
            OrderStatus::Shipped,
            OrderStatus::Completed,
        ] {
            rig.manager.transition(order.id, target, &admin).await.unwrap();
        }
        assert!(!rig
            .manager
            .order_locks
            .lock()
            .await
            .contains_key(&order.id));
    }

    #[tokio::test]
    async fn test_missing_required_option_blocks_submission() {
        let rig = rig(5).await;
        let dealer = dealer();
        let order = rig
            .manager
            .create_draft(
                &dealer,
                vec![DraftLine {
                    item_id: rig.item_id,
                    selected_options: HashMap::new(),
                    quantity: 1,
                }],
            )
            .await
            .unwrap();
        let err = rig.manager.submit(order.id, &dealer).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::Options(OptionError::MissingRequiredOption { .. })
        ));
    }
}
