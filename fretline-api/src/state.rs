use fretline_catalog::{AvailabilityLedger, PriceResolver};
use fretline_core::AccountDirectory;
use fretline_order::OrderLifecycleManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<OrderLifecycleManager>,
    pub resolver: PriceResolver,
    pub ledger: Arc<AvailabilityLedger>,
    pub accounts: Arc<dyn AccountDirectory>,
    /// Currency assumed when neither the request nor the principal's
    /// claims name one.
    pub default_currency: String,
}
