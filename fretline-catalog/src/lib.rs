pub mod availability;
pub mod item;
pub mod options;
pub mod pricing;
pub mod repository;

pub use availability::{AvailabilityLedger, AvailabilityRecord, LedgerError, ReservationToken};
pub use item::{CatalogItem, ItemError, OptionDef, OptionKind, OptionValue};
pub use options::{compose, Composition, OptionError, Selection};
pub use pricing::{PriceRecord, PriceResolver, PricingError, Promo, PromoKind};
pub use repository::{CatalogRepository, PriceRepository};
