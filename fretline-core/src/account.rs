use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only mirror of a dealer account owned by the external identity
/// collaborator. The engine never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub tier_id: Option<String>,
    /// ISO 4217 currency the account transacts in.
    pub currency: String,
    pub territory: String,
    pub payment_terms: String,
}

/// A pricing cohort. Only ever used as a lookup key into per-item tier
/// pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier {
    pub id: String,
    pub display_name: String,
}
