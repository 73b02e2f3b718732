use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of the acting principal, as asserted by the external auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Dealer,
    Distributor,
    Admin,
}

impl Role {
    /// Dealers and distributors share the same ordering permissions.
    pub fn is_dealer_side(&self) -> bool {
        matches!(self, Role::Dealer | Role::Distributor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Dealer => "DEALER",
            Role::Distributor => "DISTRIBUTOR",
            Role::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEALER" => Ok(Role::Dealer),
            "DISTRIBUTOR" => Ok(Role::Distributor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// The acting principal, re-expressed as an explicit value.
///
/// Built from the claims the external identity collaborator supplies and
/// passed into every core call, so the engine never reads ambient session
/// state and stays testable without a live login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
    /// Pricing tier of the account, absent for admins.
    pub tier_id: Option<String>,
    /// ISO 4217 currency the account transacts in.
    pub currency: String,
}

impl Principal {
    /// True if this principal owns orders placed under `account_id`.
    pub fn owns(&self, account_id: Uuid) -> bool {
        self.role.is_dealer_side() && self.account_id == account_id
    }
}
