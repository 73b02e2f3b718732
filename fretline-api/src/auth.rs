use crate::error::AppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fretline_core::{Principal, Role};
use uuid::Uuid;

/// Principal extracted from the claim headers the upstream auth layer
/// sets after verifying the session. The engine itself never touches
/// tokens or ambient session state.
pub struct AuthPrincipal(pub Principal);

const ACCOUNT_HEADER: &str = "x-account-id";
const ROLE_HEADER: &str = "x-role";
const TIER_HEADER: &str = "x-tier-id";
const CURRENCY_HEADER: &str = "x-currency";

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let account_id = header(parts, ACCOUNT_HEADER)?
            .ok_or_else(|| missing(ACCOUNT_HEADER))?
            .parse::<Uuid>()
            .map_err(|_| AppError::Authentication("malformed x-account-id".to_string()))?;
        let role = header(parts, ROLE_HEADER)?
            .ok_or_else(|| missing(ROLE_HEADER))?
            .parse::<Role>()
            .map_err(|err| AppError::Authentication(err.to_string()))?;
        let tier_id = header(parts, TIER_HEADER)?.map(str::to_string);
        let currency = header(parts, CURRENCY_HEADER)?
            .map(str::to_string)
            .unwrap_or_else(|| state.default_currency.clone());

        Ok(AuthPrincipal(Principal {
            account_id,
            role,
            tier_id,
            currency,
        }))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::Authentication(format!("non-ascii {name} header"))),
    }
}

fn missing(name: &str) -> AppError {
    AppError::Authentication(format!("missing {name} header"))
}
