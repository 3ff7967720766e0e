use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use subtle::ConstantTimeEq;

use crate::error::BridgeError;
use crate::router::BridgeState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller authenticated by the fronting task service.
/// Requires:
/// - `Authorization: Bearer <api_key>` matching `basic.api_key`
/// - `x-user-id: <numeric user id>`
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i64);

pub fn ensure_key(presented: &str, expected: &str) -> Result<(), BridgeError> {
    // an unset key never authorizes anyone
    if expected.is_empty() || !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(BridgeError::Unauthorized);
    }
    Ok(())
}

impl FromRequestParts<BridgeState> for AuthenticatedUser {
    type Rejection = BridgeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BridgeState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| BridgeError::Unauthorized)?;
        ensure_key(bearer.token(), &state.api_key)?;

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BridgeError::Validation(format!("missing `{USER_ID_HEADER}` header")))?
            .trim()
            .parse::<i64>()
            .map_err(|_| BridgeError::Validation(format!("invalid `{USER_ID_HEADER}` header")))?;

        Ok(Self(user_id))
    }
}
