//! Session JWT validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "issuer", test))]
use serde::Serialize;
use uuid::Uuid;

/// Session lifetime in seconds (12 hours).
pub const SESSION_EXP_SECS: u64 = 43200;

/// Identity extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub account_id: Uuid,
    pub expires_at: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("session expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload for a session token.
///
/// `sub` is the account ID (UUID string), `exp` seconds since the UNIX epoch.
/// [`Deserialize`] is always available — every consumer validates tokens.
/// [`Serialize`] requires the `issuer` cargo feature; only the api service
/// enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    pub exp: u64,
}

/// Validate a session token, returning the parsed identity.
///
/// Validity is signature + expiry only — there is no server-side revocation
/// list, so a token stays valid until its natural expiry. Validation: HS256,
/// exp checked, required claims `exp` + `sub`, default 60s leeway for clock
/// skew.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionInfo, SessionTokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => SessionTokenError::InvalidSignature,
        _ => SessionTokenError::Malformed,
    })?;

    let account_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| SessionTokenError::Malformed)?;

    Ok(SessionInfo {
        account_id,
        expires_at: data.claims.exp,
    })
}
