//! Session-token helpers for tests.
//!
//! Tests mint their own tokens with [`TEST_JWT_SECRET`] instead of running
//! a full login flow, so session-validation paths can be exercised directly.

use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use gatherly_auth_types::token::{SESSION_EXP_SECS, SessionClaims};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Mint a session token for `account_id`, valid for the standard 12 hours.
pub fn make_session_token(account_id: Uuid, secret: &str) -> String {
    make_session_token_with_exp(account_id, secret, now_secs() + SESSION_EXP_SECS)
}

/// Mint a session token with an explicit expiry — pass a past instant to
/// produce an already-expired token.
pub fn make_session_token_with_exp(account_id: Uuid, secret: &str, exp: u64) -> String {
    let claims = SessionClaims {
        sub: account_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode test session token")
}
