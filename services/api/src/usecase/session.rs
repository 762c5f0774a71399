use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use gatherly_auth_types::token::{SESSION_EXP_SECS, SessionClaims};

use crate::domain::repository::AccountRepository;
use crate::domain::types::Account;
use crate::error::ApiServiceError;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Sign a 12-hour session JWT for an account. Returns the token and its
/// expiry as unix seconds.
pub fn issue_session_token(
    account_id: Uuid,
    secret: &str,
) -> Result<(String, u64), ApiServiceError> {
    let exp = now_secs() + SESSION_EXP_SECS;
    let claims = SessionClaims {
        sub: account_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

// ── GetCurrentAccount ────────────────────────────────────────────────────────

pub struct GetCurrentAccountUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> GetCurrentAccountUseCase<A> {
    /// The session outliving its account is possible (stateless tokens);
    /// report the account gone rather than the session invalid.
    pub async fn execute(&self, account_id: Uuid) -> Result<Account, ApiServiceError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or(ApiServiceError::AccountNotFound)
    }
}
