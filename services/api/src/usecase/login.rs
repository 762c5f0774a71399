use chrono::Utc;

use crate::domain::repository::AccountRepository;
use crate::domain::types::{Account, AccountStatus, normalize_email};
use crate::error::ApiServiceError;
use crate::usecase::password::verify_password;
use crate::usecase::session::issue_session_token;

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub account: Account,
    pub session_token: String,
    pub session_exp: u64,
}

pub struct LoginUseCase<A: AccountRepository> {
    pub accounts: A,
    pub jwt_secret: String,
}

impl<A: AccountRepository> LoginUseCase<A> {
    /// Unknown email, unverified account, and wrong password all collapse
    /// into `InvalidCredentials`. Only an active lock is distinguishable,
    /// and only because the caller has at that point already presented five
    /// wrong passwords for the address.
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ApiServiceError> {
        let email = normalize_email(&input.email);
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(ApiServiceError::InvalidCredentials)?;

        let now = Utc::now();
        if account.is_locked(now) {
            // lock_expires_at is set whenever is_locked holds.
            let locked_until = account
                .lock_expires_at
                .ok_or_else(|| ApiServiceError::Internal(anyhow::anyhow!("locked without expiry")))?;
            return Err(ApiServiceError::AccountLocked { locked_until });
        }
        if account.status == AccountStatus::Unverified {
            return Err(ApiServiceError::InvalidCredentials);
        }

        if !verify_password(input.password, account.password_hash.clone()).await? {
            let updated = self.accounts.record_failed_login(account.id).await?;
            if updated.is_locked(Utc::now()) {
                if let Some(locked_until) = updated.lock_expires_at {
                    return Err(ApiServiceError::AccountLocked { locked_until });
                }
            }
            return Err(ApiServiceError::InvalidCredentials);
        }

        // Success also clears an elapsed lock and the failure counter.
        self.accounts.record_successful_login(account.id).await?;

        let (session_token, session_exp) = issue_session_token(account.id, &self.jwt_secret)?;
        Ok(LoginOutput {
            account,
            session_token,
            session_exp,
        })
    }
}
