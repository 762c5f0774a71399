use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::{AccountRepository, CodeRepository};
use crate::domain::types::{
    Account, AccountStatus, CodePurpose, normalize_email, validate_email,
};
use crate::error::ApiServiceError;
use crate::usecase::otp::issue_code;
use crate::usecase::password::hash_password;

pub struct RegisterInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

pub struct RegisterUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub accounts: A,
    pub codes: C,
}

impl<A, C> RegisterUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    /// Registers a new account in Unverified state and issues a
    /// verification code. Re-registering an email that never verified
    /// refreshes the stored hash and display name instead of failing, so a
    /// typo in the first attempt does not strand the address.
    pub async fn execute(&self, input: RegisterInput) -> Result<Uuid, ApiServiceError> {
        if input.display_name.trim().is_empty() || input.password.is_empty() {
            return Err(ApiServiceError::MissingData);
        }
        let email = normalize_email(&input.email);
        validate_email(&email)?;

        if let Some(existing) = self.accounts.find_by_email(&email).await? {
            if existing.status != AccountStatus::Unverified {
                return Err(ApiServiceError::DuplicateEmail);
            }
            let hash = hash_password(input.password).await?;
            self.accounts
                .refresh_unverified(existing.id, input.display_name.trim(), &hash)
                .await?;
            let refreshed = Account {
                display_name: input.display_name.trim().to_owned(),
                password_hash: hash,
                ..existing
            };
            issue_code(&self.codes, &refreshed, CodePurpose::Verify).await?;
            return Ok(refreshed.id);
        }

        let hash = hash_password(input.password).await?;
        let now = Utc::now();
        let account = Account {
            id: Uuid::now_v7(),
            email,
            display_name: input.display_name.trim().to_owned(),
            password_hash: hash,
            status: AccountStatus::Unverified,
            failed_logins: 0,
            lock_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.accounts.create(&account).await?;
        issue_code(&self.codes, &account, CodePurpose::Verify).await?;
        Ok(account.id)
    }
}
