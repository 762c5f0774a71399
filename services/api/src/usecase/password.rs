use anyhow::Context as _;
use chrono::Utc;

use crate::domain::repository::{AccountRepository, CodeRepository};
use crate::domain::types::{AccountStatus, BCRYPT_COST, CodePurpose, normalize_email};
use crate::error::ApiServiceError;
use crate::usecase::otp::{issue_code, verify_code};

/// Hash a password off the async runtime. bcrypt at cost 10 takes tens of
/// milliseconds, too long to block a worker thread.
pub async fn hash_password(password: String) -> Result<String, ApiServiceError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .context("hash task panicked")?
        .context("bcrypt hash")?;
    Ok(hash)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiServiceError> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("verify task panicked")?
        .context("bcrypt verify")?;
    Ok(ok)
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

pub struct ForgotPasswordInput {
    pub email: String,
}

pub struct ForgotPasswordUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub accounts: A,
    pub codes: C,
}

impl<A, C> ForgotPasswordUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    /// Always reports accepted. Whether a code was actually issued must not
    /// be observable, or the endpoint becomes an email-existence oracle.
    pub async fn execute(&self, input: ForgotPasswordInput) -> Result<(), ApiServiceError> {
        let email = normalize_email(&input.email);
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            return Ok(());
        };
        // Redeeming a reset reactivates the account, so a reset code for an
        // unverified address would stand in for email verification.
        if account.status == AccountStatus::Unverified {
            return Ok(());
        }
        issue_code(&self.codes, &account, CodePurpose::PasswordReset).await
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub accounts: A,
    pub codes: C,
}

impl<A, C> ResetPasswordUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    /// Redeeming a reset code replaces the password and clears any login
    /// lockout. Outstanding sessions stay valid until they expire.
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), ApiServiceError> {
        if input.new_password.is_empty() {
            return Err(ApiServiceError::MissingData);
        }

        // An unknown email yields the same error as a known email with no
        // outstanding code.
        let email = normalize_email(&input.email);
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(ApiServiceError::CodeNotFound)?;

        let code = verify_code(
            &self.codes,
            account.id,
            CodePurpose::PasswordReset,
            &input.code,
            Utc::now(),
        )
        .await?;
        self.codes.consume(code.id).await?;

        let hash = hash_password(input.new_password).await?;
        self.accounts.replace_password(account.id, &hash).await?;
        Ok(())
    }
}
