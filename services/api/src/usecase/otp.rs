use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use serde_json::json;
use uuid::Uuid;

use crate::domain::repository::{AccountRepository, CodeRepository};
use crate::domain::types::{
    Account, AccountStatus, CodePurpose, OTP_LEN, OTP_MAX_ATTEMPTS, OTP_TTL_SECS, OneTimeCode,
    OutboxEvent, normalize_email,
};
use crate::error::ApiServiceError;
use crate::usecase::session::issue_session_token;

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10) as u8))
        .collect()
}

/// Issue a fresh one-time code for (account, purpose) and enqueue its
/// delivery email. Any predecessor for the same purpose is consumed in the
/// same transaction, so exactly one code is redeemable at a time.
pub async fn issue_code<C: CodeRepository>(
    codes: &C,
    account: &Account,
    purpose: CodePurpose,
) -> Result<(), ApiServiceError> {
    let code_str = generate_code();
    let now = Utc::now();
    let code = OneTimeCode {
        id: Uuid::now_v7(),
        account_id: account.id,
        purpose,
        code: code_str.clone(),
        attempts: 0,
        expires_at: now + Duration::seconds(OTP_TTL_SECS),
        consumed_at: None,
        created_at: now,
    };

    let kind = match purpose {
        CodePurpose::Verify => "verify_code_issued",
        CodePurpose::PasswordReset => "reset_code_issued",
    };
    let event = OutboxEvent {
        id: Uuid::now_v7(),
        kind: kind.to_owned(),
        payload: json!({ "email": account.email, "code": code_str }),
        idempotency_key: format!("{kind}:{}", code.id),
    };

    codes.issue_with_outbox(&code, &event).await
}

/// Check a presented code against the ledger without consuming it.
///
/// Failure precedence: no live code, then attempts exhausted, then expiry,
/// then mismatch. Presenting a superseded or already-consumed code is
/// `CodeNotFound` and does not count against the live code; a genuine wrong
/// guess does, and the guess that reaches the limit is itself reported as
/// exhausted.
pub async fn verify_code<C: CodeRepository>(
    codes: &C,
    account_id: Uuid,
    purpose: CodePurpose,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<OneTimeCode, ApiServiceError> {
    let code = codes
        .find_current(account_id, purpose)
        .await?
        .ok_or(ApiServiceError::CodeNotFound)?;

    if code.attempts >= OTP_MAX_ATTEMPTS {
        return Err(ApiServiceError::CodeAttemptsExhausted);
    }
    if code.is_expired(now) {
        return Err(ApiServiceError::CodeExpired);
    }
    if code.code != presented {
        // A stale emailed code (replaced by a resend, or already redeemed)
        // is dead, not a guess against the live one.
        if codes.matches_retired(account_id, purpose, presented).await? {
            return Err(ApiServiceError::CodeNotFound);
        }
        let attempts = codes.record_attempt(code.id).await?;
        if attempts >= OTP_MAX_ATTEMPTS {
            return Err(ApiServiceError::CodeAttemptsExhausted);
        }
        return Err(ApiServiceError::CodeMismatch);
    }
    Ok(code)
}

// ── VerifyOtp (email verification) ───────────────────────────────────────────

pub struct VerifyOtpInput {
    pub email: String,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub account: Account,
    pub session_token: String,
    pub session_exp: u64,
}

pub struct VerifyOtpUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub accounts: A,
    pub codes: C,
    pub jwt_secret: String,
}

impl<A, C> VerifyOtpUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub async fn execute(&self, input: VerifyOtpInput) -> Result<VerifyOtpOutput, ApiServiceError> {
        // Unknown emails get the same error as known emails with no live
        // code, so this endpoint cannot confirm registrations.
        let email = normalize_email(&input.email);
        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(ApiServiceError::CodeNotFound)?;

        let code = verify_code(
            &self.codes,
            account.id,
            CodePurpose::Verify,
            &input.code,
            Utc::now(),
        )
        .await?;

        self.codes.consume(code.id).await?;
        self.accounts.activate(account.id).await?;
        account.status = AccountStatus::Active;

        let (session_token, session_exp) = issue_session_token(account.id, &self.jwt_secret)?;
        Ok(VerifyOtpOutput {
            account,
            session_token,
            session_exp,
        })
    }
}

// ── ResendOtp ────────────────────────────────────────────────────────────────

pub struct ResendOtpInput {
    pub email: String,
}

pub struct ResendOtpUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    pub accounts: A,
    pub codes: C,
}

impl<A, C> ResendOtpUseCase<A, C>
where
    A: AccountRepository,
    C: CodeRepository,
{
    /// Always reports accepted; issuing is skipped silently for unknown or
    /// already-verified emails.
    pub async fn execute(&self, input: ResendOtpInput) -> Result<(), ApiServiceError> {
        let email = normalize_email(&input.email);
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            return Ok(());
        };
        if account.status != AccountStatus::Unverified {
            return Ok(());
        }
        issue_code(&self.codes, &account, CodePurpose::Verify).await
    }
}
