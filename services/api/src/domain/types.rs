use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiServiceError;

/// One-time code length in digits.
pub const OTP_LEN: usize = 6;

/// One-time code time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 600;

/// Wrong guesses allowed per one-time code before it is burned.
pub const OTP_MAX_ATTEMPTS: i16 = 5;

/// Consecutive failed logins before the account locks.
pub const MAX_FAILED_LOGINS: i16 = 5;

/// Login lockout duration in seconds.
pub const LOCK_DURATION_SECS: i64 = 900;

/// Maximum event title length in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Maximum participants per event.
pub const MAX_PARTICIPANTS: usize = 1000;

/// bcrypt work factor for password hashes.
pub const BCRYPT_COST: u32 = 10;

/// Account lifecycle status. Stored as `i16` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    /// Registered but email not yet verified. Cannot log in.
    Unverified,
    /// Verified and able to log in.
    Active,
    /// Temporarily locked after too many failed logins.
    Locked,
}

impl AccountStatus {
    pub fn wire(self) -> i16 {
        match self {
            Self::Unverified => 0,
            Self::Active => 1,
            Self::Locked => 2,
        }
    }

    pub fn from_wire(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Unverified),
            1 => Some(Self::Active),
            2 => Some(Self::Locked),
            _ => None,
        }
    }
}

/// What a one-time code proves when redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    /// Email-ownership proof during registration.
    Verify,
    /// Password-reset authorization.
    PasswordReset,
}

impl CodePurpose {
    pub fn wire(self) -> i16 {
        match self {
            Self::Verify => 0,
            Self::PasswordReset => 1,
        }
    }

    pub fn from_wire(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Verify),
            1 => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub status: AccountStatus,
    pub failed_logins: i16,
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A locked account whose lock window has elapsed counts as unlocked.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.status == AccountStatus::Locked
            && self.lock_expires_at.is_some_and(|until| until > now)
    }
}

/// A one-time code issued for verification or password reset.
///
/// At most one live code exists per (account, purpose); issuing a new one
/// consumes any predecessor.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub id: Uuid,
    pub account_id: Uuid,
    pub purpose: CodePurpose,
    pub code: String,
    pub attempts: i16,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// An event with a creator and a time window.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update to an event. `None` fields are left unchanged;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
    }
}

/// An invite on an event, keyed by normalized email so invites can
/// precede registration.
#[derive(Debug, Clone)]
pub struct Participant {
    pub event_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Outbox event for async delivery (e.g. one-time-code email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Lowercase and trim an email for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Syntactic email check: exactly one `@` with non-empty local part and a
/// domain containing a dot. Normalize first.
pub fn validate_email(email: &str) -> Result<(), ApiServiceError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
    {
        return Err(ApiServiceError::InvalidEmail);
    }
    Ok(())
}

/// Title must be non-blank and at most [`TITLE_MAX_LEN`] characters.
pub fn validate_title(title: &str) -> Result<(), ApiServiceError> {
    if title.trim().is_empty() || title.chars().count() > TITLE_MAX_LEN {
        return Err(ApiServiceError::InvalidTitle);
    }
    Ok(())
}

/// Events must end strictly after they start.
pub fn validate_date_range(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<(), ApiServiceError> {
    if ends_at <= starts_at {
        return Err(ApiServiceError::InvalidDateRange);
    }
    Ok(())
}
