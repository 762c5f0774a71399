#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    Account, CodePurpose, Event, EventPatch, OneTimeCode, OutboxEvent, Participant,
};
use crate::error::ApiServiceError;

/// Repository for accounts and their login-lockout state.
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, ApiServiceError>;

    /// Insert a new unverified account. Maps a unique-email violation to
    /// `DuplicateEmail`.
    async fn create(&self, account: &Account) -> Result<(), ApiServiceError>;

    /// Overwrite the password hash and display name of a still-unverified
    /// account (re-registration before verification).
    async fn refresh_unverified(
        &self,
        id: Uuid,
        display_name: &str,
        password_hash: &str,
    ) -> Result<(), ApiServiceError>;

    /// Transition an account to Active.
    async fn activate(&self, id: Uuid) -> Result<(), ApiServiceError>;

    /// Count one failed login under a row lock and return the updated
    /// account. Locks the account for [`LOCK_DURATION_SECS`] once the
    /// counter reaches [`MAX_FAILED_LOGINS`].
    ///
    /// [`LOCK_DURATION_SECS`]: crate::domain::types::LOCK_DURATION_SECS
    /// [`MAX_FAILED_LOGINS`]: crate::domain::types::MAX_FAILED_LOGINS
    async fn record_failed_login(&self, id: Uuid) -> Result<Account, ApiServiceError>;

    /// Reset the failed-login counter and clear any lock.
    async fn record_successful_login(&self, id: Uuid) -> Result<(), ApiServiceError>;

    /// Set a new password hash, resetting lockout state.
    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiServiceError>;
}

/// Repository for one-time codes.
pub trait CodeRepository: Send + Sync {
    /// Atomically consume any live code for (account, purpose), insert the
    /// new code, and enqueue its delivery outbox event in one transaction.
    async fn issue_with_outbox(
        &self,
        code: &OneTimeCode,
        event: &OutboxEvent,
    ) -> Result<(), ApiServiceError>;

    /// Find the live (unconsumed) code for an account + purpose, if any.
    async fn find_current(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
    ) -> Result<Option<OneTimeCode>, ApiServiceError>;

    /// Whether the presented value matches a retired (consumed or
    /// superseded) code for this account + purpose. Lets verification tell
    /// "stale emailed code" apart from a plain wrong guess.
    async fn matches_retired(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
        presented: &str,
    ) -> Result<bool, ApiServiceError>;

    /// Increment the attempt counter under a row lock and return the new
    /// count.
    async fn record_attempt(&self, id: Uuid) -> Result<i16, ApiServiceError>;

    /// Mark a live code consumed (sets consumed_at = now). Conditional on
    /// the row still being unconsumed, so two racing redemptions cannot
    /// both succeed; the loser gets `CodeNotFound`.
    async fn consume(&self, id: Uuid) -> Result<(), ApiServiceError>;
}

/// Repository for events and their participant lists.
pub trait EventRepository: Send + Sync {
    /// Insert an event and its initial invites in one transaction.
    async fn create_with_participants(
        &self,
        event: &Event,
        participant_emails: &[String],
    ) -> Result<(), ApiServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiServiceError>;

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Event>, ApiServiceError>;

    /// Events the given (normalized) email is invited to.
    async fn list_by_participant_email(
        &self,
        email: &str,
    ) -> Result<Vec<Event>, ApiServiceError>;

    /// Apply a patch under a row lock, revalidating the merged start/end
    /// window against the stored row (it may have moved since the caller
    /// read it). A window where end ≤ start is `InvalidDateRange`.
    async fn update(&self, id: Uuid, patch: &EventPatch) -> Result<Event, ApiServiceError>;

    /// Delete an event (invites cascade). Returns `true` if deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiServiceError>;

    async fn list_participants(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Participant>, ApiServiceError>;

    async fn is_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError>;

    /// Add invites atomically: re-checks capacity under a row lock on the
    /// event and inserts all or nothing. Maps a duplicate-invite violation
    /// to `AlreadyInvited` and a capacity overrun to `CapacityExceeded`.
    async fn add_participants(
        &self,
        event_id: Uuid,
        emails: &[String],
        now: DateTime<Utc>,
    ) -> Result<(), ApiServiceError>;

    /// Remove one invite. Returns `true` if a row was deleted.
    async fn remove_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError>;
}
