use chrono::Utc;
use uuid::Uuid;

use crate::domain::guard::{EventAction, authorize};
use crate::domain::repository::{AccountRepository, EventRepository};
use crate::domain::types::{MAX_PARTICIPANTS, normalize_email, validate_email};
use crate::error::ApiServiceError;
use crate::usecase::event::Caller;

/// Normalize and vet a batch of invite emails. Rejects syntax errors,
/// inviting the creator, repeats within the batch, and batches that alone
/// exceed the per-event cap.
pub(crate) fn normalize_invites(
    emails: &[String],
    creator_email: &str,
) -> Result<Vec<String>, ApiServiceError> {
    if emails.len() > MAX_PARTICIPANTS {
        return Err(ApiServiceError::CapacityExceeded);
    }
    let creator = normalize_email(creator_email);
    let mut out = Vec::with_capacity(emails.len());
    for raw in emails {
        let email = normalize_email(raw);
        validate_email(&email)?;
        if email == creator {
            return Err(ApiServiceError::SelfInvite);
        }
        if out.contains(&email) {
            return Err(ApiServiceError::AlreadyInvited);
        }
        out.push(email);
    }
    Ok(out)
}

// ── InviteParticipants ───────────────────────────────────────────────────────

pub struct InviteParticipantsInput {
    pub event_id: Uuid,
    pub emails: Vec<String>,
}

pub struct InviteParticipantsUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> InviteParticipantsUseCase<E> {
    /// The batch lands atomically: one bad email, duplicate, or capacity
    /// overrun rejects the whole request and nothing is inserted.
    pub async fn execute(
        &self,
        caller: &Caller,
        input: InviteParticipantsInput,
    ) -> Result<(), ApiServiceError> {
        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(ApiServiceError::EventNotFound)?;
        let is_participant = self
            .events
            .is_participant(input.event_id, &caller.email)
            .await?;
        authorize(EventAction::Mutate, caller.account_id, &event, is_participant)?;

        if input.emails.is_empty() {
            return Err(ApiServiceError::MissingData);
        }
        let invites = normalize_invites(&input.emails, &caller.email)?;

        self.events
            .add_participants(input.event_id, &invites, Utc::now())
            .await
    }
}

// ── RemoveParticipant ────────────────────────────────────────────────────────

pub struct RemoveParticipantInput {
    pub event_id: Uuid,
    pub participant_account_id: Uuid,
}

pub struct RemoveParticipantUseCase<A, E>
where
    A: AccountRepository,
    E: EventRepository,
{
    pub accounts: A,
    pub events: E,
}

impl<A, E> RemoveParticipantUseCase<A, E>
where
    A: AccountRepository,
    E: EventRepository,
{
    /// Invites are keyed by email; the route addresses participants by
    /// account id, so the id is resolved to its registered email first. An
    /// invite for an email that never registered cannot be addressed this
    /// way, which is fine: removal targets people, not addresses.
    pub async fn execute(
        &self,
        caller: &Caller,
        input: RemoveParticipantInput,
    ) -> Result<(), ApiServiceError> {
        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(ApiServiceError::EventNotFound)?;
        let is_participant = self
            .events
            .is_participant(input.event_id, &caller.email)
            .await?;
        authorize(EventAction::Mutate, caller.account_id, &event, is_participant)?;

        let account = self
            .accounts
            .find_by_id(input.participant_account_id)
            .await?
            .ok_or(ApiServiceError::ParticipantNotFound)?;

        if !self
            .events
            .remove_participant(input.event_id, &account.email)
            .await?
        {
            return Err(ApiServiceError::ParticipantNotFound);
        }
        Ok(())
    }
}
