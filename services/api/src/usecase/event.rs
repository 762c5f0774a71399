use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::guard::{EventAction, authorize};
use crate::domain::repository::EventRepository;
use crate::domain::types::{
    Event, EventPatch, Participant, validate_date_range, validate_title,
};
use crate::error::ApiServiceError;
use crate::usecase::participant::normalize_invites;

/// Authenticated caller identity threaded through event operations.
#[derive(Debug, Clone)]
pub struct Caller {
    pub account_id: Uuid,
    pub email: String,
}

// ── CreateEvent ──────────────────────────────────────────────────────────────

pub struct CreateEventInput {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Initial invites, validated like any other invite batch.
    pub participants: Vec<String>,
}

pub struct CreateEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> CreateEventUseCase<E> {
    pub async fn execute(
        &self,
        caller: &Caller,
        input: CreateEventInput,
    ) -> Result<Event, ApiServiceError> {
        validate_title(&input.title)?;
        validate_date_range(input.starts_at, input.ends_at)?;

        let invites = normalize_invites(&input.participants, &caller.email)?;

        let now = Utc::now();
        let event = Event {
            id: Uuid::now_v7(),
            creator_id: caller.account_id,
            title: input.title.trim().to_owned(),
            description: input.description,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            created_at: now,
            updated_at: now,
        };
        self.events.create_with_participants(&event, &invites).await?;
        Ok(event)
    }
}

// ── GetEvent ─────────────────────────────────────────────────────────────────

pub struct GetEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> GetEventUseCase<E> {
    pub async fn execute(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<(Event, Vec<Participant>), ApiServiceError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(ApiServiceError::EventNotFound)?;
        let is_participant = self.events.is_participant(event_id, &caller.email).await?;
        authorize(EventAction::Read, caller.account_id, &event, is_participant)?;

        let participants = self.events.list_participants(event_id).await?;
        Ok((event, participants))
    }
}

// ── ListOwnedEvents / ListInvitedEvents ──────────────────────────────────────

pub struct ListOwnedEventsUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> ListOwnedEventsUseCase<E> {
    pub async fn execute(&self, caller: &Caller) -> Result<Vec<Event>, ApiServiceError> {
        self.events.list_by_creator(caller.account_id).await
    }
}

pub struct ListInvitedEventsUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> ListInvitedEventsUseCase<E> {
    pub async fn execute(&self, caller: &Caller) -> Result<Vec<Event>, ApiServiceError> {
        self.events.list_by_participant_email(&caller.email).await
    }
}

// ── UpdateEvent ──────────────────────────────────────────────────────────────

pub struct UpdateEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> UpdateEventUseCase<E> {
    pub async fn execute(
        &self,
        caller: &Caller,
        event_id: Uuid,
        patch: EventPatch,
    ) -> Result<Event, ApiServiceError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(ApiServiceError::EventNotFound)?;
        let is_participant = self.events.is_participant(event_id, &caller.email).await?;
        authorize(EventAction::Mutate, caller.account_id, &event, is_participant)?;

        if patch.is_empty() {
            return Err(ApiServiceError::MissingData);
        }
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        // The window stays valid as a whole even when only one bound moves.
        let starts_at = patch.starts_at.unwrap_or(event.starts_at);
        let ends_at = patch.ends_at.unwrap_or(event.ends_at);
        validate_date_range(starts_at, ends_at)?;

        self.events.update(event_id, &patch).await
    }
}

// ── DeleteEvent ──────────────────────────────────────────────────────────────

pub struct DeleteEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> DeleteEventUseCase<E> {
    pub async fn execute(&self, caller: &Caller, event_id: Uuid) -> Result<(), ApiServiceError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(ApiServiceError::EventNotFound)?;
        let is_participant = self.events.is_participant(event_id, &caller.email).await?;
        authorize(EventAction::Mutate, caller.account_id, &event, is_participant)?;

        if !self.events.delete(event_id).await? {
            return Err(ApiServiceError::EventNotFound);
        }
        Ok(())
    }
}
