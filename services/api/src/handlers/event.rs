use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{Event, EventPatch, Participant};
use crate::error::ApiServiceError;
use crate::handlers::current_caller;
use crate::state::AppState;
use crate::usecase::event::{
    CreateEventInput, CreateEventUseCase, DeleteEventUseCase, GetEventUseCase,
    ListInvitedEventsUseCase, ListOwnedEventsUseCase, UpdateEventUseCase,
};

#[derive(Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(serialize_with = "gatherly_core::serde::to_rfc3339_ms")]
    pub starts_at: DateTime<Utc>,
    #[serde(serialize_with = "gatherly_core::serde::to_rfc3339_ms")]
    pub ends_at: DateTime<Utc>,
    #[serde(serialize_with = "gatherly_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "gatherly_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            creator_id: e.creator_id,
            title: e.title,
            description: e.description,
            starts_at: e.starts_at,
            ends_at: e.ends_at,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct ParticipantResponse {
    pub email: String,
    #[serde(serialize_with = "gatherly_core::serde::to_rfc3339_ms")]
    pub invited_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantResponse {
    fn from(p: Participant) -> Self {
        Self {
            email: p.email,
            invited_at: p.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub participants: Vec<ParticipantResponse>,
}

// ── POST /events ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<String>,
}

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = CreateEventUseCase {
        events: state.event_repo(),
    };
    let event = usecase
        .execute(
            &caller,
            CreateEventInput {
                title: body.title,
                description: body.description,
                starts_at: body.starts_at,
                ends_at: body.ends_at,
                participants: body.participants,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

// ── GET /events/owned ─────────────────────────────────────────────────────────

pub async fn list_owned_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = ListOwnedEventsUseCase {
        events: state.event_repo(),
    };
    let events = usecase.execute(&caller).await?;
    let body: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

// ── GET /events/invited ───────────────────────────────────────────────────────

pub async fn list_invited_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = ListInvitedEventsUseCase {
        events: state.event_repo(),
    };
    let events = usecase.execute(&caller).await?;
    let body: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

// ── GET /events/{event_id} ────────────────────────────────────────────────────

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = GetEventUseCase {
        events: state.event_repo(),
    };
    let (event, participants) = usecase.execute(&caller, event_id).await?;

    Ok(Json(EventDetailResponse {
        event: event.into(),
        participants: participants.into_iter().map(Into::into).collect(),
    }))
}

// ── PATCH /events/{event_id} ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    /// Absent leaves the description unchanged; explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(event_id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = UpdateEventUseCase {
        events: state.event_repo(),
    };
    let event = usecase
        .execute(
            &caller,
            event_id,
            EventPatch {
                title: body.title,
                description: body.description,
                starts_at: body.starts_at,
                ends_at: body.ends_at,
            },
        )
        .await?;

    Ok(Json(EventResponse::from(event)))
}

// ── DELETE /events/{event_id} ─────────────────────────────────────────────────

pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = DeleteEventUseCase {
        events: state.event_repo(),
    };
    usecase.execute(&caller, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
