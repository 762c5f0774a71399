use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiServiceError;
use crate::handlers::current_caller;
use crate::state::AppState;
use crate::usecase::participant::{
    InviteParticipantsInput, InviteParticipantsUseCase, RemoveParticipantInput,
    RemoveParticipantUseCase,
};

// ── POST /events/{event_id}/participants ──────────────────────────────────────

#[derive(Deserialize)]
pub struct InviteParticipantsRequest {
    pub emails: Vec<String>,
}

pub async fn invite_participants(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path(event_id): Path<Uuid>,
    Json(body): Json<InviteParticipantsRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = InviteParticipantsUseCase {
        events: state.event_repo(),
    };
    usecase
        .execute(
            &caller,
            InviteParticipantsInput {
                event_id,
                emails: body.emails,
            },
        )
        .await?;

    Ok(StatusCode::CREATED)
}

// ── DELETE /events/{event_id}/participants/{account_id} ───────────────────────

pub async fn remove_participant(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Path((event_id, account_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let caller = current_caller(&state, &jar, &headers).await?;

    let usecase = RemoveParticipantUseCase {
        accounts: state.account_repo(),
        events: state.event_repo(),
    };
    usecase
        .execute(
            &caller,
            RemoveParticipantInput {
                event_id,
                participant_account_id: account_id,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
