use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use gatherly_core::health::healthz;
use gatherly_core::middleware::request_id_layer;

use crate::handlers::{
    account::current_account,
    auth::{forgot_password, login, logout, register, resend, reset_password, verify},
    event::{
        create_event, delete_event, get_event, list_invited_events, list_owned_events,
        update_event,
    },
    participant::{invite_participants, remove_participant},
};
use crate::state::AppState;

/// Handler for `GET /readyz` — readiness means the database answers.
async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/verify", post(verify))
        .route("/auth/resend", post(resend))
        .route("/auth/login", post(login))
        .route("/auth/session", delete(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        // Accounts
        .route("/accounts/@me", get(current_account))
        // Events
        .route("/events", post(create_event))
        .route("/events/owned", get(list_owned_events))
        .route("/events/invited", get(list_invited_events))
        .route("/events/{event_id}", get(get_event))
        .route("/events/{event_id}", patch(update_event))
        .route("/events/{event_id}", delete(delete_event))
        // Participants
        .route("/events/{event_id}/participants", post(invite_participants))
        .route(
            "/events/{event_id}/participants/{account_id}",
            delete(remove_participant),
        )
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
