pub mod account;
pub mod auth;
pub mod event;
pub mod participant;

use axum::http::{HeaderMap, header};
use axum_extra::extract::CookieJar;

use gatherly_auth_types::cookie::GATHERLY_SESSION;
use gatherly_auth_types::token::{SessionInfo, validate_session_token};

use crate::domain::repository::AccountRepository;
use crate::error::ApiServiceError;
use crate::state::AppState;
use crate::usecase::event::Caller;

/// Pull the session token from the cookie jar, falling back to an
/// `Authorization: Bearer` header for non-browser clients.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(GATHERLY_SESSION) {
        return Some(cookie.value().to_owned());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Validate the request's session token.
pub(crate) fn authenticate(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<SessionInfo, ApiServiceError> {
    let token = session_token(jar, headers).ok_or(ApiServiceError::InvalidSession)?;
    validate_session_token(&token, &state.jwt_secret).map_err(|_| ApiServiceError::InvalidSession)
}

/// Authenticate and resolve the caller's account. A valid token whose
/// account no longer exists is treated as an invalid session.
pub(crate) async fn current_caller(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Caller, ApiServiceError> {
    let info = authenticate(state, jar, headers)?;
    let account = state
        .account_repo()
        .find_by_id(info.account_id)
        .await?
        .ok_or(ApiServiceError::InvalidSession)?;
    Ok(Caller {
        account_id: account.id,
        email: account.email,
    })
}
