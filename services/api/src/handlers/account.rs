use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use axum_extra::extract::CookieJar;

use crate::error::ApiServiceError;
use crate::handlers::{auth::AccountResponse, authenticate};
use crate::state::AppState;
use crate::usecase::session::GetCurrentAccountUseCase;

// ── GET /accounts/@me ─────────────────────────────────────────────────────────

pub async fn current_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiServiceError> {
    let info = authenticate(&state, &jar, &headers)?;

    let usecase = GetCurrentAccountUseCase {
        accounts: state.account_repo(),
    };
    let account = usecase.execute(info.account_id).await?;

    Ok(Json(AccountResponse {
        id: account.id,
        email: account.email,
        display_name: account.display_name,
    }))
}
