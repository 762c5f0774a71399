use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use gatherly_auth_types::cookie::{clear_session_cookie, set_session_cookie};

use crate::error::ApiServiceError;
use crate::handlers::authenticate;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};
use crate::usecase::otp::{ResendOtpInput, ResendOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};
use crate::usecase::password::{
    ForgotPasswordInput, ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};
use crate::usecase::register::{RegisterInput, RegisterUseCase};

const X_SESSION_EXPIRES: &str = "x-session-expires";

fn session_expires_header(exp: u64) -> Result<(HeaderName, HeaderValue), ApiServiceError> {
    let value = HeaderValue::from_str(&exp.to_string())
        .map_err(|e| ApiServiceError::Internal(e.into()))?;
    Ok((HeaderName::from_static(X_SESSION_EXPIRES), value))
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub id: uuid::Uuid,
    pub email: String,
    pub display_name: String,
}

// ── POST /auth/register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: uuid::Uuid,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = RegisterUseCase {
        accounts: state.account_repo(),
        codes: state.code_repo(),
    };

    let id = usecase
        .execute(RegisterInput {
            email: body.email,
            display_name: body.display_name,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
}

// ── POST /auth/verify ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

pub async fn verify(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = VerifyOtpUseCase {
        accounts: state.account_repo(),
        codes: state.code_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let out = usecase
        .execute(VerifyOtpInput {
            email: body.email,
            code: body.code,
        })
        .await?;

    let jar = set_session_cookie(jar, out.session_token, state.cookie_domain.clone());

    let mut headers = HeaderMap::new();
    let (name, value) = session_expires_header(out.session_exp)?;
    headers.insert(name, value);

    let body = AccountResponse {
        id: out.account.id,
        email: out.account.email,
        display_name: out.account.display_name,
    };
    Ok((StatusCode::OK, jar, headers, Json(body)))
}

// ── POST /auth/resend ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

pub async fn resend(
    State(state): State<AppState>,
    Json(body): Json<ResendRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = ResendOtpUseCase {
        accounts: state.account_repo(),
        codes: state.code_repo(),
    };

    usecase.execute(ResendOtpInput { email: body.email }).await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /auth/login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let jar = set_session_cookie(jar, out.session_token, state.cookie_domain.clone());

    let mut headers = HeaderMap::new();
    let (name, value) = session_expires_header(out.session_exp)?;
    headers.insert(name, value);

    let body = AccountResponse {
        id: out.account.id,
        email: out.account.email,
        display_name: out.account.display_name,
    };
    Ok((StatusCode::CREATED, jar, headers, Json(body)))
}

// ── DELETE /auth/session ──────────────────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiServiceError> {
    authenticate(&state, &jar, &headers)?;
    let jar = clear_session_cookie(jar, state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}

// ── POST /auth/forgot-password ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = ForgotPasswordUseCase {
        accounts: state.account_repo(),
        codes: state.code_repo(),
    };

    usecase
        .execute(ForgotPasswordInput { email: body.email })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /auth/reset-password ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiServiceError> {
    let usecase = ResetPasswordUseCase {
        accounts: state.account_repo(),
        codes: state.code_repo(),
    };

    usecase
        .execute(ResetPasswordInput {
            email: body.email,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
