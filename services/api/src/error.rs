use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};

/// Api service domain error variants.
///
/// Enumeration policy: login failures collapse into `InvalidCredentials`
/// (never revealing whether the account exists or the password was wrong),
/// except the locked case which carries a retry-after instant. Event lookups
/// by non-participants fail with `EventNotFound`, never `Forbidden`.
#[derive(Debug, thiserror::Error)]
pub enum ApiServiceError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid title")]
    InvalidTitle,
    #[error("event must end after it starts")]
    InvalidDateRange,
    #[error("missing data")]
    MissingData,
    #[error("cannot invite the event creator")]
    SelfInvite,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("code not found")]
    CodeNotFound,
    #[error("code expired")]
    CodeExpired,
    #[error("code mismatch")]
    CodeMismatch,
    #[error("code attempts exhausted")]
    CodeAttemptsExhausted,
    #[error("invalid session")]
    InvalidSession,
    #[error("account locked")]
    AccountLocked { locked_until: DateTime<Utc> },
    #[error("forbidden")]
    Forbidden,
    #[error("account not found")]
    AccountNotFound,
    #[error("event not found")]
    EventNotFound,
    #[error("participant not found")]
    ParticipantNotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("already invited")]
    AlreadyInvited,
    #[error("participant capacity exceeded")]
    CapacityExceeded,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidTitle => "INVALID_TITLE",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::MissingData => "MISSING_DATA",
            Self::SelfInvite => "SELF_INVITE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::CodeMismatch => "CODE_MISMATCH",
            Self::CodeAttemptsExhausted => "CODE_ATTEMPTS_EXHAUSTED",
            Self::InvalidSession => "INVALID_SESSION",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::Forbidden => "FORBIDDEN",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::AlreadyInvited => "ALREADY_INVITED",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidEmail
            | Self::InvalidTitle
            | Self::InvalidDateRange
            | Self::MissingData
            | Self::SelfInvite => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::CodeNotFound
            | Self::CodeExpired
            | Self::CodeMismatch
            | Self::CodeAttemptsExhausted
            | Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::AccountLocked { .. } => StatusCode::LOCKED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AccountNotFound | Self::EventNotFound | Self::ParticipantNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicateEmail | Self::AlreadyInvited | Self::CapacityExceeded => {
                StatusCode::CONFLICT
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        // The locked case is the one failure a client may retry on a schedule.
        if let Self::AccountLocked { locked_until } = &self {
            body["locked_until"] =
                serde_json::json!(locked_until.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        (status, axum::Json(body)).into_response()
    }
}
