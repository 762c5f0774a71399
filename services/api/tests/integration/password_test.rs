use chrono::{Duration, Utc};

use gatherly_api::domain::types::{AccountStatus, CodePurpose, MAX_FAILED_LOGINS};
use gatherly_api::error::ApiServiceError;
use gatherly_api::usecase::login::{LoginInput, LoginUseCase};
use gatherly_api::usecase::password::{
    ForgotPasswordInput, ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};
use gatherly_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MockAccountRepo, MockCodeRepo, active_account, live_code, unverified_account};

#[tokio::test]
async fn should_issue_reset_code_for_verified_account() {
    let account = active_account("ada@example.com", "pw");
    let account_id = account.id;
    let codes = MockCodeRepo::empty();

    ForgotPasswordUseCase {
        accounts: MockAccountRepo::new(vec![account]),
        codes: codes.clone(),
    }
    .execute(ForgotPasswordInput {
        email: "ada@example.com".to_owned(),
    })
    .await
    .unwrap();

    assert!(codes.live(account_id, CodePurpose::PasswordReset).is_some());
    assert_eq!(codes.outbox_kinds(), vec!["reset_code_issued".to_owned()]);
}

#[tokio::test]
async fn should_silently_accept_forgot_for_unknown_or_unverified_email() {
    let unverified = unverified_account("eve@example.com", "pw");
    let codes = MockCodeRepo::empty();
    let uc = ForgotPasswordUseCase {
        accounts: MockAccountRepo::new(vec![unverified]),
        codes: codes.clone(),
    };

    uc.execute(ForgotPasswordInput {
        email: "nobody@example.com".to_owned(),
    })
    .await
    .unwrap();
    uc.execute(ForgotPasswordInput {
        email: "eve@example.com".to_owned(),
    })
    .await
    .unwrap();

    assert!(
        codes.outbox_kinds().is_empty(),
        "the endpoint must not reveal whether the email is registered"
    );
}

#[tokio::test]
async fn should_replace_password_and_clear_lockout_on_reset() {
    let mut account = active_account("ada@example.com", "old pw");
    account.status = AccountStatus::Locked;
    account.failed_logins = MAX_FAILED_LOGINS;
    account.lock_expires_at = Some(Utc::now() + Duration::minutes(10));
    let account_id = account.id;

    let accounts = MockAccountRepo::new(vec![account]);
    let codes = MockCodeRepo::new(vec![live_code(
        account_id,
        CodePurpose::PasswordReset,
        "654321",
    )]);

    ResetPasswordUseCase {
        accounts: accounts.clone(),
        codes: codes.clone(),
    }
    .execute(ResetPasswordInput {
        email: "ada@example.com".to_owned(),
        code: "654321".to_owned(),
        new_password: "new pw".to_owned(),
    })
    .await
    .unwrap();

    assert!(
        codes.live(account_id, CodePurpose::PasswordReset).is_none(),
        "reset code should be consumed"
    );

    // Old password dead, new password logs in, lock cleared.
    let login = LoginUseCase {
        accounts: accounts.clone(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = login
        .execute(LoginInput {
            email: "ada@example.com".to_owned(),
            password: "old pw".to_owned(),
        })
        .await;
    assert!(matches!(result, Err(ApiServiceError::InvalidCredentials)));

    login
        .execute(LoginInput {
            email: "ada@example.com".to_owned(),
            password: "new pw".to_owned(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn should_count_attempts_on_wrong_reset_code() {
    let account = active_account("ada@example.com", "pw");
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);
    let codes = MockCodeRepo::new(vec![live_code(
        account_id,
        CodePurpose::PasswordReset,
        "654321",
    )]);

    let result = ResetPasswordUseCase {
        accounts: accounts.clone(),
        codes: codes.clone(),
    }
    .execute(ResetPasswordInput {
        email: "ada@example.com".to_owned(),
        code: "000000".to_owned(),
        new_password: "new pw".to_owned(),
    })
    .await;

    assert!(matches!(result, Err(ApiServiceError::CodeMismatch)));
    assert_eq!(
        codes
            .live(account_id, CodePurpose::PasswordReset)
            .unwrap()
            .attempts,
        1
    );
}

#[tokio::test]
async fn should_not_accept_verification_code_for_reset() {
    let account = active_account("ada@example.com", "pw");
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);
    // Only a Verify-purpose code exists.
    let codes = MockCodeRepo::new(vec![live_code(account_id, CodePurpose::Verify, "123456")]);

    let result = ResetPasswordUseCase {
        accounts: accounts.clone(),
        codes: codes.clone(),
    }
    .execute(ResetPasswordInput {
        email: "ada@example.com".to_owned(),
        code: "123456".to_owned(),
        new_password: "new pw".to_owned(),
    })
    .await;

    assert!(
        matches!(result, Err(ApiServiceError::CodeNotFound)),
        "codes must be purpose-scoped, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_empty_new_password() {
    let account = active_account("ada@example.com", "pw");
    let account_id = account.id;
    let result = ResetPasswordUseCase {
        accounts: MockAccountRepo::new(vec![account]),
        codes: MockCodeRepo::new(vec![live_code(
            account_id,
            CodePurpose::PasswordReset,
            "654321",
        )]),
    }
    .execute(ResetPasswordInput {
        email: "ada@example.com".to_owned(),
        code: "654321".to_owned(),
        new_password: String::new(),
    })
    .await;

    assert!(matches!(result, Err(ApiServiceError::MissingData)));
}

#[tokio::test]
async fn should_reject_reset_for_unknown_email_as_code_not_found() {
    let result = ResetPasswordUseCase {
        accounts: MockAccountRepo::empty(),
        codes: MockCodeRepo::empty(),
    }
    .execute(ResetPasswordInput {
        email: "nobody@example.com".to_owned(),
        code: "654321".to_owned(),
        new_password: "new pw".to_owned(),
    })
    .await;

    assert!(matches!(result, Err(ApiServiceError::CodeNotFound)));
}
