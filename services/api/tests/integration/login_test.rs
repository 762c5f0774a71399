use chrono::{Duration, Utc};

use gatherly_api::domain::types::{AccountStatus, MAX_FAILED_LOGINS};
use gatherly_api::error::ApiServiceError;
use gatherly_api::usecase::login::{LoginInput, LoginUseCase};
use gatherly_auth_types::token::validate_session_token;
use gatherly_testing::auth::TEST_JWT_SECRET;

use crate::helpers::{MockAccountRepo, active_account, unverified_account};

fn login_uc(accounts: &MockAccountRepo) -> LoginUseCase<MockAccountRepo> {
    LoginUseCase {
        accounts: accounts.clone(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

fn input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[tokio::test]
async fn should_login_with_correct_password() {
    let account = active_account("ada@example.com", "correct pw");
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);

    let out = login_uc(&accounts)
        .execute(input("ada@example.com", "correct pw"))
        .await
        .unwrap();

    assert_eq!(out.account.id, account_id);
    let info = validate_session_token(&out.session_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.account_id, account_id);
}

#[tokio::test]
async fn should_reject_wrong_password_and_count_failure() {
    let account = active_account("ada@example.com", "correct pw");
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);

    let result = login_uc(&accounts)
        .execute(input("ada@example.com", "wrong pw"))
        .await;

    assert!(matches!(result, Err(ApiServiceError::InvalidCredentials)));
    assert_eq!(accounts.get(account_id).unwrap().failed_logins, 1);
}

#[tokio::test]
async fn should_reject_unknown_email_with_same_error_as_wrong_password() {
    let accounts = MockAccountRepo::new(vec![active_account("ada@example.com", "pw")]);
    let uc = login_uc(&accounts);

    let unknown = uc.execute(input("nobody@example.com", "pw")).await;
    let wrong = uc.execute(input("ada@example.com", "wrong")).await;

    assert!(matches!(unknown, Err(ApiServiceError::InvalidCredentials)));
    assert!(matches!(wrong, Err(ApiServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_reject_unverified_account_as_invalid_credentials() {
    let account = unverified_account("ada@example.com", "correct pw");
    let accounts = MockAccountRepo::new(vec![account]);

    // Even with the right password: unverified accounts cannot log in, and
    // the error must not reveal that the account exists.
    let result = login_uc(&accounts)
        .execute(input("ada@example.com", "correct pw"))
        .await;

    assert!(matches!(result, Err(ApiServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_lock_account_after_five_consecutive_failures() {
    let account = active_account("ada@example.com", "correct pw");
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);
    let uc = login_uc(&accounts);

    for _ in 0..MAX_FAILED_LOGINS - 1 {
        let result = uc.execute(input("ada@example.com", "wrong")).await;
        assert!(matches!(result, Err(ApiServiceError::InvalidCredentials)));
    }

    // The fifth failure trips the lock and reports the retry time.
    let result = uc.execute(input("ada@example.com", "wrong")).await;
    match result {
        Err(ApiServiceError::AccountLocked { locked_until }) => {
            let remaining = locked_until - Utc::now();
            assert!(remaining > Duration::minutes(14) && remaining <= Duration::minutes(15));
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }
    assert_eq!(accounts.get(account_id).unwrap().status, AccountStatus::Locked);

    // The correct password is also refused while locked.
    let result = uc.execute(input("ada@example.com", "correct pw")).await;
    assert!(matches!(result, Err(ApiServiceError::AccountLocked { .. })));
}

#[tokio::test]
async fn should_allow_login_after_lock_elapses() {
    let mut account = active_account("ada@example.com", "correct pw");
    account.status = AccountStatus::Locked;
    account.failed_logins = MAX_FAILED_LOGINS;
    account.lock_expires_at = Some(Utc::now() - Duration::seconds(1));
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);

    let out = login_uc(&accounts)
        .execute(input("ada@example.com", "correct pw"))
        .await
        .unwrap();

    assert_eq!(out.account.id, account_id);
    let stored = accounts.get(account_id).unwrap();
    assert_eq!(stored.status, AccountStatus::Active);
    assert_eq!(stored.failed_logins, 0);
    assert!(stored.lock_expires_at.is_none());
}

#[tokio::test]
async fn should_reset_failure_counter_on_successful_login() {
    let mut account = active_account("ada@example.com", "correct pw");
    account.failed_logins = MAX_FAILED_LOGINS - 1;
    let account_id = account.id;
    let accounts = MockAccountRepo::new(vec![account]);

    login_uc(&accounts)
        .execute(input("ada@example.com", "correct pw"))
        .await
        .unwrap();

    assert_eq!(accounts.get(account_id).unwrap().failed_logins, 0);
}
