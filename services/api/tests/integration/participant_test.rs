use uuid::Uuid;

use gatherly_api::domain::types::{MAX_PARTICIPANTS, Participant};
use gatherly_api::error::ApiServiceError;
use gatherly_api::usecase::event::Caller;
use gatherly_api::usecase::participant::{
    InviteParticipantsInput, InviteParticipantsUseCase, RemoveParticipantInput,
    RemoveParticipantUseCase,
};

use crate::helpers::{MockAccountRepo, MockEventRepo, active_account, test_event};

fn caller(email: &str) -> Caller {
    Caller {
        account_id: Uuid::now_v7(),
        email: email.to_owned(),
    }
}

fn invite_input(event_id: Uuid, emails: &[&str]) -> InviteParticipantsInput {
    InviteParticipantsInput {
        event_id,
        emails: emails.iter().map(|e| (*e).to_owned()).collect(),
    }
}

#[tokio::test]
async fn should_invite_participants() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let events = MockEventRepo::new(vec![event.clone()], vec![]);

    InviteParticipantsUseCase {
        events: events.clone(),
    }
    .execute(&creator, invite_input(event.id, &["Bob@X.com", "carol@x.com"]))
    .await
    .unwrap();

    assert_eq!(
        events.participant_emails(event.id),
        vec!["bob@x.com".to_owned(), "carol@x.com".to_owned()]
    );
}

#[tokio::test]
async fn should_reject_duplicate_invite() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let events = MockEventRepo::with_participants(event.clone(), &["bob@x.com"]);
    let uc = InviteParticipantsUseCase {
        events: events.clone(),
    };

    // Already invited earlier.
    let result = uc
        .execute(&creator, invite_input(event.id, &["bob@x.com"]))
        .await;
    assert!(matches!(result, Err(ApiServiceError::AlreadyInvited)));

    // Repeated within one batch, case-insensitively.
    let result = uc
        .execute(&creator, invite_input(event.id, &["carol@x.com", "Carol@X.com"]))
        .await;
    assert!(matches!(result, Err(ApiServiceError::AlreadyInvited)));
}

#[tokio::test]
async fn should_reject_batch_atomically() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let events = MockEventRepo::with_participants(event.clone(), &["bob@x.com"]);

    // carol is new, bob is a duplicate: neither must land.
    let result = InviteParticipantsUseCase {
        events: events.clone(),
    }
    .execute(&creator, invite_input(event.id, &["carol@x.com", "bob@x.com"]))
    .await;

    assert!(matches!(result, Err(ApiServiceError::AlreadyInvited)));
    assert_eq!(
        events.participant_emails(event.id),
        vec!["bob@x.com".to_owned()],
        "a failed batch must insert nothing"
    );
}

#[tokio::test]
async fn should_reject_self_invite_and_bad_email() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let events = MockEventRepo::new(vec![event.clone()], vec![]);
    let uc = InviteParticipantsUseCase {
        events: events.clone(),
    };

    let result = uc
        .execute(&creator, invite_input(event.id, &["ADA@example.com"]))
        .await;
    assert!(matches!(result, Err(ApiServiceError::SelfInvite)));

    let result = uc
        .execute(&creator, invite_input(event.id, &["not-an-email"]))
        .await;
    assert!(matches!(result, Err(ApiServiceError::InvalidEmail)));

    let result = uc.execute(&creator, invite_input(event.id, &[])).await;
    assert!(matches!(result, Err(ApiServiceError::MissingData)));
}

#[tokio::test]
async fn should_enforce_participant_capacity() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Town Hall");
    let existing: Vec<Participant> = (0..MAX_PARTICIPANTS - 1)
        .map(|i| Participant {
            event_id: event.id,
            email: format!("guest{i}@x.com"),
            created_at: event.created_at,
        })
        .collect();
    let events = MockEventRepo::new(vec![event.clone()], existing);
    let uc = InviteParticipantsUseCase {
        events: events.clone(),
    };

    // Two more would exceed the cap of 1000.
    let result = uc
        .execute(
            &creator,
            invite_input(event.id, &["one-more@x.com", "too-many@x.com"]),
        )
        .await;
    assert!(matches!(result, Err(ApiServiceError::CapacityExceeded)));

    // Exactly filling the last slot is fine.
    uc.execute(&creator, invite_input(event.id, &["one-more@x.com"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn should_guard_invites_like_other_mutations() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let events = MockEventRepo::with_participants(event.clone(), &["bob@x.com"]);
    let uc = InviteParticipantsUseCase {
        events: events.clone(),
    };

    let result = uc
        .execute(&caller("bob@x.com"), invite_input(event.id, &["carol@x.com"]))
        .await;
    assert!(matches!(result, Err(ApiServiceError::Forbidden)));

    let result = uc
        .execute(
            &caller("mallory@x.com"),
            invite_input(event.id, &["carol@x.com"]),
        )
        .await;
    assert!(matches!(result, Err(ApiServiceError::EventNotFound)));
}

#[tokio::test]
async fn should_remove_registered_participant_by_account_id() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let bob = active_account("bob@x.com", "pw");
    let bob_id = bob.id;
    let events = MockEventRepo::with_participants(event.clone(), &["bob@x.com"]);

    RemoveParticipantUseCase {
        accounts: MockAccountRepo::new(vec![bob]),
        events: events.clone(),
    }
    .execute(
        &creator,
        RemoveParticipantInput {
            event_id: event.id,
            participant_account_id: bob_id,
        },
    )
    .await
    .unwrap();

    assert!(events.participant_emails(event.id).is_empty());
}

#[tokio::test]
async fn should_report_participant_not_found() {
    let creator = caller("ada@example.com");
    let event = test_event(creator.account_id, "Standup");
    let carol = active_account("carol@x.com", "pw");
    let carol_id = carol.id;
    let events = MockEventRepo::with_participants(event.clone(), &["bob@x.com"]);
    let uc = RemoveParticipantUseCase {
        accounts: MockAccountRepo::new(vec![carol]),
        events: events.clone(),
    };

    // Unknown account id.
    let result = uc
        .execute(
            &creator,
            RemoveParticipantInput {
                event_id: event.id,
                participant_account_id: Uuid::now_v7(),
            },
        )
        .await;
    assert!(matches!(result, Err(ApiServiceError::ParticipantNotFound)));

    // Registered account that was never invited.
    let result = uc
        .execute(
            &creator,
            RemoveParticipantInput {
                event_id: event.id,
                participant_account_id: carol_id,
            },
        )
        .await;
    assert!(matches!(result, Err(ApiServiceError::ParticipantNotFound)));
}
