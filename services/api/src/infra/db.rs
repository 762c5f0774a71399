use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionError,
    TransactionTrait,
};
use uuid::Uuid;

use gatherly_api_schema::{accounts, event_participants, events, one_time_codes, outbox_events};

use crate::domain::repository::{AccountRepository, CodeRepository, EventRepository};
use crate::domain::types::{
    Account, AccountStatus, CodePurpose, Event, EventPatch, LOCK_DURATION_SECS,
    MAX_FAILED_LOGINS, MAX_PARTICIPANTS, OneTimeCode, OutboxEvent, Participant,
    validate_date_range,
};
use crate::error::ApiServiceError;

/// Flatten a transaction error: domain errors pass through, connection
/// failures become Internal.
fn unwrap_txn_err(e: TransactionError<ApiServiceError>) -> ApiServiceError {
    match e {
        TransactionError::Connection(e) => {
            ApiServiceError::Internal(anyhow::Error::new(e).context("transaction"))
        }
        TransactionError::Transaction(e) => e,
    }
}

fn is_unique_violation(e: &sea_orm::DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── Account repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiServiceError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find account by email")?;
        model.map(account_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, ApiServiceError> {
        let model = accounts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find account by id")?;
        model.map(account_from_model).transpose()
    }

    async fn create(&self, account: &Account) -> Result<(), ApiServiceError> {
        let result = accounts::ActiveModel {
            id: Set(account.id),
            email: Set(account.email.clone()),
            display_name: Set(account.display_name.clone()),
            password_hash: Set(account.password_hash.clone()),
            status: Set(account.status.wire()),
            failed_logins: Set(account.failed_logins),
            lock_expires_at: Set(account.lock_expires_at),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(ApiServiceError::DuplicateEmail),
            Err(e) => Err(anyhow::Error::new(e).context("create account").into()),
        }
    }

    async fn refresh_unverified(
        &self,
        id: Uuid,
        display_name: &str,
        password_hash: &str,
    ) -> Result<(), ApiServiceError> {
        accounts::ActiveModel {
            id: Set(id),
            display_name: Set(display_name.to_owned()),
            password_hash: Set(password_hash.to_owned()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("refresh unverified account")?;
        Ok(())
    }

    async fn activate(&self, id: Uuid) -> Result<(), ApiServiceError> {
        accounts::ActiveModel {
            id: Set(id),
            status: Set(AccountStatus::Active.wire()),
            failed_logins: Set(0),
            lock_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("activate account")?;
        Ok(())
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<Account, ApiServiceError> {
        // Row lock so concurrent wrong-password attempts each count and the
        // lock trips at exactly the configured threshold.
        self.db
            .transaction::<_, Account, ApiServiceError>(move |txn| {
                Box::pin(async move {
                    let model = accounts::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock account for failed login")?
                        .ok_or(ApiServiceError::AccountNotFound)?;

                    let now = Utc::now();
                    // An elapsed lock restarts the count instead of
                    // immediately re-tripping.
                    let lock_elapsed = AccountStatus::from_wire(model.status)
                        == Some(AccountStatus::Locked)
                        && !model.lock_expires_at.is_some_and(|until| until > now);
                    let failed = if lock_elapsed { 1 } else { model.failed_logins + 1 };

                    let (status, lock_expires_at) = if failed >= MAX_FAILED_LOGINS {
                        (
                            AccountStatus::Locked,
                            Some(now + Duration::seconds(LOCK_DURATION_SECS)),
                        )
                    } else {
                        (AccountStatus::Active, None)
                    };

                    let updated = accounts::ActiveModel {
                        id: Set(id),
                        status: Set(status.wire()),
                        failed_logins: Set(failed),
                        lock_expires_at: Set(lock_expires_at),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .update(txn)
                    .await
                    .context("record failed login")?;

                    account_from_model(updated)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn record_successful_login(&self, id: Uuid) -> Result<(), ApiServiceError> {
        accounts::ActiveModel {
            id: Set(id),
            status: Set(AccountStatus::Active.wire()),
            failed_logins: Set(0),
            lock_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("record successful login")?;
        Ok(())
    }

    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiServiceError> {
        accounts::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_owned()),
            status: Set(AccountStatus::Active.wire()),
            failed_logins: Set(0),
            lock_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("replace password")?;
        Ok(())
    }
}

fn account_from_model(model: accounts::Model) -> Result<Account, ApiServiceError> {
    let status = AccountStatus::from_wire(model.status)
        .ok_or_else(|| anyhow::anyhow!("unknown account status {}", model.status))?;
    Ok(Account {
        id: model.id,
        email: model.email,
        display_name: model.display_name,
        password_hash: model.password_hash,
        status,
        failed_logins: model.failed_logins,
        lock_expires_at: model.lock_expires_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── One-time code repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCodeRepository {
    pub db: DatabaseConnection,
}

impl CodeRepository for DbCodeRepository {
    async fn issue_with_outbox(
        &self,
        code: &OneTimeCode,
        event: &OutboxEvent,
    ) -> Result<(), ApiServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let code = code.clone();
                let event = event.clone();
                Box::pin(async move {
                    // Supersede: at most one live code per (account, purpose).
                    one_time_codes::Entity::update_many()
                        .col_expr(
                            one_time_codes::Column::ConsumedAt,
                            sea_orm::sea_query::Expr::value(Some(Utc::now())),
                        )
                        .filter(one_time_codes::Column::AccountId.eq(code.account_id))
                        .filter(one_time_codes::Column::Purpose.eq(code.purpose.wire()))
                        .filter(one_time_codes::Column::ConsumedAt.is_null())
                        .exec(txn)
                        .await?;

                    insert_one_time_code(txn, &code).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("issue code with outbox")?;
        Ok(())
    }

    async fn find_current(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
    ) -> Result<Option<OneTimeCode>, ApiServiceError> {
        let model = one_time_codes::Entity::find()
            .filter(one_time_codes::Column::AccountId.eq(account_id))
            .filter(one_time_codes::Column::Purpose.eq(purpose.wire()))
            .filter(one_time_codes::Column::ConsumedAt.is_null())
            .order_by_desc(one_time_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find current code")?;
        model.map(code_from_model).transpose()
    }

    async fn matches_retired(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
        presented: &str,
    ) -> Result<bool, ApiServiceError> {
        let count = one_time_codes::Entity::find()
            .filter(one_time_codes::Column::AccountId.eq(account_id))
            .filter(one_time_codes::Column::Purpose.eq(purpose.wire()))
            .filter(one_time_codes::Column::Code.eq(presented))
            .filter(one_time_codes::Column::ConsumedAt.is_not_null())
            .count(&self.db)
            .await
            .context("match retired code")?;
        Ok(count > 0)
    }

    async fn record_attempt(&self, id: Uuid) -> Result<i16, ApiServiceError> {
        // Row lock so parallel wrong guesses cannot share an attempt slot.
        self.db
            .transaction::<_, i16, ApiServiceError>(move |txn| {
                Box::pin(async move {
                    let model = one_time_codes::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock code for attempt")?
                        .ok_or(ApiServiceError::CodeNotFound)?;

                    let attempts = model.attempts + 1;
                    one_time_codes::ActiveModel {
                        id: Set(id),
                        attempts: Set(attempts),
                        ..Default::default()
                    }
                    .update(txn)
                    .await
                    .context("record code attempt")?;
                    Ok(attempts)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn consume(&self, id: Uuid) -> Result<(), ApiServiceError> {
        // Conditional on the row still being live: of two racing
        // redemptions only the first update matches, the other sees zero
        // rows and fails.
        let result = one_time_codes::Entity::update_many()
            .col_expr(
                one_time_codes::Column::ConsumedAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(one_time_codes::Column::Id.eq(id))
            .filter(one_time_codes::Column::ConsumedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume code")?;
        if result.rows_affected == 0 {
            return Err(ApiServiceError::CodeNotFound);
        }
        Ok(())
    }
}

async fn insert_one_time_code(
    txn: &DatabaseTransaction,
    code: &OneTimeCode,
) -> Result<(), sea_orm::DbErr> {
    one_time_codes::ActiveModel {
        id: Set(code.id),
        account_id: Set(code.account_id),
        purpose: Set(code.purpose.wire()),
        code: Set(code.code.clone()),
        attempts: Set(code.attempts),
        expires_at: Set(code.expires_at),
        consumed_at: Set(None),
        created_at: Set(code.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn code_from_model(model: one_time_codes::Model) -> Result<OneTimeCode, ApiServiceError> {
    let purpose = CodePurpose::from_wire(model.purpose)
        .ok_or_else(|| anyhow::anyhow!("unknown code purpose {}", model.purpose))?;
    Ok(OneTimeCode {
        id: model.id,
        account_id: model.account_id,
        purpose,
        code: model.code,
        attempts: model.attempts,
        expires_at: model.expires_at,
        consumed_at: model.consumed_at,
        created_at: model.created_at,
    })
}

// ── Event repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEventRepository {
    pub db: DatabaseConnection,
}

impl EventRepository for DbEventRepository {
    async fn create_with_participants(
        &self,
        event: &Event,
        participant_emails: &[String],
    ) -> Result<(), ApiServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let event = event.clone();
                let emails = participant_emails.to_vec();
                Box::pin(async move {
                    events::ActiveModel {
                        id: Set(event.id),
                        creator_id: Set(event.creator_id),
                        title: Set(event.title.clone()),
                        description: Set(event.description.clone()),
                        starts_at: Set(event.starts_at),
                        ends_at: Set(event.ends_at),
                        created_at: Set(event.created_at),
                        updated_at: Set(event.updated_at),
                    }
                    .insert(txn)
                    .await?;

                    if !emails.is_empty() {
                        let rows = emails.into_iter().map(|email| {
                            event_participants::ActiveModel {
                                event_id: Set(event.id),
                                email: Set(email),
                                created_at: Set(event.created_at),
                            }
                        });
                        event_participants::Entity::insert_many(rows).exec(txn).await?;
                    }
                    Ok(())
                })
            })
            .await
            .context("create event with participants")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiServiceError> {
        let model = events::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find event by id")?;
        Ok(model.map(event_from_model))
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Event>, ApiServiceError> {
        let models = events::Entity::find()
            .filter(events::Column::CreatorId.eq(creator_id))
            .order_by_asc(events::Column::StartsAt)
            .all(&self.db)
            .await
            .context("list events by creator")?;
        Ok(models.into_iter().map(event_from_model).collect())
    }

    async fn list_by_participant_email(
        &self,
        email: &str,
    ) -> Result<Vec<Event>, ApiServiceError> {
        let models = events::Entity::find()
            .inner_join(event_participants::Entity)
            .filter(event_participants::Column::Email.eq(email))
            .order_by_asc(events::Column::StartsAt)
            .all(&self.db)
            .await
            .context("list events by participant")?;
        Ok(models.into_iter().map(event_from_model).collect())
    }

    async fn update(&self, id: Uuid, patch: &EventPatch) -> Result<Event, ApiServiceError> {
        let patch = patch.clone();
        // Lock the row so two overlapping patches cannot each validate one
        // bound of the window and jointly persist end ≤ start.
        self.db
            .transaction::<_, Event, ApiServiceError>(move |txn| {
                Box::pin(async move {
                    let current = events::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock event for update")?
                        .ok_or(ApiServiceError::EventNotFound)?;

                    let starts_at = patch.starts_at.unwrap_or(current.starts_at);
                    let ends_at = patch.ends_at.unwrap_or(current.ends_at);
                    validate_date_range(starts_at, ends_at)?;

                    let mut model = events::ActiveModel {
                        id: Set(id),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    if let Some(title) = &patch.title {
                        model.title = Set(title.trim().to_owned());
                    }
                    if let Some(description) = &patch.description {
                        model.description = Set(description.clone());
                    }
                    if let Some(starts_at) = patch.starts_at {
                        model.starts_at = Set(starts_at);
                    }
                    if let Some(ends_at) = patch.ends_at {
                        model.ends_at = Set(ends_at);
                    }

                    let updated = model.update(txn).await.context("update event")?;
                    Ok(event_from_model(updated))
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiServiceError> {
        let result = events::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete event")?;
        Ok(result.rows_affected > 0)
    }

    async fn list_participants(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Participant>, ApiServiceError> {
        let models = event_participants::Entity::find()
            .filter(event_participants::Column::EventId.eq(event_id))
            .order_by_asc(event_participants::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list participants")?;
        Ok(models.into_iter().map(participant_from_model).collect())
    }

    async fn is_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError> {
        let model = event_participants::Entity::find_by_id((event_id, email.to_owned()))
            .one(&self.db)
            .await
            .context("check participant")?;
        Ok(model.is_some())
    }

    async fn add_participants(
        &self,
        event_id: Uuid,
        emails: &[String],
        now: DateTime<Utc>,
    ) -> Result<(), ApiServiceError> {
        let emails = emails.to_vec();
        // Lock the event row so two overlapping invite batches cannot both
        // pass the capacity check.
        self.db
            .transaction::<_, (), ApiServiceError>(move |txn| {
                Box::pin(async move {
                    events::Entity::find_by_id(event_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock event for invites")?
                        .ok_or(ApiServiceError::EventNotFound)?;

                    let current = event_participants::Entity::find()
                        .filter(event_participants::Column::EventId.eq(event_id))
                        .count(txn)
                        .await
                        .context("count participants")?;
                    if current as usize + emails.len() > MAX_PARTICIPANTS {
                        return Err(ApiServiceError::CapacityExceeded);
                    }

                    let rows = emails.into_iter().map(|email| {
                        event_participants::ActiveModel {
                            event_id: Set(event_id),
                            email: Set(email),
                            created_at: Set(now),
                        }
                    });
                    match event_participants::Entity::insert_many(rows).exec(txn).await {
                        Ok(_) => Ok(()),
                        Err(e) if is_unique_violation(&e) => {
                            Err(ApiServiceError::AlreadyInvited)
                        }
                        Err(e) => Err(anyhow::Error::new(e).context("insert invites").into()),
                    }
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn remove_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError> {
        let result = event_participants::Entity::delete_many()
            .filter(event_participants::Column::EventId.eq(event_id))
            .filter(event_participants::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .context("remove participant")?;
        Ok(result.rows_affected > 0)
    }
}

fn event_from_model(model: events::Model) -> Event {
    Event {
        id: model.id,
        creator_id: model.creator_id,
        title: model.title,
        description: model.description,
        starts_at: model.starts_at,
        ends_at: model.ends_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn participant_from_model(model: event_participants::Model) -> Participant {
    Participant {
        event_id: model.event_id,
        email: model.email,
        created_at: model.created_at,
    }
}
