use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use gatherly_api::domain::repository::{AccountRepository, CodeRepository, EventRepository};
use gatherly_api::domain::types::{
    Account, AccountStatus, CodePurpose, Event, EventPatch, LOCK_DURATION_SECS,
    MAX_FAILED_LOGINS, MAX_PARTICIPANTS, OTP_TTL_SECS, OneTimeCode, OutboxEvent, Participant,
};
use gatherly_api::error::ApiServiceError;

/// Low bcrypt cost so the suite stays fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn hash(password: &str) -> String {
    bcrypt::hash(password, TEST_BCRYPT_COST).unwrap()
}

pub fn active_account(email: &str, password: &str) -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::now_v7(),
        email: email.to_owned(),
        display_name: "Test Account".to_owned(),
        password_hash: hash(password),
        status: AccountStatus::Active,
        failed_logins: 0,
        lock_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn unverified_account(email: &str, password: &str) -> Account {
    Account {
        status: AccountStatus::Unverified,
        ..active_account(email, password)
    }
}

pub fn live_code(account_id: Uuid, purpose: CodePurpose, code: &str) -> OneTimeCode {
    let now = Utc::now();
    OneTimeCode {
        id: Uuid::now_v7(),
        account_id,
        purpose,
        code: code.to_owned(),
        attempts: 0,
        expires_at: now + Duration::seconds(OTP_TTL_SECS),
        consumed_at: None,
        created_at: now,
    }
}

pub fn test_event(creator_id: Uuid, title: &str) -> Event {
    let now = Utc::now();
    Event {
        id: Uuid::now_v7(),
        creator_id,
        title: title.to_owned(),
        description: None,
        starts_at: now + Duration::hours(1),
        ends_at: now + Duration::hours(2),
        created_at: now,
        updated_at: now,
    }
}

// ── MockAccountRepo ──────────────────────────────────────────────────────────

/// In-memory account store mirroring the DB repository's lockout behavior.
#[derive(Clone)]
pub struct MockAccountRepo {
    pub accounts: Arc<Mutex<Vec<Account>>>,
}

impl MockAccountRepo {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(accounts)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().unwrap().iter().find(|a| a.id == id).cloned()
    }

    pub fn get_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }
}

impl AccountRepository for MockAccountRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiServiceError> {
        Ok(self.get_by_email(email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, ApiServiceError> {
        Ok(self.get(id))
    }

    async fn create(&self, account: &Account) -> Result<(), ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(ApiServiceError::DuplicateEmail);
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn refresh_unverified(
        &self,
        id: Uuid,
        display_name: &str,
        password_hash: &str,
    ) -> Result<(), ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.display_name = display_name.to_owned();
            a.password_hash = password_hash.to_owned();
            a.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn activate(&self, id: Uuid) -> Result<(), ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.status = AccountStatus::Active;
            a.failed_logins = 0;
            a.lock_expires_at = None;
        }
        Ok(())
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<Account, ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        let a = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ApiServiceError::AccountNotFound)?;
        let now = Utc::now();
        let lock_elapsed = a.status == AccountStatus::Locked
            && !a.lock_expires_at.is_some_and(|until| until > now);
        a.failed_logins = if lock_elapsed { 1 } else { a.failed_logins + 1 };
        if a.failed_logins >= MAX_FAILED_LOGINS {
            a.status = AccountStatus::Locked;
            a.lock_expires_at = Some(now + Duration::seconds(LOCK_DURATION_SECS));
        } else {
            a.status = AccountStatus::Active;
            a.lock_expires_at = None;
        }
        Ok(a.clone())
    }

    async fn record_successful_login(&self, id: Uuid) -> Result<(), ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.status = AccountStatus::Active;
            a.failed_logins = 0;
            a.lock_expires_at = None;
        }
        Ok(())
    }

    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), ApiServiceError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(a) = accounts.iter_mut().find(|a| a.id == id) {
            a.password_hash = password_hash.to_owned();
            a.status = AccountStatus::Active;
            a.failed_logins = 0;
            a.lock_expires_at = None;
        }
        Ok(())
    }
}

// ── MockCodeRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockCodeRepo {
    pub codes: Arc<Mutex<Vec<OneTimeCode>>>,
    pub outbox: Arc<Mutex<Vec<OutboxEvent>>>,
}

impl MockCodeRepo {
    pub fn new(codes: Vec<OneTimeCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
            outbox: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn live(&self, account_id: Uuid, purpose: CodePurpose) -> Option<OneTimeCode> {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.account_id == account_id && c.purpose == purpose && c.consumed_at.is_none())
            .cloned()
    }

    pub fn outbox_kinds(&self) -> Vec<String> {
        self.outbox.lock().unwrap().iter().map(|e| e.kind.clone()).collect()
    }
}

impl CodeRepository for MockCodeRepo {
    async fn issue_with_outbox(
        &self,
        code: &OneTimeCode,
        event: &OutboxEvent,
    ) -> Result<(), ApiServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let now = Utc::now();
        for c in codes.iter_mut() {
            if c.account_id == code.account_id
                && c.purpose == code.purpose
                && c.consumed_at.is_none()
            {
                c.consumed_at = Some(now);
            }
        }
        codes.push(code.clone());
        self.outbox.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn find_current(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
    ) -> Result<Option<OneTimeCode>, ApiServiceError> {
        Ok(self.live(account_id, purpose))
    }

    async fn matches_retired(
        &self,
        account_id: Uuid,
        purpose: CodePurpose,
        presented: &str,
    ) -> Result<bool, ApiServiceError> {
        Ok(self.codes.lock().unwrap().iter().any(|c| {
            c.account_id == account_id
                && c.purpose == purpose
                && c.code == presented
                && c.consumed_at.is_some()
        }))
    }

    async fn record_attempt(&self, id: Uuid) -> Result<i16, ApiServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let c = codes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiServiceError::CodeNotFound)?;
        c.attempts += 1;
        Ok(c.attempts)
    }

    async fn consume(&self, id: Uuid) -> Result<(), ApiServiceError> {
        // Only a still-live row can be consumed, matching the conditional
        // update in the database repository.
        let mut codes = self.codes.lock().unwrap();
        let c = codes
            .iter_mut()
            .find(|c| c.id == id && c.consumed_at.is_none())
            .ok_or(ApiServiceError::CodeNotFound)?;
        c.consumed_at = Some(Utc::now());
        Ok(())
    }
}

// ── MockEventRepo ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockEventRepo {
    pub events: Arc<Mutex<Vec<Event>>>,
    pub participants: Arc<Mutex<Vec<Participant>>>,
}

impl MockEventRepo {
    pub fn new(events: Vec<Event>, participants: Vec<Participant>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
            participants: Arc::new(Mutex::new(participants)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![], vec![])
    }

    pub fn with_participants(event: Event, emails: &[&str]) -> Self {
        let now = Utc::now();
        let participants = emails
            .iter()
            .map(|email| Participant {
                event_id: event.id,
                email: (*email).to_owned(),
                created_at: now,
            })
            .collect();
        Self::new(vec![event], participants)
    }

    pub fn participant_emails(&self, event_id: Uuid) -> Vec<String> {
        self.participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.event_id == event_id)
            .map(|p| p.email.clone())
            .collect()
    }
}

impl EventRepository for MockEventRepo {
    async fn create_with_participants(
        &self,
        event: &Event,
        participant_emails: &[String],
    ) -> Result<(), ApiServiceError> {
        self.events.lock().unwrap().push(event.clone());
        let mut participants = self.participants.lock().unwrap();
        for email in participant_emails {
            participants.push(Participant {
                event_id: event.id,
                email: email.clone(),
                created_at: event.created_at,
            });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiServiceError> {
        Ok(self.events.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Event>, ApiServiceError> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.creator_id == creator_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn list_by_participant_email(
        &self,
        email: &str,
    ) -> Result<Vec<Event>, ApiServiceError> {
        let invited: Vec<Uuid> = self
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.email == email)
            .map(|p| p.event_id)
            .collect();
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| invited.contains(&e.id))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn update(&self, id: Uuid, patch: &EventPatch) -> Result<Event, ApiServiceError> {
        let mut events = self.events.lock().unwrap();
        let e = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ApiServiceError::EventNotFound)?;
        // Revalidate the merged window against the stored row, like the
        // locked transaction in the database repository.
        let starts_at = patch.starts_at.unwrap_or(e.starts_at);
        let ends_at = patch.ends_at.unwrap_or(e.ends_at);
        if ends_at <= starts_at {
            return Err(ApiServiceError::InvalidDateRange);
        }
        if let Some(title) = &patch.title {
            e.title = title.trim().to_owned();
        }
        if let Some(description) = &patch.description {
            e.description = description.clone();
        }
        if let Some(starts_at) = patch.starts_at {
            e.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            e.ends_at = ends_at;
        }
        e.updated_at = Utc::now();
        Ok(e.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiServiceError> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        let deleted = events.len() < before;
        if deleted {
            self.participants.lock().unwrap().retain(|p| p.event_id != id);
        }
        Ok(deleted)
    }

    async fn list_participants(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Participant>, ApiServiceError> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn is_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError> {
        Ok(self
            .participants
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.event_id == event_id && p.email == email))
    }

    async fn add_participants(
        &self,
        event_id: Uuid,
        emails: &[String],
        now: DateTime<Utc>,
    ) -> Result<(), ApiServiceError> {
        if !self.events.lock().unwrap().iter().any(|e| e.id == event_id) {
            return Err(ApiServiceError::EventNotFound);
        }
        let mut participants = self.participants.lock().unwrap();
        let current = participants.iter().filter(|p| p.event_id == event_id).count();
        if current + emails.len() > MAX_PARTICIPANTS {
            return Err(ApiServiceError::CapacityExceeded);
        }
        // All-or-nothing, like the unique-key-guarded batch insert.
        if emails.iter().any(|email| {
            participants
                .iter()
                .any(|p| p.event_id == event_id && &p.email == email)
        }) {
            return Err(ApiServiceError::AlreadyInvited);
        }
        for email in emails {
            participants.push(Participant {
                event_id,
                email: email.clone(),
                created_at: now,
            });
        }
        Ok(())
    }

    async fn remove_participant(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<bool, ApiServiceError> {
        let mut participants = self.participants.lock().unwrap();
        let before = participants.len();
        participants.retain(|p| !(p.event_id == event_id && p.email == email));
        Ok(participants.len() < before)
    }
}
