//! Sea-ORM entities for the Gatherly api service.

pub mod accounts;
pub mod event_participants;
pub mod events;
pub mod one_time_codes;
pub mod outbox_events;
