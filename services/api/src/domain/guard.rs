use uuid::Uuid;

use crate::domain::types::Event;
use crate::error::ApiServiceError;

/// Action attempted against an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// View the event or its participant list.
    Read,
    /// Edit, delete, or manage participants. Creator only.
    Mutate,
}

/// Ownership check for event access.
///
/// Non-participants are told the event does not exist rather than that it
/// is off-limits, so event IDs cannot be probed. A participant attempting
/// a mutation has already proven the event exists, so they get `Forbidden`.
pub fn authorize(
    action: EventAction,
    caller_id: Uuid,
    event: &Event,
    caller_is_participant: bool,
) -> Result<(), ApiServiceError> {
    if caller_id == event.creator_id {
        return Ok(());
    }
    match (action, caller_is_participant) {
        (EventAction::Read, true) => Ok(()),
        (EventAction::Mutate, true) => Err(ApiServiceError::Forbidden),
        (_, false) => Err(ApiServiceError::EventNotFound),
    }
}
