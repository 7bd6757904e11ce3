use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::AgentError;
use crate::models::reservation::{BookingOutcome, ResourceRef};
use crate::service::appspace_service::ReservationApi;
use crate::service::reservation_service::find_own_reservation;
use crate::service::token_service::TokenManager;

/// Decides what a 409 actually meant. The conflict body is not trusted; the
/// only authority is a fresh read of the actor's own reservations. Finding a
/// record for the attempted (resource, date) means the collision was with
/// the actor's own earlier booking and the run succeeded after all; finding
/// none means another actor holds the slot.
pub async fn resolve_conflict<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &mut TokenManager,
    resource: &ResourceRef,
    date: NaiveDate,
    timezone: Tz,
) -> Result<BookingOutcome, AgentError> {
    match find_own_reservation(api, tokens, &resource.resource_id, date, timezone).await? {
        Some(record) => Ok(BookingOutcome::RecoveredAfterConflict(record)),
        None => Ok(BookingOutcome::Lost { resource_id: resource.resource_id.clone(), date }),
    }
}
