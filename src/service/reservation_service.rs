use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::AgentError;
use crate::models::reservation::{ReservationRecord, ReservationStatus, ResourceRef};
use crate::models::window::{BookingWindow, DayRange};
use crate::service::appspace_service::{CreateReply, EventsReply, ReservationApi};
use crate::service::token_service::TokenManager;

/// The actor's reservation for (resource, date), if any. Serves both as the
/// pre-booking idempotency check and as the ownership oracle after a 409.
/// Cancelled records never count.
pub async fn find_own_reservation<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &mut TokenManager,
    resource_id: &str,
    date: NaiveDate,
    timezone: Tz,
) -> Result<Option<ReservationRecord>, AgentError> {
    let range = DayRange::for_date(date, timezone)?;
    let records = match api.own_events(tokens.session_token(), &range).await? {
        EventsReply::Events(records) => records,
        EventsReply::Unauthorized => {
            tokens.refresh(api).await?;
            match api.own_events(tokens.session_token(), &range).await? {
                EventsReply::Events(records) => records,
                EventsReply::Unauthorized => {
                    return Err(AgentError::Auth(
                        "events query rejected the refreshed token".to_string(),
                    ));
                }
            }
        }
    };
    Ok(records.into_iter().find(|record| {
        record.resource_id == resource_id
            && record.date == date
            && record.status != ReservationStatus::Cancelled
    }))
}

#[derive(Debug)]
pub enum CreateResult {
    Created(ReservationRecord),
    Conflict,
}

/// Submits the reservation. A 401 gets one token refresh and one resend;
/// a 409 is returned to the caller undecided.
pub async fn create_reservation<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &mut TokenManager,
    resource: &ResourceRef,
    window: &BookingWindow,
) -> Result<CreateResult, AgentError> {
    match api.create_reservation(tokens.session_token(), resource, window).await? {
        CreateReply::Created(record) => Ok(CreateResult::Created(record)),
        CreateReply::Conflict { body } => {
            crate::report::warn("create", format!("outcome=conflict body={}", body.trim()));
            Ok(CreateResult::Conflict)
        }
        CreateReply::Unauthorized => {
            tokens.refresh(api).await?;
            match api.create_reservation(tokens.session_token(), resource, window).await? {
                CreateReply::Created(record) => Ok(CreateResult::Created(record)),
                CreateReply::Conflict { body } => {
                    crate::report::warn("create", format!("outcome=conflict body={}", body.trim()));
                    Ok(CreateResult::Conflict)
                }
                CreateReply::Unauthorized => Err(AgentError::Auth(
                    "reservation request rejected the refreshed token".to_string(),
                )),
            }
        }
    }
}
