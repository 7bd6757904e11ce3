use chrono::{DateTime, Utc};

use crate::config::BookingConfig;
use crate::error::AgentError;
use crate::models::reservation::BookingOutcome;
use crate::report;
use crate::service::appspace_service::ReservationApi;
use crate::service::conflict::resolve_conflict;
use crate::service::lock_service::acquire_lock;
use crate::service::reservation_service::{CreateResult, create_reservation, find_own_reservation};
use crate::service::token_service::TokenManager;

/// One booking attempt: pre-check, advisory lock, create, and on conflict
/// the ownership re-query. `now` is injected so the whole flow is clockless
/// and drivable from tests.
pub async fn run_booking<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &mut TokenManager,
    config: &BookingConfig,
    now: DateTime<Utc>,
) -> Result<BookingOutcome, AgentError> {
    let window = config.target_window(now);
    if !window.is_weekday() {
        return Ok(BookingOutcome::SkippedWeekend(window.date));
    }

    report::stage(
        "precheck",
        format!("resource={} date={}", config.desk.resource_id, window.date),
    );
    if let Some(existing) =
        find_own_reservation(api, tokens, &config.desk.resource_id, window.date, config.timezone)
            .await?
    {
        return Ok(BookingOutcome::AlreadyBooked(existing));
    }

    match acquire_lock(api, tokens, &config.desk, &window).await {
        Ok(handle) => report::stage("lock", format!("outcome=acquired resource={}", handle.resource_id)),
        Err(failure) => report::warn("lock", format!("outcome=soft-failure {}", failure)),
    }

    match create_reservation(api, tokens, &config.desk, &window).await? {
        CreateResult::Created(record) => Ok(BookingOutcome::Booked(record)),
        CreateResult::Conflict => {
            resolve_conflict(api, tokens, &config.desk, window.date, config.timezone).await
        }
    }
}
