use chrono::{DateTime, Utc};

use crate::config::BookingConfig;
use crate::error::AgentError;
use crate::models::reservation::{CheckInOutcome, ReservationStatus};
use crate::service::appspace_service::{CheckInReply, ReservationApi};
use crate::service::reservation_service::find_own_reservation;
use crate::service::token_service::TokenManager;

/// Confirms attendance for today's reservation. The window gate runs
/// client-side before any POST: check-in proceeds iff
/// `start - window <= now <= start + window`, inclusive at both edges.
/// A server-side "outside window" rejection is mapped the same way, by
/// comparing `now` against the reservation start.
pub async fn run_checkin<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &mut TokenManager,
    config: &BookingConfig,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, AgentError> {
    let today = config.today(now);
    let Some(record) =
        find_own_reservation(api, tokens, &config.desk.resource_id, today, config.timezone).await?
    else {
        return Ok(CheckInOutcome::NoReservation {
            resource_id: config.desk.resource_id.clone(),
            date: today,
        });
    };

    if record.status == ReservationStatus::CheckedIn {
        return Ok(CheckInOutcome::AlreadyCheckedIn(record));
    }

    if now < record.start_at - config.checkin_window {
        return Ok(CheckInOutcome::TooEarly { starts_at: record.start_at });
    }
    if now > record.start_at + config.checkin_window {
        return Ok(CheckInOutcome::TooLate { started_at: record.start_at });
    }

    match api.check_in(tokens.session_token(), &record.id, &config.desk).await? {
        CheckInReply::Accepted => Ok(CheckInOutcome::CheckedIn(record)),
        CheckInReply::OutsideWindow { .. } => {
            if now < record.start_at {
                Ok(CheckInOutcome::TooEarly { starts_at: record.start_at })
            } else {
                Ok(CheckInOutcome::TooLate { started_at: record.start_at })
            }
        }
        CheckInReply::Unauthorized => {
            tokens.refresh(api).await?;
            match api.check_in(tokens.session_token(), &record.id, &config.desk).await? {
                CheckInReply::Accepted => Ok(CheckInOutcome::CheckedIn(record)),
                CheckInReply::OutsideWindow { .. } => {
                    if now < record.start_at {
                        Ok(CheckInOutcome::TooEarly { starts_at: record.start_at })
                    } else {
                        Ok(CheckInOutcome::TooLate { started_at: record.start_at })
                    }
                }
                CheckInReply::Unauthorized => Err(AgentError::Auth(
                    "check-in rejected the refreshed token".to_string(),
                )),
            }
        }
    }
}
