use crate::models::reservation::{LockFailure, LockHandle, ResourceRef};
use crate::models::window::BookingWindow;
use crate::service::appspace_service::{LockReply, ReservationApi};
use crate::service::token_service::TokenManager;

/// Advisory lock ahead of creation. Narrows the race window with other
/// actors; the authoritative conflict check is still the creation response.
/// Every failure mode, transport included, comes back as a soft
/// `LockFailure` for the caller to log and walk past.
pub async fn acquire_lock<A: ReservationApi + ?Sized>(
    api: &A,
    tokens: &TokenManager,
    resource: &ResourceRef,
    window: &BookingWindow,
) -> Result<LockHandle, LockFailure> {
    match api.lock_resource(tokens.session_token(), resource, window).await {
        Ok(LockReply::Locked(handle)) => Ok(handle),
        Ok(LockReply::Rejected { status, body }) => {
            Err(LockFailure { status: Some(status), detail: body })
        }
        Err(err) => Err(LockFailure { status: None, detail: err.to_string() }),
    }
}
