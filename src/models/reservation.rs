use chrono::{DateTime, NaiveDate, Utc};

/// Session credentials for the booking service. Owned by the token manager
/// for the lifetime of the run and never written anywhere.
#[derive(Debug, Clone)]
pub struct Credential {
    pub session_token: String,
    pub refresh_token: Option<String>,
}

/// The configured desk. Immutable for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    pub resource_id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Booked, check-in still outstanding.
    Active,
    CheckedIn,
    Cancelled,
}

impl ReservationStatus {
    /// Collapses the service's event statuses into the three states the
    /// agent acts on. The service reports "Active" only once the attendee
    /// has checked in; before that the event sits in "Pending"/"Checkin".
    pub fn from_event_status(raw: &str) -> Self {
        match raw {
            "Active" | "Completed" => ReservationStatus::CheckedIn,
            "Cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Active,
        }
    }
}

/// One reservation as seen through the events endpoint, reduced to the
/// fields the agent compares on.
#[derive(Debug, Clone)]
pub struct ReservationRecord {
    pub id: String,
    pub resource_id: String,
    pub owner_id: Option<String>,
    /// Calendar date in the configured zone, derived from `start_at`.
    pub date: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

/// Advisory lock marker. The client never releases it; the service expires
/// it on its own.
#[derive(Debug, Clone)]
pub struct LockHandle {
    pub resource_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A lock that could not be taken. Never fatal.
#[derive(Debug)]
pub struct LockFailure {
    pub status: Option<u16>,
    pub detail: String,
}

impl std::fmt::Display for LockFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status={} {}", status, self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

/// Terminal state of one booking run.
#[derive(Debug)]
pub enum BookingOutcome {
    Booked(ReservationRecord),
    /// Pre-check found the desk already held by the actor; nothing was sent.
    AlreadyBooked(ReservationRecord),
    /// Creation conflicted but the follow-up ownership query showed the
    /// actor holds the slot after all.
    RecoveredAfterConflict(ReservationRecord),
    /// Creation conflicted and the slot belongs to someone else.
    Lost { resource_id: String, date: NaiveDate },
    SkippedWeekend(NaiveDate),
}

impl BookingOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            BookingOutcome::Booked(_)
            | BookingOutcome::AlreadyBooked(_)
            | BookingOutcome::RecoveredAfterConflict(_)
            | BookingOutcome::SkippedWeekend(_) => 0,
            BookingOutcome::Lost { .. } => 3,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            BookingOutcome::Booked(r) => {
                format!("outcome=booked id={} resource={} date={}", r.id, r.resource_id, r.date)
            }
            BookingOutcome::AlreadyBooked(r) => {
                format!("outcome=already-booked id={} resource={} date={}", r.id, r.resource_id, r.date)
            }
            BookingOutcome::RecoveredAfterConflict(r) => format!(
                "outcome=recovered-after-conflict id={} resource={} date={}",
                r.id, r.resource_id, r.date
            ),
            BookingOutcome::Lost { resource_id, date } => {
                format!("outcome=lost resource={} date={}", resource_id, date)
            }
            BookingOutcome::SkippedWeekend(date) => {
                format!("outcome=skipped-weekend date={}", date)
            }
        }
    }
}

/// Terminal state of one check-in run.
#[derive(Debug)]
pub enum CheckInOutcome {
    CheckedIn(ReservationRecord),
    AlreadyCheckedIn(ReservationRecord),
    NoReservation { resource_id: String, date: NaiveDate },
    TooEarly { starts_at: DateTime<Utc> },
    TooLate { started_at: DateTime<Utc> },
}

impl CheckInOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckInOutcome::CheckedIn(_) | CheckInOutcome::AlreadyCheckedIn(_) => 0,
            CheckInOutcome::NoReservation { .. }
            | CheckInOutcome::TooEarly { .. }
            | CheckInOutcome::TooLate { .. } => 4,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            CheckInOutcome::CheckedIn(r) => {
                format!("outcome=checked-in id={} resource={}", r.id, r.resource_id)
            }
            CheckInOutcome::AlreadyCheckedIn(r) => {
                format!("outcome=already-checked-in id={} resource={}", r.id, r.resource_id)
            }
            CheckInOutcome::NoReservation { resource_id, date } => {
                format!("outcome=no-reservation resource={} date={}", resource_id, date)
            }
            CheckInOutcome::TooEarly { starts_at } => {
                format!("outcome=too-early starts_at={}", starts_at.to_rfc3339())
            }
            CheckInOutcome::TooLate { started_at } => {
                format!("outcome=too-late started_at={}", started_at.to_rfc3339())
            }
        }
    }
}
