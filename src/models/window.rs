use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::AgentError;

/// The slot the agent tries to reserve: a local-time window on one calendar
/// date in the configured zone. All wire traffic is UTC; the conversion
/// happens here and nowhere else.
#[derive(Debug, Clone)]
pub struct BookingWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub timezone: Tz,
}

impl BookingWindow {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime, timezone: Tz) -> Self {
        Self { date, start, end, timezone }
    }

    /// The date `lead_days` ahead of "today", where today is read off the
    /// clock in the configured zone, not in UTC.
    pub fn target_date(now: DateTime<Utc>, timezone: Tz, lead_days: i64) -> NaiveDate {
        now.with_timezone(&timezone).date_naive() + chrono::Duration::days(lead_days)
    }

    pub fn is_weekday(&self) -> bool {
        !matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn start_utc(&self) -> Result<DateTime<Utc>, AgentError> {
        local_to_utc(self.date, self.start, self.timezone)
    }

    pub fn end_utc(&self) -> Result<DateTime<Utc>, AgentError> {
        local_to_utc(self.date, self.end, self.timezone)
    }

    pub fn day_range(&self) -> Result<DayRange, AgentError> {
        DayRange::for_date(self.date, self.timezone)
    }
}

/// UTC bracket of one local calendar day, used as the events query range.
#[derive(Debug, Clone)]
pub struct DayRange {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl DayRange {
    pub fn for_date(date: NaiveDate, timezone: Tz) -> Result<Self, AgentError> {
        let start = local_to_utc(date, NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default(), timezone)?;
        let end = local_to_utc(
            date,
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default(),
            timezone,
        )?;
        Ok(Self { start_at: start, end_at: end })
    }
}

/// The timestamp form the service expects: ISO 8601 with milliseconds.
pub fn to_wire(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, timezone: Tz) -> Result<DateTime<Utc>, AgentError> {
    // earliest() resolves fall-back ambiguity; spring-forward gaps have no
    // local representation at all and fail the run.
    timezone
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AgentError::Config(format!("{} {} does not exist in {}", date, time, timezone))
        })
}
