use std::collections::HashMap;
use std::fs;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::AgentError;
use crate::models::reservation::{Credential, ResourceRef};
use crate::models::window::BookingWindow;

/// Key=value overrides loaded from an optional CONFIG_FILE. Environment
/// variables fill in anything the file does not set.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// The actor on whose behalf reservations are made. The service wants the
/// organizer and attendee blocks spelled out even for a self-booking.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
}

/// Everything a run needs besides credentials. Built once at startup from
/// the config-file/environment lookup and passed by reference after that.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub base_url: String,
    pub timezone: Tz,
    pub desk: ResourceRef,
    pub identity: UserIdentity,
    pub lead_days: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub checkin_window: Duration,
}

const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_LEAD_DAYS: i64 = 7;
const DEFAULT_BOOKING_START: &str = "09:30";
const DEFAULT_BOOKING_END: &str = "17:30";
const DEFAULT_CHECKIN_WINDOW_MINUTES: i64 = 30;

impl BookingConfig {
    pub fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, AgentError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| AgentError::Config(format!("{} is not set", key)))
        };

        let timezone: Tz = lookup("TIMEZONE")
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
            .parse()
            .map_err(|e| AgentError::Config(format!("TIMEZONE: {}", e)))?;

        let lead_days = match lookup("LEAD_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AgentError::Config(format!("LEAD_DAYS is not a number: {}", raw)))?,
            None => DEFAULT_LEAD_DAYS,
        };

        let checkin_minutes = match lookup("CHECKIN_WINDOW_MINUTES") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                AgentError::Config(format!("CHECKIN_WINDOW_MINUTES is not a number: {}", raw))
            })?,
            None => DEFAULT_CHECKIN_WINDOW_MINUTES,
        };

        let mut base_url = required("APPSPACE_BASE_URL")?;
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            base_url,
            timezone,
            desk: ResourceRef {
                resource_id: required("DESK_RESOURCE_ID")?,
                name: required("DESK_NAME")?,
                location: lookup("DESK_LOCATION").unwrap_or_default(),
            },
            identity: UserIdentity {
                user_id: required("APPSPACE_USER_ID")?,
                display_name: required("APPSPACE_USER_NAME")?,
                email: required("APPSPACE_USER_EMAIL")?,
            },
            lead_days,
            start_time: parse_time("BOOKING_START", lookup("BOOKING_START"), DEFAULT_BOOKING_START)?,
            end_time: parse_time("BOOKING_END", lookup("BOOKING_END"), DEFAULT_BOOKING_END)?,
            checkin_window: Duration::minutes(checkin_minutes),
        })
    }

    /// The window the next booking run aims at.
    pub fn target_window(&self, now: DateTime<Utc>) -> BookingWindow {
        let date = BookingWindow::target_date(now, self.timezone, self.lead_days);
        BookingWindow::new(date, self.start_time, self.end_time, self.timezone)
    }

    pub fn today(&self, now: DateTime<Utc>) -> chrono::NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

pub fn load_credential(lookup: &impl Fn(&str) -> Option<String>) -> Result<Credential, AgentError> {
    let session_token = lookup("APPSPACE_SESSION_TOKEN")
        .ok_or_else(|| AgentError::Config("APPSPACE_SESSION_TOKEN is not set".to_string()))?;
    Ok(Credential { session_token, refresh_token: lookup("APPSPACE_REFRESH_TOKEN") })
}

fn parse_time(key: &str, raw: Option<String>, default: &str) -> Result<NaiveTime, AgentError> {
    let raw = raw.unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|_| AgentError::Config(format!("{} is not an HH:MM time: {}", key, raw)))
}
