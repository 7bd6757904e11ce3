use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::UserIdentity;
use crate::error::AgentError;
use crate::models::reservation::{
    Credential, LockHandle, ReservationRecord, ReservationStatus, ResourceRef,
};
use crate::models::window::{BookingWindow, DayRange, to_wire};
use crate::service::appspace_service::{CheckInReply, CreateReply, EventsReply, LockReply};

// Wire shapes for the facility-booking service. Field names follow its
// camelCase JSON; everything stays private to this module.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    session_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventItem {
    id: String,
    #[serde(default)]
    event_status: Option<String>,
    #[serde(default)]
    start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    resources: Vec<EventResource>,
    #[serde(default)]
    organizer: Option<EventOrganizer>,
}

#[derive(Debug, Deserialize)]
struct EventResource {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EventOrganizer {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LockRequest<'a> {
    resource_ids: Vec<&'a str>,
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationRequest<'a> {
    resource_ids: Vec<&'a str>,
    effective_start_at: String,
    effective_end_at: String,
    organizer: WireOrganizer<'a>,
    sensitivity: &'a str,
    organizer_availability_type: &'a str,
    attendees: Vec<WireAttendee<'a>>,
    visitors: Vec<serde_json::Value>,
    visit_purpose: &'a str,
    is_all_day: bool,
    start_time_zone: &'a str,
    end_time_zone: &'a str,
}

#[derive(Debug, Serialize)]
struct WireOrganizer<'a> {
    id: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAttendee<'a> {
    display_name: &'a str,
    email: &'a str,
    resource_ids: Vec<&'a str>,
    attendance_type: &'a str,
    user_id: &'a str,
    id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationResponse {
    id: String,
    #[serde(default)]
    start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckInRequest<'a> {
    resource_ids: Vec<&'a str>,
}

pub async fn refresh_session(
    http: &Client,
    base_url: &str,
    timezone: Tz,
    credential: &Credential,
) -> Result<Credential, AgentError> {
    let refresh_token = credential
        .refresh_token
        .as_deref()
        .ok_or_else(|| AgentError::Auth("no refresh token available".to_string()))?;

    let response = authed(
        http,
        Method::POST,
        &format!("{}/authorization/token", base_url),
        &credential.session_token,
        timezone,
    )
    .json(&RefreshRequest { refresh_token })
    .send()
    .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        // Any rejection here means the credentials need replacing outside
        // this process; there is nothing left to retry against.
        return Err(AgentError::Auth(format!(
            "token refresh rejected with status {}: {}",
            status.as_u16(),
            text
        )));
    }
    let parsed: RefreshResponse = parse_body(status, &text)?;
    Ok(Credential {
        session_token: parsed.session_token,
        refresh_token: parsed.refresh_token.or_else(|| credential.refresh_token.clone()),
    })
}

pub async fn fetch_own_events(
    http: &Client,
    base_url: &str,
    timezone: Tz,
    session_token: &str,
    range: &DayRange,
) -> Result<EventsReply, AgentError> {
    let start_at = to_wire(range.start_at);
    let end_at = to_wire(range.end_at);
    let response = authed(
        http,
        Method::GET,
        &format!("{}/reservation/users/me/events", base_url),
        session_token,
        timezone,
    )
    .query(&[
        ("sort", "startAt"),
        ("status", "NotConfirmed, Pending, Checkin, Active, Conflict, Completed"),
        ("includesourceobject", "true"),
        ("startAt", start_at.as_str()),
        ("endAt", end_at.as_str()),
        ("page", "1"),
        ("start", "0"),
        ("limit", "20"),
        ("pagecount", "20"),
    ])
    .send()
    .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Ok(EventsReply::Unauthorized);
    }
    let text = response.text().await?;
    if !status.is_success() {
        return Err(AgentError::Api { status: status.as_u16(), body: text });
    }
    let page: EventsPage = parse_body(status, &text)?;
    Ok(EventsReply::Events(map_events(page, timezone)))
}

pub async fn lock_resource(
    http: &Client,
    base_url: &str,
    timezone: Tz,
    session_token: &str,
    resource: &ResourceRef,
    window: &BookingWindow,
) -> Result<LockReply, AgentError> {
    let payload = LockRequest {
        resource_ids: vec![resource.resource_id.as_str()],
        from: to_wire(window.start_utc()?),
        to: to_wire(window.end_utc()?),
    };
    let response = authed(
        http,
        Method::POST,
        &format!("{}/reservation/locks/resources", base_url),
        session_token,
        timezone,
    )
    .json(&payload)
    .send()
    .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(LockReply::Locked(LockHandle {
            resource_id: resource.resource_id.clone(),
            expires_at: None,
        }));
    }
    let body = response.text().await.unwrap_or_default();
    Ok(LockReply::Rejected { status: status.as_u16(), body })
}

pub async fn create_reservation(
    http: &Client,
    base_url: &str,
    timezone: Tz,
    session_token: &str,
    identity: &UserIdentity,
    resource: &ResourceRef,
    window: &BookingWindow,
) -> Result<CreateReply, AgentError> {
    let start_at = window.start_utc()?;
    let end_at = window.end_utc()?;
    let payload = CreateReservationRequest {
        resource_ids: vec![resource.resource_id.as_str()],
        effective_start_at: to_wire(start_at),
        effective_end_at: to_wire(end_at),
        organizer: WireOrganizer { id: &identity.user_id, name: &identity.display_name },
        sensitivity: "Public",
        organizer_availability_type: "Busy",
        attendees: vec![WireAttendee {
            display_name: &identity.display_name,
            email: &identity.email,
            resource_ids: vec![resource.resource_id.as_str()],
            attendance_type: "InPerson",
            user_id: &identity.user_id,
            id: &identity.user_id,
        }],
        visitors: Vec::new(),
        visit_purpose: "",
        is_all_day: false,
        start_time_zone: timezone.name(),
        end_time_zone: timezone.name(),
    };

    let response = authed(
        http,
        Method::POST,
        &format!("{}/reservation/reservations", base_url),
        session_token,
        timezone,
    )
    .json(&payload)
    .send()
    .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Ok(CreateReply::Unauthorized);
    }
    let text = response.text().await?;
    if status == StatusCode::CONFLICT {
        return Ok(CreateReply::Conflict { body: text });
    }
    if !status.is_success() {
        return Err(AgentError::Api { status: status.as_u16(), body: text });
    }
    let parsed: CreateReservationResponse = parse_body(status, &text)?;
    Ok(CreateReply::Created(ReservationRecord {
        id: parsed.id,
        resource_id: resource.resource_id.clone(),
        owner_id: Some(identity.user_id.clone()),
        date: window.date,
        start_at: parsed.start_at.unwrap_or(start_at),
        end_at: parsed.end_at.unwrap_or(end_at),
        status: ReservationStatus::Active,
    }))
}

pub async fn check_in(
    http: &Client,
    base_url: &str,
    timezone: Tz,
    session_token: &str,
    reservation_id: &str,
    resource: &ResourceRef,
) -> Result<CheckInReply, AgentError> {
    let response = authed(
        http,
        Method::POST,
        &format!("{}/reservation/events/{}/checkin", base_url, reservation_id),
        session_token,
        timezone,
    )
    .json(&CheckInRequest { resource_ids: vec![resource.resource_id.as_str()] })
    .send()
    .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Ok(CheckInReply::Unauthorized);
    }
    if status.is_success() {
        return Ok(CheckInReply::Accepted);
    }
    let body = response.text().await?;
    if status == StatusCode::BAD_REQUEST {
        return Ok(CheckInReply::OutsideWindow { body });
    }
    Err(AgentError::Api { status: status.as_u16(), body })
}

fn request(http: &Client, method: Method, url: &str) -> RequestBuilder {
    http.request(method, url)
        .header("Accept", "application/json, text/plain, */*")
}

fn authed(
    http: &Client,
    method: Method,
    url: &str,
    session_token: &str,
    timezone: Tz,
) -> RequestBuilder {
    request(http, method, url)
        .header("token", session_token)
        .header("x-appspace-request-timezone", timezone.name())
}

fn parse_body<T: serde::de::DeserializeOwned>(
    status: StatusCode,
    text: &str,
) -> Result<T, AgentError> {
    serde_json::from_str(text).map_err(|e| AgentError::Api {
        status: status.as_u16(),
        body: format!("unparseable body: {} ({})", e, text),
    })
}

fn map_events(page: EventsPage, timezone: Tz) -> Vec<ReservationRecord> {
    let mut records = Vec::new();
    for item in page.items {
        // Events without times cannot be matched against a target date.
        let (Some(start_at), Some(end_at)) = (item.start_at, item.end_at) else {
            continue;
        };
        let status = item
            .event_status
            .as_deref()
            .map(ReservationStatus::from_event_status)
            .unwrap_or(ReservationStatus::Active);
        let owner_id = item.organizer.as_ref().and_then(|o| o.id.clone());
        for resource in &item.resources {
            records.push(ReservationRecord {
                id: item.id.clone(),
                resource_id: resource.id.clone(),
                owner_id: owner_id.clone(),
                date: start_at.with_timezone(&timezone).date_naive(),
                start_at,
                end_at,
                status,
            });
        }
    }
    records
}
