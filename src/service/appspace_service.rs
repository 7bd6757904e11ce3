use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::clients::appspace_client;
use crate::config::{BookingConfig, UserIdentity};
use crate::error::AgentError;
use crate::models::reservation::{Credential, LockHandle, ReservationRecord, ResourceRef};
use crate::models::window::{BookingWindow, DayRange};

#[derive(Debug)]
pub enum EventsReply {
    Events(Vec<ReservationRecord>),
    Unauthorized,
}

#[derive(Debug)]
pub enum CreateReply {
    Created(ReservationRecord),
    /// 409. Ambiguous until the conflict resolver re-queries ownership.
    Conflict { body: String },
    Unauthorized,
}

#[derive(Debug)]
pub enum LockReply {
    Locked(LockHandle),
    /// Any non-2xx, including 409 "already locked" and 401.
    Rejected { status: u16, body: String },
}

#[derive(Debug)]
pub enum CheckInReply {
    Accepted,
    OutsideWindow { body: String },
    Unauthorized,
}

/// The wire seam. Flows only ever talk to this trait; tests substitute
/// scripted fakes for the HTTP-backed implementation below.
#[async_trait]
pub trait ReservationApi: Send + Sync {
    async fn refresh_session(&self, credential: &Credential) -> Result<Credential, AgentError>;

    async fn own_events(
        &self,
        session_token: &str,
        range: &DayRange,
    ) -> Result<EventsReply, AgentError>;

    async fn lock_resource(
        &self,
        session_token: &str,
        resource: &ResourceRef,
        window: &BookingWindow,
    ) -> Result<LockReply, AgentError>;

    async fn create_reservation(
        &self,
        session_token: &str,
        resource: &ResourceRef,
        window: &BookingWindow,
    ) -> Result<CreateReply, AgentError>;

    async fn check_in(
        &self,
        session_token: &str,
        reservation_id: &str,
        resource: &ResourceRef,
    ) -> Result<CheckInReply, AgentError>;
}

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct AppspaceService {
    base_url: String,
    timezone: Tz,
    identity: UserIdentity,
    http: reqwest::Client,
}

impl AppspaceService {
    pub fn new(config: &BookingConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            timezone: config.timezone,
            identity: config.identity.clone(),
            http,
        })
    }
}

#[async_trait]
impl ReservationApi for AppspaceService {
    async fn refresh_session(&self, credential: &Credential) -> Result<Credential, AgentError> {
        appspace_client::refresh_session(&self.http, &self.base_url, self.timezone, credential)
            .await
    }

    async fn own_events(
        &self,
        session_token: &str,
        range: &DayRange,
    ) -> Result<EventsReply, AgentError> {
        appspace_client::fetch_own_events(
            &self.http,
            &self.base_url,
            self.timezone,
            session_token,
            range,
        )
        .await
    }

    async fn lock_resource(
        &self,
        session_token: &str,
        resource: &ResourceRef,
        window: &BookingWindow,
    ) -> Result<LockReply, AgentError> {
        appspace_client::lock_resource(
            &self.http,
            &self.base_url,
            self.timezone,
            session_token,
            resource,
            window,
        )
        .await
    }

    async fn create_reservation(
        &self,
        session_token: &str,
        resource: &ResourceRef,
        window: &BookingWindow,
    ) -> Result<CreateReply, AgentError> {
        appspace_client::create_reservation(
            &self.http,
            &self.base_url,
            self.timezone,
            session_token,
            &self.identity,
            resource,
            window,
        )
        .await
    }

    async fn check_in(
        &self,
        session_token: &str,
        reservation_id: &str,
        resource: &ResourceRef,
    ) -> Result<CheckInReply, AgentError> {
        appspace_client::check_in(
            &self.http,
            &self.base_url,
            self.timezone,
            session_token,
            reservation_id,
            resource,
        )
        .await
    }
}
