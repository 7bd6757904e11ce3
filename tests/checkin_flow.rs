use std::collections::VecDeque;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use deskBot::config::BookingConfig;
use deskBot::error::AgentError;
use deskBot::models::reservation::{
    CheckInOutcome, Credential, ReservationRecord, ReservationStatus, ResourceRef,
};
use deskBot::models::window::{BookingWindow, DayRange};
use deskBot::service::appspace_service::{
    CheckInReply, CreateReply, EventsReply, LockReply, ReservationApi,
};
use deskBot::service::checkin_service::run_checkin;
use deskBot::service::token_service::TokenManager;

struct FakeApi {
    events: Mutex<VecDeque<Result<EventsReply, AgentError>>>,
    checkins: Mutex<VecDeque<Result<CheckInReply, AgentError>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            checkins: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn script_events(&self, reply: Result<EventsReply, AgentError>) {
        self.events.lock().await.push_back(reply);
    }

    async fn script_checkin(&self, reply: Result<CheckInReply, AgentError>) {
        self.checkins.lock().await.push_back(reply);
    }

    async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ReservationApi for FakeApi {
    async fn refresh_session(&self, credential: &Credential) -> Result<Credential, AgentError> {
        self.calls.lock().await.push("refresh");
        Ok(Credential {
            session_token: "renewed".to_string(),
            refresh_token: credential.refresh_token.clone(),
        })
    }

    async fn own_events(&self, _: &str, _: &DayRange) -> Result<EventsReply, AgentError> {
        self.calls.lock().await.push("events");
        self.events.lock().await.pop_front().expect("unexpected events call")
    }

    async fn lock_resource(
        &self,
        _: &str,
        _: &ResourceRef,
        _: &BookingWindow,
    ) -> Result<LockReply, AgentError> {
        self.calls.lock().await.push("lock");
        panic!("check-in flow must never lock");
    }

    async fn create_reservation(
        &self,
        _: &str,
        _: &ResourceRef,
        _: &BookingWindow,
    ) -> Result<CreateReply, AgentError> {
        self.calls.lock().await.push("create");
        panic!("check-in flow must never create reservations");
    }

    async fn check_in(
        &self,
        _: &str,
        _: &str,
        _: &ResourceRef,
    ) -> Result<CheckInReply, AgentError> {
        self.calls.lock().await.push("checkin");
        self.checkins.lock().await.pop_front().expect("unexpected checkin call")
    }
}

const DESK_ID: &str = "3a1b388a-desk";

fn config() -> BookingConfig {
    let pairs = [
        ("APPSPACE_BASE_URL", "https://svc.example/api/v3"),
        ("APPSPACE_USER_ID", "user-1"),
        ("APPSPACE_USER_NAME", "Ada Example"),
        ("APPSPACE_USER_EMAIL", "ada@example.com"),
        ("DESK_RESOURCE_ID", DESK_ID),
        ("DESK_NAME", "08W-125-G"),
        ("CHECKIN_WINDOW_MINUTES", "30"),
    ];
    let lookup = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    };
    BookingConfig::load(&lookup).expect("fixture config loads")
}

fn tokens() -> TokenManager {
    TokenManager::new(Credential {
        session_token: "session".to_string(),
        refresh_token: Some("refresh".to_string()),
    })
}

// Monday 2026-03-09, reservation starting 09:30 Eastern (13:30 UTC).
fn start_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 13, 30, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn record(status: ReservationStatus) -> ReservationRecord {
    ReservationRecord {
        id: uuid::Uuid::new_v4().to_string(),
        resource_id: DESK_ID.to_string(),
        owner_id: Some("user-1".to_string()),
        date: today(),
        start_at: start_at(),
        end_at: start_at() + Duration::hours(8),
        status,
    }
}

#[tokio::test]
async fn no_reservation_today_fails_without_posting() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(Vec::new()))).await;

    let mut tokens = tokens();
    let outcome = run_checkin(&api, &mut tokens, &config(), start_at())
        .await
        .expect("flow completes");

    match &outcome {
        CheckInOutcome::NoReservation { resource_id, date } => {
            assert_eq!(resource_id, DESK_ID);
            assert_eq!(*date, today());
        }
        other => panic!("expected no-reservation, got {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 4);
    assert_eq!(api.calls().await, vec!["events"]);
}

#[tokio::test]
async fn already_checked_in_is_benign_and_sends_nothing() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::CheckedIn)])))
        .await;

    let mut tokens = tokens();
    let outcome = run_checkin(&api, &mut tokens, &config(), start_at())
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::AlreadyCheckedIn(_)));
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(api.calls().await, vec!["events"]);
}

#[tokio::test]
async fn checks_in_exactly_at_the_early_edge() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;
    api.script_checkin(Ok(CheckInReply::Accepted)).await;

    let mut tokens = tokens();
    let now = start_at() - Duration::minutes(30);
    let outcome = run_checkin(&api, &mut tokens, &config(), now)
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::CheckedIn(_)));
    assert_eq!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn checks_in_exactly_at_the_late_edge() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;
    api.script_checkin(Ok(CheckInReply::Accepted)).await;

    let mut tokens = tokens();
    let now = start_at() + Duration::minutes(30);
    let outcome = run_checkin(&api, &mut tokens, &config(), now)
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::CheckedIn(_)));
}

#[tokio::test]
async fn one_second_before_the_window_is_too_early_with_no_post() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;

    let mut tokens = tokens();
    let now = start_at() - Duration::minutes(30) - Duration::seconds(1);
    let outcome = run_checkin(&api, &mut tokens, &config(), now)
        .await
        .expect("flow completes");

    match &outcome {
        CheckInOutcome::TooEarly { starts_at } => assert_eq!(*starts_at, start_at()),
        other => panic!("expected too-early, got {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 4);
    assert_eq!(api.calls().await, vec!["events"]);
}

#[tokio::test]
async fn one_second_after_the_window_is_too_late_with_no_post() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;

    let mut tokens = tokens();
    let now = start_at() + Duration::minutes(30) + Duration::seconds(1);
    let outcome = run_checkin(&api, &mut tokens, &config(), now)
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::TooLate { .. }));
    assert_eq!(api.calls().await, vec!["events"]);
}

#[tokio::test]
async fn server_side_window_rejection_maps_against_start_time() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;
    api.script_checkin(Ok(CheckInReply::OutsideWindow { body: "too soon".to_string() })).await;

    let mut tokens_early = tokens();
    let now = start_at() - Duration::minutes(10);
    let outcome = run_checkin(&api, &mut tokens_early, &config(), now)
        .await
        .expect("flow completes");
    assert!(matches!(outcome, CheckInOutcome::TooEarly { .. }));

    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;
    api.script_checkin(Ok(CheckInReply::OutsideWindow { body: "too late".to_string() })).await;

    let mut tokens = tokens();
    let now = start_at() + Duration::minutes(10);
    let outcome = run_checkin(&api, &mut tokens, &config(), now)
        .await
        .expect("flow completes");
    assert!(matches!(outcome, CheckInOutcome::TooLate { .. }));
}

#[tokio::test]
async fn unauthorized_checkin_refreshes_once_and_retries() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Active)]))).await;
    api.script_checkin(Ok(CheckInReply::Unauthorized)).await;
    api.script_checkin(Ok(CheckInReply::Accepted)).await;

    let mut tokens = tokens();
    let outcome = run_checkin(&api, &mut tokens, &config(), start_at())
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::CheckedIn(_)));
    assert_eq!(api.calls().await, vec!["events", "checkin", "refresh", "checkin"]);
}

#[tokio::test]
async fn cancelled_reservation_counts_as_absent() {
    let api = FakeApi::new();
    api.script_events(Ok(EventsReply::Events(vec![record(ReservationStatus::Cancelled)]))).await;

    let mut tokens = tokens();
    let outcome = run_checkin(&api, &mut tokens, &config(), start_at())
        .await
        .expect("flow completes");

    assert!(matches!(outcome, CheckInOutcome::NoReservation { .. }));
}
