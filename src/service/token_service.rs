use crate::error::AgentError;
use crate::models::reservation::Credential;
use crate::report;
use crate::service::appspace_service::ReservationApi;

/// Sole owner of the credential for the run. The token is assumed valid
/// until a call answers 401; `refresh` then swaps it in place, at most once
/// per run. A 401 after that means the refreshed token is no good either
/// and only an operator can fix it.
pub struct TokenManager {
    credential: Credential,
    refreshed: bool,
}

impl TokenManager {
    pub fn new(credential: Credential) -> Self {
        Self { credential, refreshed: false }
    }

    pub fn session_token(&self) -> &str {
        &self.credential.session_token
    }

    pub async fn refresh<A: ReservationApi + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<(), AgentError> {
        if self.refreshed {
            return Err(AgentError::Auth(
                "session token rejected again after refresh".to_string(),
            ));
        }
        if self.credential.refresh_token.is_none() {
            return Err(AgentError::Auth(
                "session token expired and no refresh token is configured".to_string(),
            ));
        }
        self.credential = api.refresh_session(&self.credential).await?;
        self.refreshed = true;
        report::stage("auth", "outcome=token-refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reservation::{LockHandle, ResourceRef};
    use crate::models::window::{BookingWindow, DayRange};
    use crate::service::appspace_service::{CheckInReply, CreateReply, EventsReply, LockReply};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RefreshOnlyApi {
        refresh_calls: AtomicUsize,
    }

    #[async_trait]
    impl ReservationApi for RefreshOnlyApi {
        async fn refresh_session(&self, credential: &Credential) -> Result<Credential, AgentError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credential {
                session_token: "renewed".to_string(),
                refresh_token: credential.refresh_token.clone(),
            })
        }

        async fn own_events(&self, _: &str, _: &DayRange) -> Result<EventsReply, AgentError> {
            Ok(EventsReply::Events(Vec::new()))
        }

        async fn lock_resource(
            &self,
            _: &str,
            _: &ResourceRef,
            _: &BookingWindow,
        ) -> Result<LockReply, AgentError> {
            Ok(LockReply::Locked(LockHandle { resource_id: String::new(), expires_at: None }))
        }

        async fn create_reservation(
            &self,
            _: &str,
            _: &ResourceRef,
            _: &BookingWindow,
        ) -> Result<CreateReply, AgentError> {
            Ok(CreateReply::Conflict { body: String::new() })
        }

        async fn check_in(
            &self,
            _: &str,
            _: &str,
            _: &ResourceRef,
        ) -> Result<CheckInReply, AgentError> {
            Ok(CheckInReply::Accepted)
        }
    }

    #[tokio::test]
    async fn refresh_swaps_token_once_then_refuses() {
        let api = RefreshOnlyApi { refresh_calls: AtomicUsize::new(0) };
        let mut tokens = TokenManager::new(Credential {
            session_token: "stale".to_string(),
            refresh_token: Some("refresh".to_string()),
        });

        tokens.refresh(&api).await.expect("first refresh succeeds");
        assert_eq!(tokens.session_token(), "renewed");

        let err = tokens.refresh(&api).await.unwrap_err();
        assert!(matches!(err, AgentError::Auth(_)));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_is_auth_failure() {
        let api = RefreshOnlyApi { refresh_calls: AtomicUsize::new(0) };
        let mut tokens = TokenManager::new(Credential {
            session_token: "stale".to_string(),
            refresh_token: None,
        });

        let err = tokens.refresh(&api).await.unwrap_err();
        assert!(matches!(err, AgentError::Auth(_)));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }
}
