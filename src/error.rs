use thiserror::Error;

/// Faults that terminate a run. Booking/check-in outcomes that are merely
/// unsuccessful (lost conflict, outside the check-in window) are not errors;
/// they travel through the `Ok` channel as outcome values.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AgentError {
    // Exit codes are part of the scheduler contract: the trigger that runs
    // this process alerts on them, so each class keeps a stable code.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::Api { .. } | AgentError::Transport(_) => 1,
            AgentError::Auth(_) => 2,
            AgentError::Config(_) => 5,
        }
    }
}
