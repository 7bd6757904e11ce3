#![allow(non_snake_case)]

mod cli;

use std::env;
use std::process;

use chrono::Utc;
use clap::Parser;

use deskBot::config::{self, AppConfig, BookingConfig};
use deskBot::error::AgentError;
use deskBot::report;
use deskBot::service::appspace_service::AppspaceService;
use deskBot::service::booking_flow;
use deskBot::service::checkin_service;
use deskBot::service::token_service::TokenManager;

use crate::cli::{Cli, Commands};

// Exit codes consumed by the scheduler: 0 success or benign skip, 1 API or
// transport failure, 2 auth failure, 3 lost booking conflict, 4 check-in
// failure, 5 invalid configuration.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let file_config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    };
    let get_prop = |key: &str| file_config.get(key).or_else(|| env::var(key).ok());

    let code = run(&cli.command, &get_prop).await;
    process::exit(code);
}

async fn run(command: &Commands, get_prop: &impl Fn(&str) -> Option<String>) -> i32 {
    let config = match BookingConfig::load(get_prop) {
        Ok(config) => config,
        Err(err) => return fail("config", &err),
    };
    let credential = match config::load_credential(get_prop) {
        Ok(credential) => credential,
        Err(err) => return fail("config", &err),
    };
    let api = match AppspaceService::new(&config) {
        Ok(api) => api,
        Err(err) => return fail("startup", &err),
    };
    let mut tokens = TokenManager::new(credential);
    let now = Utc::now();

    match command {
        Commands::Book => match booking_flow::run_booking(&api, &mut tokens, &config, now).await {
            Ok(outcome) => {
                report::stage("booking", outcome.summary());
                outcome.exit_code()
            }
            Err(err) => fail("booking", &err),
        },
        Commands::Checkin => {
            match checkin_service::run_checkin(&api, &mut tokens, &config, now).await {
                Ok(outcome) => {
                    report::stage("checkin", outcome.summary());
                    outcome.exit_code()
                }
                Err(err) => fail("checkin", &err),
            }
        }
    }
}

fn fail(stage: &str, err: &AgentError) -> i32 {
    report::warn(stage, format!("outcome=error {}", err));
    err.exit_code()
}
