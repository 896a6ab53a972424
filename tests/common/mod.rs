//! Common test utilities for psdb-rs integration tests.
//!
//! # Scripted transport
//!
//! [`ScriptedTransport`] replays canned HTTP responses in order and records
//! every request it receives, so tests can drive a `Connection` end to end
//! without a network.
//!
//! # Live gateway
//!
//! Live tests read their configuration from the environment:
//!
//! | Environment Variable | Default Value |
//! |----------------------|---------------|
//! | `PSDB_HOST`          | (required)    |
//! | `PSDB_USERNAME`      | ""            |
//! | `PSDB_PASSWORD`      | ""            |
//! | `PSDB_BACKEND`       | ""            |
//!
//! Live tests are marked `#[ignore]` and additionally skip themselves when
//! `PSDB_HOST` is unset:
//!
//! ```bash
//! PSDB_HOST=aws.connect.psdb.cloud PSDB_USERNAME=... PSDB_PASSWORD=... \
//!   cargo test --test integration_tests -- --ignored
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use psdb_rs::{Connection, Driver, HttpRequest, HttpResponse, PsdbError, Transport, TransportError};
use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex};

// ============================================================================
// Environment Variable Names
// ============================================================================

const ENV_PSDB_HOST: &str = "PSDB_HOST";
const ENV_PSDB_USERNAME: &str = "PSDB_USERNAME";
const ENV_PSDB_PASSWORD: &str = "PSDB_PASSWORD";
const ENV_PSDB_BACKEND: &str = "PSDB_BACKEND";

// ============================================================================
// Configuration Helpers
// ============================================================================

/// Gateway host from `PSDB_HOST`, if set and non-empty.
pub fn get_host() -> Option<String> {
    env::var(ENV_PSDB_HOST).ok().filter(|h| !h.is_empty())
}

pub fn get_username() -> String {
    env::var(ENV_PSDB_USERNAME).unwrap_or_default()
}

pub fn get_password() -> String {
    env::var(ENV_PSDB_PASSWORD).unwrap_or_default()
}

pub fn get_backend() -> String {
    env::var(ENV_PSDB_BACKEND).unwrap_or_default()
}

/// Check if a live gateway is configured.
pub fn is_gateway_configured() -> bool {
    get_host().is_some()
}

/// Build a DSN for the configured gateway.
///
/// Components are percent-encoded, so credentials may contain `&` or `=`.
pub fn get_test_dsn() -> Option<String> {
    let host = get_host()?;
    Some(format!(
        "username={}&password={}&host={}&backend={}",
        urlencoding::encode(&get_username()),
        urlencoding::encode(&get_password()),
        urlencoding::encode(&host),
        urlencoding::encode(&get_backend()),
    ))
}

/// Open a connection to the configured gateway.
pub fn get_test_connection() -> Result<Connection, PsdbError> {
    let dsn = get_test_dsn().unwrap_or_default();
    Driver::new().open(&dsn)
}

/// Skip a test if no live gateway is configured.
#[macro_export]
macro_rules! skip_if_no_gateway {
    () => {
        if !$crate::common::is_gateway_configured() {
            eprintln!("Skipping test: PSDB_HOST is not set");
            return;
        }
    };
}

// ============================================================================
// Scripted Transport
// ============================================================================

#[derive(Default)]
struct Script {
    responses: VecDeque<Result<HttpResponse, TransportError>>,
    requests: Vec<(String, HttpRequest)>,
}

/// Transport that answers from a fixed script and records requests.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    /// Queue a `200 OK` response with the given body.
    pub fn ok(self, body: &str) -> Self {
        self.respond(200, body)
    }

    /// Queue a transport failure.
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: Result<HttpResponse, TransportError>) -> Self {
        self.script.lock().unwrap().responses.push_back(response);
        self
    }

    /// Requests received so far, with the backend each was sent to.
    pub fn requests(&self) -> Vec<(String, HttpRequest)> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Bodies of the requests received so far, as UTF-8.
    pub fn request_bodies(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|(_, request)| String::from_utf8(request.body).unwrap())
            .collect()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().responses.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, backend: &str, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push((backend.to_string(), request));
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::RequestFailed("script exhausted".to_string())))
    }
}
