//! Transport protocol abstraction trait.
//!
//! This module defines the `Transport` trait that abstracts the HTTP client
//! delivering requests to the gateway. The connection builds complete
//! requests; a transport only moves bytes and reports the status code.

use crate::error::TransportError;
use async_trait::async_trait;

/// HTTP method used for every gateway exchange.
pub const GATEWAY_METHOD: &str = "POST";

/// A fully-formed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: String,
    /// Absolute request target
    pub url: String,
    /// Header name/value pairs, in insertion order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a POST request with no headers.
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: GATEWAY_METHOD.to_string(),
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Get the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the body, or an error carrying status and body for non-2xx responses.
    pub fn into_success_body(self) -> Result<Vec<u8>, TransportError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TransportError::HttpStatus {
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// Transport trait for gateway communication.
///
/// Implementations deliver a request to the named backend and return the
/// status and body. They do not interpret either.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request.
    ///
    /// # Arguments
    ///
    /// * `backend` - Name of the backend to dial
    /// * `request` - Complete request, headers included
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on network failure.
    async fn send(&self, backend: &str, request: HttpRequest)
        -> Result<HttpResponse, TransportError>;
}
