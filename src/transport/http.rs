//! HTTP transport implementation backed by reqwest.
//!
//! Backends are named origins. A request addressed to a registered backend
//! is dialed to that origin with its path and headers untouched, so the
//! `Host` header still names the gateway. Requests for unknown backends go
//! to the request URL itself.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;

use crate::connection::ConnectionParams;
use crate::error::TransportError;

use super::protocol::{HttpRequest, HttpResponse, Transport};

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// Backend name to origin (`scheme://authority`)
    backends: HashMap<String, String>,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            backends: HashMap::new(),
        })
    }

    /// Create a transport configured from connection parameters.
    pub fn from_params(params: &ConnectionParams) -> Result<Self, TransportError> {
        Self::new(params.timeout)
    }

    /// Register a named backend origin such as `https://10.0.0.5:443`.
    pub fn with_backend(mut self, name: &str, origin: &str) -> Self {
        self.backends.insert(
            name.to_string(),
            origin.trim_end_matches('/').to_string(),
        );
        self
    }

    /// Resolve the URL actually dialed for a request.
    pub fn resolve_url(&self, backend: &str, url: &str) -> String {
        match self.backends.get(backend) {
            Some(origin) => format!("{}{}", origin, path_of(url)),
            None => url.to_string(),
        }
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header {}: {}", name, e)))?;
            map.append(name, value);
        }
        Ok(map)
    }
}

/// Path and query of an absolute URL, or `/` when there is none.
fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match after_scheme.find('/') {
        Some(pos) => &after_scheme[pos..],
        None => "/",
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        backend: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let url = self.resolve_url(backend, &request.url);
        let headers = Self::header_map(&request.headers)?;

        let response = self
            .client
            .request(method, &url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::ReadBody(e.to_string()))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
