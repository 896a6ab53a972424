//! Connection parameter parsing and validation.
//!
//! This module handles parsing query-string shaped connection strings and
//! building connection parameters with validation.

use crate::error::ConnectionError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default request timeout applied by the HTTP transport.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for the request timeout.
const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection parameters for a gateway connection.
#[derive(Clone)]
pub struct ConnectionParams {
    /// Gateway host, used for the request target and the `Host` header
    pub host: String,

    /// Name of the backend the transport dials
    pub backend: String,

    /// Username for authentication
    pub username: String,

    /// Password for authentication (stored securely)
    password: String,

    /// Request timeout
    pub timeout: Duration,

    /// Build `https://` targets when true, `http://` otherwise
    pub use_tls: bool,

    /// Unrecognized connection string keys
    pub attributes: HashMap<String, String>,
}

impl ConnectionParams {
    /// Get the password (for internal use only, never logged).
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Create a new ConnectionBuilder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// URL scheme for request targets.
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Build the request target for a gateway endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}://{}{}", self.scheme(), self.host, endpoint)
    }
}

impl FromStr for ConnectionParams {
    type Err = ConnectionError;

    /// Parse a connection string in the format:
    /// `username=<user>&password=<pass>&host=<host>&backend=<backend>[&timeout=<secs>][&tls=<bool>]`
    ///
    /// # Examples
    ///
    /// ```
    /// # use psdb_rs::connection::ConnectionParams;
    /// # use std::str::FromStr;
    /// let params = ConnectionParams::from_str(
    ///     "username=app&password=s3cret&host=db.example.com&backend=gateway"
    /// )?;
    /// assert_eq!(params.host, "db.example.com");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let query = s.trim();
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut params = parse_query_params(query)?;

        let mut builder = ConnectionBuilder::new();
        if let Some(host) = params.remove("host") {
            builder = builder.host(&host);
        }
        if let Some(username) = params.remove("username") {
            builder = builder.username(&username);
        }
        if let Some(password) = params.remove("password") {
            builder = builder.password(&password);
        }
        if let Some(backend) = params.remove("backend") {
            builder = builder.backend(&backend);
        }

        builder = apply_query_params(builder, params)?;

        builder.build()
    }
}

// Prevent password from being displayed in debug or display output
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("backend", &self.backend)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("use_tls", &self.use_tls)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionParams {{ host: {}, backend: {}, username: {}, use_tls: {} }}",
            self.host, self.backend, self.username, self.use_tls
        )
    }
}

/// Builder for constructing ConnectionParams with validation.
#[derive(Debug, Clone, Default)]
pub struct ConnectionBuilder {
    host: Option<String>,
    backend: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
    use_tls: Option<bool>,
    attributes: HashMap<String, String>,
}

impl ConnectionBuilder {
    /// Create a new ConnectionBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway host.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the backend name.
    pub fn backend(mut self, backend: &str) -> Self {
        self.backend = Some(backend.to_string());
        self
    }

    /// Set the username.
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS.
    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = Some(use_tls);
        self
    }

    /// Add a custom connection attribute.
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Build the ConnectionParams with validation.
    pub fn build(self) -> Result<ConnectionParams, ConnectionError> {
        let host = self.host.ok_or_else(|| ConnectionError::InvalidParameter {
            parameter: "host".to_string(),
            message: "Host is required".to_string(),
        })?;

        if host.is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "host".to_string(),
                message: "Host cannot be empty".to_string(),
            });
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() || timeout > MAX_TIMEOUT {
            return Err(ConnectionError::InvalidParameter {
                parameter: "timeout".to_string(),
                message: format!(
                    "Timeout must be between 1 and {} seconds",
                    MAX_TIMEOUT.as_secs()
                ),
            });
        }

        Ok(ConnectionParams {
            host,
            backend: self.backend.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            timeout,
            use_tls: self.use_tls.unwrap_or(true),
            attributes: self.attributes,
        })
    }
}

/// Parse a form-encoded query string. The first occurrence of a key wins.
fn parse_query_params(query: &str) -> Result<HashMap<String, String>, ConnectionError> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        if pair.contains(';') {
            return Err(ConnectionError::ParseError(format!(
                "Invalid semicolon separator in: {}",
                pair
            )));
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;

        params.entry(key).or_insert(value);
    }

    Ok(params)
}

/// Percent-decode one query component, treating `+` as a space.
fn decode_component(raw: &str) -> Result<String, ConnectionError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(raw.len());
                return Err(ConnectionError::ParseError(format!(
                    "Invalid URL escape: {}",
                    raw.get(i..end).unwrap_or(&raw[i..])
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| ConnectionError::ParseError(format!("Failed to decode component: {}", e)))
}

/// Apply the remaining query parameters to builder.
fn apply_query_params(
    mut builder: ConnectionBuilder,
    params: HashMap<String, String>,
) -> Result<ConnectionBuilder, ConnectionError> {
    for (key, value) in params {
        match key.as_str() {
            "timeout" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ConnectionError::InvalidParameter {
                        parameter: key.clone(),
                        message: format!("Invalid timeout value: {}", value),
                    })?;
                builder = builder.timeout(Duration::from_secs(secs));
            }
            "tls" => {
                let use_tls = parse_bool(&key, &value)?;
                builder = builder.use_tls(use_tls);
            }
            _ => {
                builder = builder.attribute(&key, &value);
            }
        }
    }

    Ok(builder)
}

/// Parse boolean value from string.
fn parse_bool(key: &str, s: &str) -> Result<bool, ConnectionError> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConnectionError::InvalidParameter {
            parameter: key.to_string(),
            message: format!("Invalid boolean value: {}", s),
        }),
    }
}
