//! Driver factory.
//!
//! This module provides the `Driver` type which contains metadata about the
//! psdb-rs driver and serves as a factory for creating `Connection` instances.
//! Nothing is registered globally; the embedding application constructs the
//! driver and opens connections through it.

use std::collections::HashMap;
use std::str::FromStr;

use crate::connection::ConnectionParams;
use crate::driver::Connection;
use crate::error::PsdbError;
use crate::transport::{HttpTransport, Transport};

/// Driver for HTTP/JSON database gateways.
///
/// # Example
///
/// ```
/// use psdb_rs::Driver;
///
/// let driver = Driver::new();
/// println!("Driver: {} v{}", driver.name(), driver.version());
/// assert!(driver.validate_connection_string("host=db.example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct Driver {
    /// Driver name
    name: String,
    /// Driver version
    version: String,
    /// Vendor name
    vendor: String,
    /// Driver description
    description: String,
    /// Backend name to origin, applied to every HTTP transport it creates
    backends: HashMap<String, String>,
}

impl Driver {
    /// Create a new Driver instance.
    ///
    /// ```
    /// use psdb_rs::Driver;
    ///
    /// let driver = Driver::new();
    /// assert_eq!(driver.name(), "psdb-rs");
    /// ```
    pub fn new() -> Self {
        Self {
            name: "psdb-rs".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            vendor: "psdb-rs contributors".to_string(),
            description: "SQL driver for HTTP/JSON database gateways".to_string(),
            backends: HashMap::new(),
        }
    }

    /// Get the driver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the driver version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the vendor name.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Get the driver description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Route a named backend to a specific origin, e.g. `https://10.0.0.5:443`.
    ///
    /// Connections whose `backend` parameter matches `name` dial `origin`
    /// while still sending the configured host in the `Host` header.
    pub fn with_backend(mut self, name: &str, origin: &str) -> Self {
        self.backends.insert(name.to_string(), origin.to_string());
        self
    }

    /// Open a connection over HTTP.
    ///
    /// No request is sent until the first query.
    ///
    /// # Arguments
    ///
    /// * `dsn` - Query-string DSN, e.g.
    ///   `username=u&password=p&host=db.example.com&backend=psdb`
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the DSN is invalid, `TransportError` if
    /// the HTTP client cannot be initialized.
    pub fn open(&self, dsn: &str) -> Result<Connection, PsdbError> {
        let params = ConnectionParams::from_str(dsn)?;

        let transport = self
            .backends
            .iter()
            .fold(HttpTransport::from_params(&params)?, |transport, (name, origin)| {
                transport.with_backend(name, origin)
            });

        tracing::debug!(host = %params.host, backend = %params.backend, "opened connection");
        Ok(Connection::with_transport(params, Box::new(transport)))
    }

    /// Open a connection over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the DSN is invalid.
    pub fn open_with_transport(
        &self,
        dsn: &str,
        transport: Box<dyn Transport>,
    ) -> Result<Connection, PsdbError> {
        let params = ConnectionParams::from_str(dsn)?;
        Ok(Connection::with_transport(params, transport))
    }

    /// Check if a DSN is valid without opening anything.
    pub fn validate_connection_string(&self, dsn: &str) -> bool {
        ConnectionParams::from_str(dsn).is_ok()
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.vendor)
    }
}
