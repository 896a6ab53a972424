//! Authentication handling for gateway connections.
//!
//! This module provides secure credential management and the HTTP Basic
//! authorization header sent with every exchange.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use std::sync::Arc;

/// Secure credentials container.
///
/// This struct ensures credentials are never accidentally logged or displayed.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Arc<SecureString>,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password: Arc::new(SecureString::new(password)),
        }
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password (for internal use only).
    pub(crate) fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Build the `Authorization` header value.
    ///
    /// The value is recomputed on every call so nothing derived from the
    /// password outlives the request it was built for.
    ///
    /// ```
    /// use psdb_rs::connection::Credentials;
    ///
    /// let creds = Credentials::new("u".to_string(), "p".to_string());
    /// assert_eq!(creds.authorization_header(), "Basic dTpw");
    /// ```
    pub fn authorization_header(&self) -> String {
        let mut raw = Vec::with_capacity(self.username.len() + 1 + self.password().len());
        raw.extend_from_slice(self.username.as_bytes());
        raw.push(b':');
        raw.extend_from_slice(self.password().as_bytes());

        let encoded = BASE64.encode(&raw);
        raw.iter_mut().for_each(|b| *b = 0);

        format!("Basic {}", encoded)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials(username: {})", self.username)
    }
}

/// Secure string that zeros memory on drop and never displays its contents.
struct SecureString {
    data: String,
}

impl SecureString {
    fn new(s: String) -> Self {
        Self { data: s }
    }

    fn as_str(&self) -> &str {
        &self.data
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        // Overwrite with NUL bytes, which keeps the buffer valid UTF-8
        let len = self.data.len();
        self.data.clear();
        self.data.extend(std::iter::repeat('\0').take(len));
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(<redacted>)")
    }
}
