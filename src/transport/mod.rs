//! Transport layer for gateway communication.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - Transport trait and raw HTTP request/response types
//! - `messages` - JSON message types and endpoint paths
//! - `http` - reqwest-backed transport implementation
//!
//! # Example
//!
//! ```no_run
//! use psdb_rs::transport::{HttpRequest, HttpTransport, Transport};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(Duration::from_secs(10))?
//!     .with_backend("origin", "https://10.0.0.5");
//!
//! let request = HttpRequest::post("https://db.example.com/health", Vec::new())
//!     .with_header("Host", "db.example.com");
//! let response = transport.send("origin", request).await?;
//! println!("status: {}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod messages;
pub mod protocol;

// Re-export commonly used types
pub use http::HttpTransport;
pub use messages::{FieldInfo, RowData, EXECUTE_ENDPOINT, SESSION_ENDPOINT};
pub use protocol::{HttpRequest, HttpResponse, Transport};
