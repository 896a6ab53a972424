//! # psdb-rs
//!
//! Async SQL driver for database gateways that speak an HTTP/JSON
//! request-response protocol with opaque session tokens.
//!
//! Every query is a `POST` of `{"query": ..., "session": ...}` to the gateway's
//! `Execute` endpoint, authenticated with HTTP Basic credentials. The gateway
//! hands back a (possibly rotated) session token with each response, and the
//! driver replays the latest one verbatim on the next call. Result rows arrive
//! as one base64 blob per row plus a list of decimal value lengths; they are
//! decoded eagerly into byte values and exposed through a forward-only cursor.
//!
//! ## Example
//!
//! ```no_run
//! # use psdb_rs::*;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create driver and open a connection (no request is sent yet)
//! let driver = Driver::new();
//! let mut connection =
//!     driver.open("username=app&password=s3cret&host=db.example.com&backend=psdb")?;
//!
//! // The first query creates the session
//! let mut results = connection.query("SELECT id, name FROM users").await?;
//! println!("columns: {:?}", results.columns());
//!
//! let mut row = vec![Vec::new(); results.column_count()];
//! while results.next(&mut row).is_ok() {
//!     println!("{}", String::from_utf8_lossy(&row[0]));
//! }
//!
//! // Bound a query by a deadline
//! let ctx = Context::with_timeout(std::time::Duration::from_secs(5));
//! connection.query_context(&ctx, "SELECT 1").await?;
//!
//! connection.close()?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod connection;
pub mod driver;
pub mod error;
pub mod query;
pub mod transport;

// Re-export public API
pub use connection::{ConnectionBuilder, ConnectionParams, Session};
pub use driver::{Connection, Driver};
pub use error::{
    ConnectionError, ErrorKind, ProtocolError, PsdbError, QueryError, TransportError,
};
pub use query::{CancelHandle, Context, Cursor, Field, ResultSet, Row};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
