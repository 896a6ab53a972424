//! Connection configuration, credentials and session state.
//!
//! # Example
//!
//! ```
//! # use psdb_rs::connection::{ConnectionBuilder, ConnectionParams};
//! # use std::str::FromStr;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Using ConnectionBuilder
//! let params = ConnectionBuilder::new()
//!     .host("aws.connect.psdb.cloud")
//!     .backend("psdb")
//!     .username("app")
//!     .password("s3cret")
//!     .timeout(std::time::Duration::from_secs(10))
//!     .build()?;
//!
//! // Or parse from a connection string
//! let params = ConnectionParams::from_str(
//!     "username=app&password=s3cret&host=aws.connect.psdb.cloud&backend=psdb"
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod params;
pub mod session;

pub use auth::Credentials;
pub use params::{ConnectionBuilder, ConnectionParams};
pub use session::{Session, SessionManager, SessionState};
