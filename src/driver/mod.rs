//! Driver interface.
//!
//! # Architecture
//!
//! - `Driver` - Driver metadata and factory for connections
//! - `Connection` - Session-holding connection that executes queries
//!
//! Prepared statements and transactions are not supported; the corresponding
//! `Connection` methods fail with `QueryError::NotImplemented` and never touch
//! the network.

pub mod connection;
#[allow(clippy::module_inception)]
pub mod driver;

pub use connection::{Connection, USER_AGENT};
pub use driver::Driver;
