//! Response parsing, row decoding and result iteration.
//!
//! # Architecture
//!
//! - `response` - Classifies gateway responses (session / error / result)
//! - `rows` - Decodes length-prefixed row values
//! - `results` - Forward-only result cursor
//! - `context` - Deadline and cancellation for exchanges

pub mod context;
pub mod response;
pub mod results;
pub mod rows;

pub use context::{CancelHandle, Context};
pub use response::GatewayResponse;
pub use results::{Cursor, Field, ResultSet};
pub use rows::{decode_row, Row};
