//! JSON message types for the gateway HTTP API.
//!
//! Requests are serialized with serde. Responses are read in two steps: the
//! envelope first, keeping `result` as raw JSON, so that an `error` member
//! is handled before anything inside `result` is looked at.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Versioned path prefix of the gateway API.
pub const API_PREFIX: &str = "/psdb.v1alpha1.Database";

/// Session creation endpoint.
pub const SESSION_ENDPOINT: &str = "/psdb.v1alpha1.Database/CreateSession";

/// Query execution endpoint.
pub const EXECUTE_ENDPOINT: &str = "/psdb.v1alpha1.Database/Execute";

/// Body of a session creation request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSessionRequest {}

/// Body of an execute request.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest<'a> {
    /// SQL text
    pub query: &'a str,
    /// Current session, replayed verbatim
    pub session: &'a RawValue,
}

impl<'a> ExecuteRequest<'a> {
    /// Create a new execute request.
    pub fn new(query: &'a str, session: &'a RawValue) -> Self {
        Self { query, session }
    }
}

/// Top-level response envelope shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    /// Rotated or newly created session
    #[serde(default)]
    pub session: Option<Box<RawValue>>,
    /// Application error
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Result set, parsed only when no error is present
    #[serde(default)]
    pub result: Option<Box<RawValue>>,
}

/// Result set body.
#[derive(Debug, Deserialize)]
pub struct ResultData {
    /// Column metadata
    #[serde(default)]
    pub fields: Option<Vec<FieldInfo>>,
    /// Encoded rows
    #[serde(default)]
    pub rows: Option<Vec<RowData>>,
}

/// Column metadata as sent by the gateway.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldInfo {
    /// Column name
    pub name: String,
    /// Declared type tag
    #[serde(rename = "type")]
    pub type_name: String,
    /// Originating table
    pub table: String,
    /// Column length
    pub column_length: u64,
    /// Character set id
    pub charset: u64,
    /// Flags bitmask
    pub flags: u64,
}

/// One encoded row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RowData {
    /// Base64 of all column values concatenated
    pub values: String,
    /// Decimal byte counts, one per column
    pub lengths: Vec<String>,
}
