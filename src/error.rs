//! Error types for psdb-rs.
//!
//! This module defines domain-specific error types organized by functional area.

use std::fmt;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum PsdbError {
    /// Configuration errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Query and capability errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Malformed or incomplete gateway responses
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Network and HTTP errors
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors related to connection configuration.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },
}

/// Errors related to query execution and the result cursor.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The gateway reported an error for the query
    #[error("Query execution failed: {0}")]
    Server(String),

    /// The gateway reported an error without a message
    #[error("unknown error")]
    UnknownError,

    /// The operation is not supported by this driver
    #[error("{operation} method not implemented")]
    NotImplemented { operation: &'static str },

    /// The cursor has consumed every row
    #[error("End of result set")]
    EndOfData,

    /// Destination buffer does not match the column count
    #[error("Destination has {actual} slots but the result has {expected} columns")]
    DestinationLength { expected: usize, actual: usize },
}

/// Errors raised while interpreting gateway responses.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Response body is not valid JSON
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    /// Session creation returned no session object
    #[error("missing session")]
    MissingSession,

    /// Execute response carried neither an error nor a result
    #[error("no result")]
    NoResult,

    /// Result object has no fields array
    #[error("missing fields")]
    MissingFields,

    /// Result object has no rows array
    #[error("missing rows")]
    MissingRows,

    /// Result object does not match the expected shape
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// Row values are not valid base64
    #[error("Invalid base64 values in row {row}: {message}")]
    InvalidBase64 { row: usize, message: String },

    /// A row length is not an unsigned decimal integer
    #[error("Invalid length '{value}' for row {row}, column {column}")]
    InvalidLength {
        row: usize,
        column: usize,
        value: String,
    },

    /// A row's value count differs from the field count
    #[error("Row {row} has {actual} values but the result has {expected} fields")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Row lengths do not add up to the decoded value buffer
    #[error("Row {row} lengths sum to {expected} bytes but {actual} bytes were decoded")]
    LengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors related to the HTTP exchange.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network failure while sending the request
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Failure while reading the response body
    #[error("Error reading response body: {0}")]
    ReadBody(String),

    /// Gateway answered with a non-success status
    #[error("Gateway API error: {status}\n{body}")]
    HttpStatus { status: u16, body: String },

    /// The caller cancelled the exchange
    #[error("Request cancelled")]
    Cancelled,

    /// The caller's deadline passed before the exchange finished
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

/// Coarse error classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed connection configuration
    Configuration,
    /// Network failure or non-success HTTP status
    Transport,
    /// Malformed or incomplete gateway response
    Protocol,
    /// Error reported by the gateway
    Application,
    /// Unsupported operation
    Capability,
    /// Cancelled or past its deadline
    Cancelled,
    /// Cursor exhausted
    EndOfData,
    /// Caller passed an argument the operation cannot use
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "CONFIGURATION"),
            ErrorKind::Transport => write!(f, "TRANSPORT"),
            ErrorKind::Protocol => write!(f, "PROTOCOL"),
            ErrorKind::Application => write!(f, "APPLICATION"),
            ErrorKind::Capability => write!(f, "CAPABILITY"),
            ErrorKind::Cancelled => write!(f, "CANCELLED"),
            ErrorKind::EndOfData => write!(f, "END_OF_DATA"),
            ErrorKind::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
        }
    }
}

impl PsdbError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PsdbError::Connection(_) => ErrorKind::Configuration,
            PsdbError::Query(e) => e.kind(),
            PsdbError::Protocol(_) => ErrorKind::Protocol,
            PsdbError::Transport(e) => e.kind(),
        }
    }
}

impl QueryError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Server(_) | QueryError::UnknownError => ErrorKind::Application,
            QueryError::NotImplemented { .. } => ErrorKind::Capability,
            QueryError::EndOfData => ErrorKind::EndOfData,
            QueryError::DestinationLength { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl TransportError {
    /// Map to the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Cancelled | TransportError::DeadlineExceeded => ErrorKind::Cancelled,
            _ => ErrorKind::Transport,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::InvalidJson(err.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::RequestFailed(err.to_string())
    }
}
