//! Gateway response parsing.
//!
//! Every response is read in a fixed order:
//! 1. the body must be JSON,
//! 2. a `session` object, if present, is handed back to the caller to store,
//! 3. an `error` object fails the query before `result` is touched,
//! 4. otherwise `result` with its `fields` and `rows` arrays is required.
//!
//! Step 2 is independent of steps 3 and 4: a session rotation carried by an
//! error response must still be applied.

use crate::connection::Session;
use crate::error::{ProtocolError, PsdbError, QueryError};
use crate::transport::messages::{ResponseEnvelope, ResultData};

use super::results::{Field, ResultSet};
use super::rows::decode_rows;

/// A parsed response whose outcome has not been examined yet.
#[derive(Debug)]
pub struct GatewayResponse {
    session: Option<Session>,
    envelope: ResponseEnvelope,
}

impl GatewayResponse {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidJson` if the body is not a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut envelope: ResponseEnvelope = serde_json::from_slice(body)?;
        let session = envelope.session.take().and_then(Session::from_raw);

        Ok(Self { session, envelope })
    }

    /// Session carried by the response, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Take the session out of the response.
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Check the response for an application error.
    ///
    /// A non-object `error` member is ignored.
    pub fn check_error(&self) -> Result<(), QueryError> {
        let Some(error) = self.envelope.error.as_ref().and_then(|e| e.as_object()) else {
            return Ok(());
        };

        match error.get("message") {
            Some(message) => {
                let message = message
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| message.to_string());
                tracing::warn!(%message, "gateway reported an error");
                Err(QueryError::Server(message))
            }
            None => {
                tracing::warn!("gateway reported an error without a message");
                Err(QueryError::UnknownError)
            }
        }
    }

    /// Turn an execute response into a result set.
    ///
    /// # Errors
    ///
    /// Returns `QueryError` for application errors and `ProtocolError` for a
    /// missing or malformed result. Nothing is partially returned.
    pub fn into_result_set(self) -> Result<ResultSet, PsdbError> {
        self.check_error()?;

        let raw = self
            .envelope
            .result
            .filter(|raw| raw.get().trim_start().starts_with('{'))
            .ok_or(ProtocolError::NoResult)?;

        let data: ResultData = serde_json::from_str(raw.get())
            .map_err(|e| ProtocolError::InvalidResult(e.to_string()))?;

        let fields = data.fields.ok_or(ProtocolError::MissingFields)?;
        let rows = data.rows.ok_or(ProtocolError::MissingRows)?;

        let fields: Vec<Field> = fields.into_iter().map(Field::from).collect();
        let rows = decode_rows(&rows)?;

        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != fields.len())
        {
            return Err(ProtocolError::ColumnCountMismatch {
                row,
                expected: fields.len(),
                actual: values.len(),
            }
            .into());
        }

        tracing::debug!(
            columns = fields.len(),
            rows = rows.len(),
            "decoded result set"
        );

        Ok(ResultSet::new(fields, rows))
    }
}
