//! Length-prefixed row decoding.
//!
//! The gateway sends each row as one base64 blob holding every column value
//! back to back, plus a parallel array of decimal byte counts. Column
//! boundaries are recovered by walking the counts with a running offset.
//!
//! A zero length decodes to an empty value. The encoding carries no NULL
//! marker, so an empty string and a NULL column cannot be told apart, and
//! negative counts are rejected rather than read as NULL.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use std::ops::Range;

use crate::error::ProtocolError;
use crate::transport::messages::RowData;

/// A decoded row.
///
/// Owns a single buffer; each column value is a view into it.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    buffer: Vec<u8>,
    spans: Vec<Range<usize>>,
}

impl Row {
    /// Number of column values.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Value of the column at `index`.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.spans.get(index).map(|span| &self.buffer[span.clone()])
    }

    /// Column values in order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.spans.iter().map(move |span| &self.buffer[span.clone()])
    }

    /// The whole decoded buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values().map(String::from_utf8_lossy))
            .finish()
    }
}

/// Decode one row.
///
/// `row` is the row's position in the result, used for error context.
///
/// # Errors
///
/// Returns `ProtocolError` if `values` is not base64, a length is not an
/// unsigned decimal integer, or the lengths do not sum to the decoded size.
pub fn decode_row(row: usize, values: &str, lengths: &[String]) -> Result<Row, ProtocolError> {
    let buffer = BASE64
        .decode(values.as_bytes())
        .map_err(|e| ProtocolError::InvalidBase64 {
            row,
            message: e.to_string(),
        })?;

    let mut spans = Vec::with_capacity(lengths.len());
    let mut offset: usize = 0;

    for (column, raw) in lengths.iter().enumerate() {
        let invalid = || ProtocolError::InvalidLength {
            row,
            column,
            value: raw.clone(),
        };

        let len: u64 = raw.parse().map_err(|_| invalid())?;
        let len = usize::try_from(len).map_err(|_| invalid())?;
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ProtocolError::LengthMismatch {
                row,
                expected: usize::MAX,
                actual: buffer.len(),
            })?;

        if end > buffer.len() {
            let expected = lengths_total(lengths).unwrap_or(usize::MAX);
            return Err(ProtocolError::LengthMismatch {
                row,
                expected,
                actual: buffer.len(),
            });
        }

        spans.push(offset..end);
        offset = end;
    }

    if offset != buffer.len() {
        return Err(ProtocolError::LengthMismatch {
            row,
            expected: offset,
            actual: buffer.len(),
        });
    }

    Ok(Row { buffer, spans })
}

/// Decode every row of a result.
///
/// Any failure discards the rows decoded so far.
pub fn decode_rows(rows: &[RowData]) -> Result<Vec<Row>, ProtocolError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| decode_row(i, &row.values, &row.lengths))
        .collect()
}

/// Sum of all lengths, for error reporting. `None` on overflow or bad input.
fn lengths_total(lengths: &[String]) -> Option<usize> {
    lengths.iter().try_fold(0usize, |acc, raw| {
        let len = usize::try_from(raw.parse::<u64>().ok()?).ok()?;
        acc.checked_add(len)
    })
}
