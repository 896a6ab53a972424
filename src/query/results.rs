//! Result set handling and iteration.
//!
//! A `ResultSet` is fully decoded before it is handed to the caller. It is a
//! forward-only cursor: `next` copies the current row out and advances, and
//! once the rows run out every further call reports end of data.

use crate::error::QueryError;
use crate::transport::messages::FieldInfo;

use super::rows::Row;

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Declared type tag, e.g. `INT64` or `VARCHAR`
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

impl From<FieldInfo> for Field {
    fn from(info: FieldInfo) -> Self {
        Self {
            name: info.name,
            type_name: info.type_name,
            table: info.table,
            column_length: info.column_length,
            charset: info.charset,
            flags: info.flags,
        }
    }
}

/// Forward-only cursor contract over query results.
pub trait Cursor {
    /// Column names in declared order.
    fn columns(&self) -> Vec<&str>;

    /// Copy the current row into `dest` and advance.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EndOfData` once every row has been consumed.
    fn next(&mut self, dest: &mut [Vec<u8>]) -> Result<(), QueryError>;

    /// Release the cursor.
    fn close(&mut self) -> Result<(), QueryError>;
}

/// Decoded query results.
#[derive(Debug, Clone)]
pub struct ResultSet {
    fields: Vec<Field>,
    rows: Vec<Row>,
    position: usize,
}

impl ResultSet {
    /// Create a result set positioned before the first row.
    pub fn new(fields: Vec<Field>, rows: Vec<Row>) -> Self {
        Self {
            fields,
            rows,
            position: 0,
        }
    }

    /// Column metadata.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// All rows, regardless of cursor position.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Column names in declared order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the next row to be returned.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every row has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.rows.len()
    }

    /// Borrow the current row and advance.
    pub fn next_row(&mut self) -> Option<&Row> {
        let row = self.rows.get(self.position)?;
        self.position += 1;
        Some(row)
    }

    /// Copy the current row into `dest` and advance.
    ///
    /// `dest` must have one slot per column. Each slot is overwritten with a
    /// copy of the column value.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EndOfData` after the last row, and keeps
    /// returning it. Returns `QueryError::DestinationLength` if `dest` does
    /// not match the column count; the cursor does not move in that case.
    pub fn next(&mut self, dest: &mut [Vec<u8>]) -> Result<(), QueryError> {
        let Some(row) = self.rows.get(self.position) else {
            return Err(QueryError::EndOfData);
        };

        if dest.len() != row.len() {
            return Err(QueryError::DestinationLength {
                expected: row.len(),
                actual: dest.len(),
            });
        }

        for (slot, value) in dest.iter_mut().zip(row.values()) {
            slot.clear();
            slot.extend_from_slice(value);
        }

        self.position += 1;
        Ok(())
    }

    /// Close the result set. Holds no external resources; safe to call repeatedly.
    pub fn close(&mut self) -> Result<(), QueryError> {
        Ok(())
    }
}

impl Cursor for ResultSet {
    fn columns(&self) -> Vec<&str> {
        ResultSet::columns(self)
    }

    fn next(&mut self, dest: &mut [Vec<u8>]) -> Result<(), QueryError> {
        ResultSet::next(self, dest)
    }

    fn close(&mut self) -> Result<(), QueryError> {
        ResultSet::close(self)
    }
}
