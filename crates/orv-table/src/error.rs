//! Errors raised while reading and casting tables.

use thiserror::Error;

/// Description of a header row that does not match the schema.
pub const HEADER_MISMATCH: &str =
    "The column header names do not match the field names in the schema";

/// A row-level schema violation.
///
/// A failure on a single cell carries its own row and column. A row with
/// several failing cells is reported as one wrapper whose `errors` hold the
/// per-cell failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TableSchemaError {
    pub message: String,
    pub row_number: Option<u64>,
    pub column_number: Option<u64>,
    pub errors: Vec<TableSchemaError>,
}

impl TableSchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            row_number: None,
            column_number: None,
            errors: Vec::new(),
        }
    }

    pub fn at(row: u64, column: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            row_number: Some(row),
            column_number: column,
            errors: Vec::new(),
        }
    }

    /// The header row `row` does not match the schema field names.
    pub fn header_mismatch(row: u64) -> Self {
        Self::at(row, None, HEADER_MISMATCH)
    }

    /// The row has a different number of cells than the schema has fields.
    pub fn row_length(row: u64, values: usize, fields: usize) -> Self {
        Self::at(
            row,
            None,
            format!("The row with {values} values does not match the {fields} fields in the schema"),
        )
    }

    /// Collapse the failures of one row: a single failure is returned as is,
    /// several are wrapped.
    pub fn collect(row: u64, mut errors: Vec<TableSchemaError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            n => Some(Self {
                message: format!("There are {n} cast errors (see 'error.errors')"),
                row_number: Some(row),
                column_number: None,
                errors,
            }),
        }
    }

    pub fn is_header_mismatch(&self) -> bool {
        self.message == HEADER_MISMATCH
    }
}

/// Failures of the tabular capability.
#[derive(Error, Debug)]
pub enum TableError {
    /// A row did not cast cleanly. Recoverable in tolerant mode.
    #[error("{0}")]
    Cast(TableSchemaError),

    /// The schema cannot drive a table, e.g. an invalid `pattern`.
    #[error("invalid table schema: {0}")]
    InvalidSchema(String),

    /// The source could not be opened or fetched.
    #[error("cannot read data source '{location}': {reason}")]
    Source { location: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub fn unreadable(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::Source {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether iteration may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cast(_))
    }
}

impl From<TableSchemaError> for TableError {
    fn from(err: TableSchemaError) -> Self {
        Self::Cast(err)
    }
}
