//! Error types for CSV cursor operations

use crate::types::Position;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`CsvError`]
pub type Result<T> = std::result::Result<T, CsvError>;

/// Errors raised while reading or accessing CSV data
#[derive(Debug, Error)]
pub enum CsvError {
    /// Malformed input at a known position in the stream
    #[error("{message} (line {}, column {}, offset {})", .position.line, .position.column, .position.offset)]
    Parse {
        /// What went wrong
        message: String,
        /// Where the character cursor stood when the error was raised
        position: Position,
    },

    /// Failure of the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Field access while the cursor holds no row
    #[error("no current row: call advance() first, or the cursor is exhausted")]
    NoCurrentRow,

    /// The character cursor has already been released
    #[error("cursor already closed")]
    AlreadyClosed,

    /// Negative field position
    #[error("field index {0} out of range")]
    IndexOutOfRange(i64),

    /// Name-based access on a cursor built without a header
    #[error("no field names defined for this cursor")]
    NoFieldNames,

    /// Name not present in the header
    #[error("unknown field name: {0}")]
    UnknownField(String),

    /// A field was present but could not be converted to the requested type
    #[error("cannot convert {value:?} to {kind}: {message}")]
    Coerce {
        /// The raw field text
        value: String,
        /// Target type family
        kind: CoerceErrorKind,
        /// Parser message
        message: String,
    },
}

impl CsvError {
    /// Position of a parse error, if this is one
    pub fn position(&self) -> Option<Position> {
        match self {
            CsvError::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub(crate) fn coerce(value: &str, kind: CoerceErrorKind, err: impl fmt::Display) -> Self {
        CsvError::Coerce {
            value: value.to_string(),
            kind,
            message: err.to_string(),
        }
    }
}

/// Which conversion failed in a typed accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoerceErrorKind {
    /// Signed or unsigned integer
    Integer,
    /// Floating point number
    Float,
    /// Boolean
    Bool,
    /// Calendar date
    Date,
    /// Date and time
    DateTime,
}

impl fmt::Display for CoerceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoerceErrorKind::Integer => "integer",
            CoerceErrorKind::Float => "float",
            CoerceErrorKind::Bool => "bool",
            CoerceErrorKind::Date => "date",
            CoerceErrorKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}
