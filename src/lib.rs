//! # csvcursor
//!
//! Streaming, forward-only CSV reading with constant memory usage.
//!
//! A [`CsvCursor`] pulls one row at a time from a [`CharCursor`], a code point
//! stream that tracks line and column for diagnostics. Fields come back as
//! raw strings by position or by header name. Typed accessors convert them on
//! demand.
//!
//! ## Features
//!
//! - Configurable separator and optional quote character (`""` escapes a quote)
//! - Header row or explicit field names for name-based lookup
//! - CR, LF and CRLF line endings
//! - Position-tagged parse errors (line, column, offset)
//! - Typed accessors: integers, floats, booleans, dates (`chrono`)
//!
//! ## Quick Start
//!
//! ```
//! use csvcursor::{CsvConfig, CsvCursor};
//!
//! let data = "name,age\nAlice,30\nBob,25\n";
//! let mut cursor = CsvCursor::from_reader(data.as_bytes(), CsvConfig::new())?;
//!
//! while cursor.advance()? {
//!     let name = cursor.get("name")?.unwrap_or_default();
//!     let age = cursor.get_i32("age")?;
//!     println!("{name}: {age:?}");
//! }
//! cursor.close()?;
//! # Ok::<(), csvcursor::CsvError>(())
//! ```

pub mod convert;
pub mod csv;
pub mod csv_reader;
pub mod error;
pub mod text;
pub mod types;

pub use convert::FromField;
pub use csv::CsvParser;
pub use csv_reader::{ColumnIndex, CsvCursor, CsvRows};
pub use error::{CoerceErrorKind, CsvError, Result};
pub use text::{CharCursor, ReaderCursor};
pub use types::{CsvConfig, Position};
