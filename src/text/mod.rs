//! Character-level cursor over a text stream
//!
//! The tabular layer never touches bytes directly. It drives a [`CharCursor`]
//! one code point at a time and asks it for position-tagged errors.

mod reader_cursor;

pub use reader_cursor::ReaderCursor;

use crate::error::{CsvError, Result};
use crate::types::Position;

/// Forward-only cursor over Unicode code points
///
/// `None` from [`current`](CharCursor::current) or [`advance`](CharCursor::advance)
/// marks the end of the stream.
pub trait CharCursor {
    /// Code point under the cursor, or `None` at end of stream
    fn current(&self) -> Option<char>;

    /// Move forward one code point and return the new current one
    ///
    /// At end of stream this is a no-op returning `Ok(None)`.
    fn advance(&mut self) -> Result<Option<char>>;

    /// Consume the current code point and return it
    fn read(&mut self) -> Result<Option<char>> {
        let ch = self.current();
        self.advance()?;
        Ok(ch)
    }

    /// Position of the current code point
    fn position(&self) -> Position;

    /// Build a parse error tagged with the current position
    fn error(&self, message: &str) -> CsvError {
        CsvError::Parse {
            message: message.to_string(),
            position: self.position(),
        }
    }

    /// Release the underlying source
    ///
    /// Closing twice fails with [`CsvError::AlreadyClosed`].
    fn close(&mut self) -> Result<()>;
}

impl<C: CharCursor + ?Sized> CharCursor for Box<C> {
    fn current(&self) -> Option<char> {
        (**self).current()
    }

    fn advance(&mut self) -> Result<Option<char>> {
        (**self).advance()
    }

    fn position(&self) -> Position {
        (**self).position()
    }

    fn error(&self, message: &str) -> CsvError {
        (**self).error(message)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
