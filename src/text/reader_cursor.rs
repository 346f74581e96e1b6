//! UTF-8 character cursor over any buffered reader

use super::CharCursor;
use crate::error::{CsvError, Result};
use crate::types::Position;
use std::io::{BufRead, ErrorKind};

/// Byte-order mark, skipped when it opens the stream
const BOM: char = '\u{feff}';

/// [`CharCursor`] decoding UTF-8 from a [`BufRead`] source
///
/// Decoding is incremental: at most one code point is held in memory beyond
/// what the reader itself buffers. Lines end after `\n`, or after a `\r` that
/// is not followed by `\n`, so `\r\n` counts as one line break.
///
/// # Examples
///
/// ```
/// use csvcursor::text::{CharCursor, ReaderCursor};
///
/// let mut cursor = ReaderCursor::new("hé\nx".as_bytes())?;
/// assert_eq!(cursor.current(), Some('h'));
/// assert_eq!(cursor.advance()?, Some('é'));
/// cursor.advance()?;
/// assert_eq!(cursor.advance()?, Some('x'));
/// assert_eq!(cursor.position().line, 2);
/// # Ok::<(), csvcursor::CsvError>(())
/// ```
pub struct ReaderCursor<R> {
    reader: Option<R>,
    current: Option<char>,
    position: Position,
    after_cr: bool,
}

impl<R: BufRead> ReaderCursor<R> {
    /// Wrap a reader and load its first code point
    pub fn new(reader: R) -> Result<Self> {
        let mut cursor = ReaderCursor {
            reader: Some(reader),
            current: None,
            position: Position::start(),
            after_cr: false,
        };
        cursor.current = cursor.decode_char()?;
        if cursor.current == Some(BOM) {
            cursor.current = cursor.decode_char()?;
        }
        Ok(cursor)
    }

    /// Whether [`close`](CharCursor::close) has been called
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let reader = self.reader.as_mut().ok_or(CsvError::AlreadyClosed)?;
        loop {
            match reader.fill_buf() {
                Ok(buf) if buf.is_empty() => return Ok(None),
                Ok(buf) => {
                    let byte = buf[0];
                    reader.consume(1);
                    return Ok(Some(byte));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn decode_char(&mut self) -> Result<Option<char>> {
        let lead = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };

        let width = match lead {
            0x00..=0x7F => return Ok(Some(lead as char)),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(self.error("invalid UTF-8 sequence")),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            match self.read_byte()? {
                Some(b) => *slot = b,
                None => return Err(self.error("truncated UTF-8 sequence")),
            }
        }

        // from_utf8 rejects overlong forms and surrogates
        std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or_else(|| self.error("invalid UTF-8 sequence"))
    }
}

impl<R: BufRead> CharCursor for ReaderCursor<R> {
    fn current(&self) -> Option<char> {
        self.current
    }

    fn advance(&mut self) -> Result<Option<char>> {
        if self.reader.is_none() {
            return Err(CsvError::AlreadyClosed);
        }
        let consumed = match self.current {
            Some(ch) => ch,
            None => return Ok(None),
        };

        match consumed {
            '\n' if self.after_cr => {}
            '\n' | '\r' => {
                self.position.line += 1;
                self.position.column = 1;
            }
            _ => self.position.column += 1,
        }
        self.after_cr = consumed == '\r';
        self.position.offset += 1;

        self.current = self.decode_char()?;
        Ok(self.current)
    }

    fn position(&self) -> Position {
        self.position
    }

    fn close(&mut self) -> Result<()> {
        self.reader.take().ok_or(CsvError::AlreadyClosed)?;
        self.current = None;
        Ok(())
    }
}
