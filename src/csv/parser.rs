//! Streaming field/row tokenizer driven by a character cursor

use crate::error::Result;
use crate::text::CharCursor;

/// CSV tokenizer for reading rows from a [`CharCursor`]
///
/// Every decision is made on the current code point alone, except the single
/// peek after a quote inside a quoted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvParser {
    separator: char,
    quote: Option<char>,
    skip_blank_lines: bool,
}

impl CsvParser {
    /// Create a new parser with the given separator and optional quote character
    pub fn new(separator: char, quote: Option<char>) -> Self {
        Self {
            separator,
            quote,
            skip_blank_lines: false,
        }
    }

    /// Collapse every run of line breaks into one row terminator (builder pattern)
    pub fn skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }

    /// Field separator
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Quote character, if quoting is enabled
    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    fn is_eol(ch: Option<char>) -> bool {
        matches!(ch, None | Some('\r') | Some('\n'))
    }

    fn is_eoc(&self, ch: Option<char>) -> bool {
        ch == Some(self.separator) || Self::is_eol(ch)
    }

    fn is_line_space(&self, ch: Option<char>) -> bool {
        match ch {
            Some(c) => c.is_whitespace() && c != self.separator && !Self::is_eol(ch),
            None => false,
        }
    }

    fn is_quote(&self, ch: Option<char>) -> bool {
        self.quote.is_some() && ch == self.quote
    }

    /// Consume leading line space and return it
    fn read_leading_space<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<String> {
        let mut space = String::new();
        let mut cur = cursor.current();
        while self.is_line_space(cur) {
            if let Some(ch) = cur {
                space.push(ch);
            }
            cur = cursor.advance()?;
        }
        Ok(space)
    }

    /// Read a quoted field, positioned on its opening quote
    ///
    /// A doubled quote decodes to one literal quote. End of line ends the field
    /// even without a closing quote. After the closing quote the cursor stays on
    /// whatever follows it; that text is left for the row loop.
    fn read_quoted_field<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<String> {
        if !self.is_quote(cursor.read()?) {
            return Err(cursor.error("invalid quoted string"));
        }

        let mut field = String::new();
        let mut cur = cursor.current();
        while let Some(ch) = cur.filter(|_| !Self::is_eol(cur)) {
            if self.is_quote(cur) {
                cur = cursor.advance()?;
                if !self.is_quote(cur) {
                    break;
                }
            }
            field.push(ch);
            cur = cursor.advance()?;
        }
        Ok(field)
    }

    /// Read code points verbatim up to the end of the column
    fn read_unquoted_field<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<String> {
        let mut field = String::new();
        let mut cur = cursor.current();
        while let Some(ch) = cur.filter(|_| !self.is_eoc(cur)) {
            field.push(ch);
            cur = cursor.advance()?;
        }
        Ok(field)
    }

    /// Read one field; leading space is kept only when the field is unquoted
    pub fn read_field<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<String> {
        let mut space = self.read_leading_space(cursor)?;
        if self.is_quote(cursor.current()) {
            self.read_quoted_field(cursor)
        } else {
            space.push_str(&self.read_unquoted_field(cursor)?);
            Ok(space)
        }
    }

    /// Read the fields of one row and consume its line terminator
    ///
    /// Returns an empty row when the cursor already sits on a line break.
    /// A separator directly before the line break does not add a trailing
    /// empty field.
    pub fn read_row<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<Vec<String>> {
        let mut fields = Vec::new();

        while !Self::is_eol(cursor.current()) {
            fields.push(self.read_field(cursor)?);
            if cursor.current() == Some(self.separator) {
                cursor.advance()?;
            }
        }

        self.skip_line_break(cursor)?;
        Ok(fields)
    }

    /// Consume the row terminator without reading past end of stream
    fn skip_line_break<C: CharCursor + ?Sized>(&self, cursor: &mut C) -> Result<()> {
        if self.skip_blank_lines {
            while cursor.current().is_some() && Self::is_eol(cursor.current()) {
                cursor.advance()?;
            }
            return Ok(());
        }

        match cursor.current() {
            Some('\r') => {
                if cursor.advance()? == Some('\n') {
                    cursor.advance()?;
                }
            }
            Some('\n') => {
                cursor.advance()?;
            }
            _ => {}
        }
        Ok(())
    }
}
