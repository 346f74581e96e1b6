//! Type definitions shared by the character and tabular cursors

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Location of the character cursor in its stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Line number (1-based)
    pub line: u64,
    /// Column number within the line, in code points (1-based)
    pub column: u64,
    /// Code points consumed since the start of the stream (0-based)
    pub offset: u64,
}

impl Position {
    /// Position of the first code point of a stream
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Construction options for [`CsvCursor`](crate::CsvCursor)
///
/// # Examples
///
/// ```
/// use csvcursor::CsvConfig;
///
/// let config = CsvConfig::new()
///     .with_separator(';')
///     .with_quote('"')
///     .with_field_names(["id", "name"]);
/// assert_eq!(config.separator, ';');
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CsvConfig {
    /// Field separator (default: `,`)
    pub separator: char,
    /// Quote character, `None` disables quoting (default: `None`)
    pub quote: Option<char>,
    /// Explicit field names; when set, no header row is consumed (default: `None`)
    pub field_names: Option<Vec<String>>,
    /// Consume the first row as field names when none are given (default: true)
    pub has_header: bool,
    /// Collapse runs of line breaks so blank lines never produce rows (default: false)
    pub skip_blank_lines: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            separator: ',',
            quote: None,
            field_names: None,
            has_header: true,
            skip_blank_lines: false,
        }
    }
}

impl CsvConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Enable quoting with the given quote character
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = Some(quote);
        self
    }

    /// Disable quoting
    pub fn without_quote(mut self) -> Self {
        self.quote = None;
        self
    }

    /// Use explicit field names instead of reading a header row
    pub fn with_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the first row holds field names (ignored when names are explicit)
    pub fn has_header(mut self, has: bool) -> Self {
        self.has_header = has;
        self
    }

    /// Whether consecutive line breaks collapse into a single row terminator
    pub fn skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }
}
