//! Forward-only CSV cursor with header lookup and typed accessors

use crate::convert::FromField;
use crate::csv::CsvParser;
use crate::error::{CsvError, Result};
use crate::text::{CharCursor, ReaderCursor};
use crate::types::{CsvConfig, Position};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::iter::FusedIterator;
use std::path::Path;
use tracing::{debug, trace};

/// Where the cursor stands relative to the rows of its stream
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    BeforeFirst,
    Row(Vec<String>),
    PastLast,
}

/// CSV cursor reading one row at a time from a character stream
///
/// The cursor starts before the first row. Each [`advance`](Self::advance)
/// parses one row and replaces the previous one. Fields are read by position
/// or, when a header is known, by name. Memory usage is one row plus the
/// reader's buffer, whatever the size of the input.
///
/// # Examples
///
/// ```
/// use csvcursor::{CsvConfig, CsvCursor};
///
/// let data = "Col1,Col2,Col3\nEric1,1,2012-01-01\nEric2,2,2012-01-02\n";
/// let mut cursor = CsvCursor::from_reader(data.as_bytes(), CsvConfig::new())?;
///
/// assert!(cursor.advance()?);
/// assert_eq!(cursor.get("Col2")?, Some("1"));
/// assert_eq!(cursor.get_i32(1)?, Some(1));
///
/// assert!(cursor.advance()?);
/// assert_eq!(cursor.get(0)?, Some("Eric2"));
///
/// assert!(!cursor.advance()?);
/// assert!(cursor.is_exhausted());
/// cursor.close()?;
/// # Ok::<(), csvcursor::CsvError>(())
/// ```
///
/// # Without a header
///
/// ```
/// use csvcursor::{CsvConfig, CsvCursor};
///
/// let config = CsvConfig::new()
///     .with_separator(';')
///     .with_quote('"')
///     .has_header(false);
/// let mut cursor = CsvCursor::from_reader(r#""a;b";c"#.as_bytes(), config)?;
///
/// for row in cursor.rows() {
///     assert_eq!(row?, vec!["a;b", "c"]);
/// }
/// # Ok::<(), csvcursor::CsvError>(())
/// ```
pub struct CsvCursor<C: CharCursor> {
    // Released by close(); None afterwards
    cursor: Option<C>,
    parser: CsvParser,
    field_names: Option<IndexMap<String, usize>>,
    state: State,
    row_count: u64,
}

impl CsvCursor<ReaderCursor<BufReader<File>>> {
    /// Open a CSV file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvcursor::{CsvConfig, CsvCursor};
    ///
    /// let mut cursor = CsvCursor::open("data.csv", CsvConfig::new().with_quote('"'))?;
    /// while cursor.advance()? {
    ///     println!("{:?}", cursor.row());
    /// }
    /// # Ok::<(), csvcursor::CsvError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, config: CsvConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening CSV file");
        let file = File::open(path)?;
        Self::from_reader(file, config)
    }
}

impl<R: Read> CsvCursor<ReaderCursor<BufReader<R>>> {
    /// Read CSV from any byte source, decoded as UTF-8
    pub fn from_reader(reader: R, config: CsvConfig) -> Result<Self> {
        let cursor = ReaderCursor::new(BufReader::new(reader))?;
        Self::with_config(cursor, config)
    }
}

impl<C: CharCursor> CsvCursor<C> {
    /// Build a cursor over an existing character cursor
    ///
    /// Unless explicit field names are configured or `has_header` is off,
    /// the first row is consumed here and becomes the field names.
    pub fn with_config(mut cursor: C, config: CsvConfig) -> Result<Self> {
        let parser = CsvParser::new(config.separator, config.quote)
            .skip_blank_lines(config.skip_blank_lines);

        let field_names = match config.field_names {
            Some(names) => Some(index_names(&names[..])),
            None if config.has_header => {
                let header = parser.read_row(&mut cursor)?;
                debug!(fields = header.len(), "read CSV header");
                Some(index_names(&header[..]))
            }
            None => None,
        };

        Ok(CsvCursor {
            cursor: Some(cursor),
            parser,
            field_names,
            state: State::BeforeFirst,
            row_count: 0,
        })
    }

    /// Move to the next row
    ///
    /// Returns `Ok(false)` once the stream is exhausted; every later call
    /// returns `Ok(false)` again without touching the stream. A parse or I/O
    /// error drops the current row and leaves the cursor exhausted.
    pub fn advance(&mut self) -> Result<bool> {
        if self.state == State::PastLast {
            return Ok(false);
        }
        let cursor = self.cursor.as_mut().ok_or(CsvError::AlreadyClosed)?;

        if cursor.current().is_none() {
            debug!(rows = self.row_count, "reached end of CSV stream");
            self.state = State::PastLast;
            return Ok(false);
        }

        match self.parser.read_row(cursor) {
            Ok(row) => {
                self.row_count += 1;
                trace!(row = self.row_count, fields = row.len(), "read CSV row");
                self.state = State::Row(row);
                Ok(true)
            }
            Err(e) => {
                self.state = State::PastLast;
                Err(e)
            }
        }
    }

    /// True until the first call to [`advance`](Self::advance)
    pub fn is_at_start(&self) -> bool {
        self.state == State::BeforeFirst
    }

    /// True once an advance has found no further row
    pub fn is_exhausted(&self) -> bool {
        self.state == State::PastLast
    }

    /// Fields of the current row, if one is held
    pub fn row(&self) -> Option<&[String]> {
        match &self.state {
            State::Row(fields) => Some(fields),
            _ => None,
        }
    }

    /// Number of fields in the current row (0 when no row is held)
    pub fn field_count(&self) -> usize {
        self.row().map_or(0, <[String]>::len)
    }

    /// Number of data rows read so far (the header is not counted)
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Position of the underlying character cursor, `None` once closed
    pub fn position(&self) -> Option<Position> {
        self.cursor.as_ref().map(CharCursor::position)
    }

    /// Whether name-based lookup is available
    pub fn has_field_names(&self) -> bool {
        self.field_names.is_some()
    }

    /// Field names in header order
    ///
    /// A name repeated in the header is listed once.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names
            .iter()
            .flat_map(|names| names.keys().map(String::as_str))
    }

    /// Column position of a field name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.as_ref()?.get(name).copied()
    }

    fn current_row(&self) -> Result<&[String]> {
        self.row().ok_or(CsvError::NoCurrentRow)
    }

    /// Raw text of a field, by position or by name
    ///
    /// Returns `Ok(None)` when the current row is too short to contain the
    /// field. Rows are allowed to be short.
    ///
    /// # Errors
    ///
    /// - [`CsvError::NoCurrentRow`] before the first row or after the last
    /// - [`CsvError::IndexOutOfRange`] for a negative position
    /// - [`CsvError::NoFieldNames`] for a name lookup without a header
    /// - [`CsvError::UnknownField`] for a name missing from the header
    pub fn get<I: ColumnIndex>(&self, index: I) -> Result<Option<&str>> {
        let row = self.current_row()?;
        let col = index.column(self.field_names.as_ref())?;
        Ok(row.get(col).map(String::as_str))
    }

    /// Field converted with [`FromField`]
    ///
    /// `Ok(None)` means the field is absent; a present field that does not
    /// convert is an error.
    pub fn get_as<T: FromField, I: ColumnIndex>(&self, index: I) -> Result<Option<T>> {
        self.get(index)?.map(T::from_field).transpose()
    }

    /// Field passed through a caller-supplied conversion
    pub fn get_with<T, I, F>(&self, index: I, f: F) -> Result<Option<T>>
    where
        I: ColumnIndex,
        F: FnOnce(&str) -> T,
    {
        Ok(self.get(index)?.map(f))
    }

    /// Field as an owned string
    pub fn get_string<I: ColumnIndex>(&self, index: I) -> Result<Option<String>> {
        self.get_as(index)
    }

    pub fn get_i8<I: ColumnIndex>(&self, index: I) -> Result<Option<i8>> {
        self.get_as(index)
    }

    pub fn get_i16<I: ColumnIndex>(&self, index: I) -> Result<Option<i16>> {
        self.get_as(index)
    }

    pub fn get_i32<I: ColumnIndex>(&self, index: I) -> Result<Option<i32>> {
        self.get_as(index)
    }

    pub fn get_i64<I: ColumnIndex>(&self, index: I) -> Result<Option<i64>> {
        self.get_as(index)
    }

    pub fn get_f32<I: ColumnIndex>(&self, index: I) -> Result<Option<f32>> {
        self.get_as(index)
    }

    pub fn get_f64<I: ColumnIndex>(&self, index: I) -> Result<Option<f64>> {
        self.get_as(index)
    }

    /// Field as a boolean (`true/yes/1`, `false/no/0`)
    pub fn get_bool<I: ColumnIndex>(&self, index: I) -> Result<Option<bool>> {
        self.get_as(index)
    }

    /// Field as a `YYYY-MM-DD` date
    pub fn get_date<I: ColumnIndex>(&self, index: I) -> Result<Option<NaiveDate>> {
        self.get_as(index)
    }

    /// Field as a date-time (RFC 3339 or `YYYY-MM-DD HH:MM:SS`)
    pub fn get_datetime<I: ColumnIndex>(&self, index: I) -> Result<Option<NaiveDateTime>> {
        self.get_as(index)
    }

    /// Release the underlying character cursor
    ///
    /// Closing twice is an error. The current row, if any, stays readable.
    pub fn close(&mut self) -> Result<()> {
        let mut cursor = self.cursor.take().ok_or(CsvError::AlreadyClosed)?;
        trace!(rows = self.row_count, "closing CSV cursor");
        cursor.close()
    }

    /// Iterator over the remaining rows as owned field lists
    ///
    /// The iterator stops after the first error.
    ///
    /// # Examples
    ///
    /// ```
    /// use csvcursor::{CsvConfig, CsvCursor};
    ///
    /// let mut cursor = CsvCursor::from_reader("id\n1\n2\n".as_bytes(), CsvConfig::new())?;
    /// let ids: Vec<Vec<String>> = cursor.rows().collect::<Result<_, _>>()?;
    /// assert_eq!(ids, vec![vec!["1"], vec!["2"]]);
    /// # Ok::<(), csvcursor::CsvError>(())
    /// ```
    pub fn rows(&mut self) -> CsvRows<'_, C> {
        CsvRows {
            cursor: self,
            failed: false,
        }
    }
}

/// Map trimmed names to positions; a repeated name keeps its last position
fn index_names<S: AsRef<str>>(names: &[S]) -> IndexMap<String, usize> {
    let mut index = IndexMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        index.insert(name.as_ref().trim().to_string(), i);
    }
    index
}

/// Iterator over CSV rows
pub struct CsvRows<'a, C: CharCursor> {
    cursor: &'a mut CsvCursor<C>,
    failed: bool,
}

impl<C: CharCursor> Iterator for CsvRows<'_, C> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.cursor.advance() {
            Ok(true) => self.cursor.row().map(|fields| Ok(fields.to_vec())),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<C: CharCursor> FusedIterator for CsvRows<'_, C> {}

mod private {
    pub trait Sealed {}
}

/// A field key: a zero-based position or a header name
///
/// Implemented for the integer types and for `str`/`String`, so both
/// `cursor.get(2)` and `cursor.get("Col3")` work.
pub trait ColumnIndex: private::Sealed {
    #[doc(hidden)]
    fn column(&self, names: Option<&IndexMap<String, usize>>) -> Result<usize>;
}

impl private::Sealed for usize {}

impl ColumnIndex for usize {
    fn column(&self, _names: Option<&IndexMap<String, usize>>) -> Result<usize> {
        Ok(*self)
    }
}

impl private::Sealed for u32 {}

impl ColumnIndex for u32 {
    fn column(&self, _names: Option<&IndexMap<String, usize>>) -> Result<usize> {
        Ok(*self as usize)
    }
}

macro_rules! impl_signed_column_index {
    ($($ty:ty),*) => {
        $(
            impl private::Sealed for $ty {}

            impl ColumnIndex for $ty {
                fn column(&self, _names: Option<&IndexMap<String, usize>>) -> Result<usize> {
                    usize::try_from(*self).map_err(|_| CsvError::IndexOutOfRange(*self as i64))
                }
            }
        )*
    };
}

impl_signed_column_index!(i32, i64, isize);

impl private::Sealed for str {}

impl ColumnIndex for str {
    fn column(&self, names: Option<&IndexMap<String, usize>>) -> Result<usize> {
        names
            .ok_or(CsvError::NoFieldNames)?
            .get(self)
            .copied()
            .ok_or_else(|| CsvError::UnknownField(self.to_string()))
    }
}

impl private::Sealed for String {}

impl ColumnIndex for String {
    fn column(&self, names: Option<&IndexMap<String, usize>>) -> Result<usize> {
        self.as_str().column(names)
    }
}

impl<T: ColumnIndex + ?Sized> private::Sealed for &T {}

impl<T: ColumnIndex + ?Sized> ColumnIndex for &T {
    fn column(&self, names: Option<&IndexMap<String, usize>>) -> Result<usize> {
        (**self).column(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoerceErrorKind;

    const NAMED: &str = "Col1,Col2,Col3\nEric1,1,2012-01-01\nEric2,2,2012-01-02\n";

    fn cursor(data: &'static str, config: CsvConfig) -> CsvCursor<ReaderCursor<BufReader<&'static [u8]>>> {
        CsvCursor::from_reader(data.as_bytes(), config).unwrap()
    }

    #[test]
    fn test_cursor_with_named_columns() -> Result<()> {
        let mut csv = cursor(NAMED, CsvConfig::new());

        assert!(csv.is_at_start());
        assert!(!csv.is_exhausted());
        assert_eq!(csv.field_index("Col1"), Some(0));
        assert_eq!(csv.field_index("Col2"), Some(1));
        assert_eq!(csv.field_index("Col3"), Some(2));

        assert!(csv.advance()?);
        assert!(!csv.is_at_start());
        assert_eq!(csv.get(0)?, Some("Eric1"));
        assert_eq!(csv.get("Col1")?, Some("Eric1"));

        assert_eq!(csv.get(1)?, Some("1"));
        assert_eq!(csv.get_i8(1)?, Some(1));
        assert_eq!(csv.get_i16(1)?, Some(1));
        assert_eq!(csv.get_i32(1)?, Some(1));
        assert_eq!(csv.get_i64(1)?, Some(1));
        assert_eq!(csv.get_f32(1)?, Some(1.0));
        assert_eq!(csv.get_f64(1)?, Some(1.0));
        assert_eq!(csv.get_string(1)?, Some("1".to_string()));
        assert_eq!(csv.get_with(1, str::len)?, Some(1));

        assert_eq!(csv.get("Col2")?, Some("1"));
        assert_eq!(csv.get_i64("Col2")?, Some(1));
        assert_eq!(csv.get_f64("Col2")?, Some(1.0));
        assert_eq!(csv.get_string("Col2".to_string())?, Some("1".to_string()));

        assert_eq!(csv.get(2)?, Some("2012-01-01"));
        assert_eq!(csv.get("Col3")?, Some("2012-01-01"));
        assert_eq!(
            csv.get_date("Col3")?,
            NaiveDate::from_ymd_opt(2012, 1, 1)
        );

        assert!(csv.advance()?);
        assert_eq!(csv.row(), Some(&["Eric2".to_string(), "2".to_string(), "2012-01-02".to_string()][..]));

        assert!(!csv.advance()?);
        assert!(csv.is_exhausted());
        assert_eq!(csv.row_count(), 2);

        csv.close()
    }

    #[test]
    fn test_field_access_without_row() {
        let mut csv = cursor(NAMED, CsvConfig::new());
        assert!(matches!(csv.get(0), Err(CsvError::NoCurrentRow)));
        assert!(matches!(csv.get("Col1"), Err(CsvError::NoCurrentRow)));
        assert_eq!(csv.field_count(), 0);

        while csv.advance().unwrap() {}
        assert!(matches!(csv.get(0), Err(CsvError::NoCurrentRow)));
    }

    #[test]
    fn test_negative_index() -> Result<()> {
        let mut csv = cursor(NAMED, CsvConfig::new());
        csv.advance()?;
        assert!(matches!(csv.get(-1), Err(CsvError::IndexOutOfRange(-1))));
        assert!(matches!(csv.get(-5_i64), Err(CsvError::IndexOutOfRange(-5))));
        Ok(())
    }

    #[test]
    fn test_short_row_returns_none() -> Result<()> {
        let mut csv = cursor("a,b,c\n1\n", CsvConfig::new());
        csv.advance()?;
        assert_eq!(csv.field_count(), 1);
        assert_eq!(csv.get(0)?, Some("1"));
        assert_eq!(csv.get(5)?, None);
        assert_eq!(csv.get("c")?, None);
        assert_eq!(csv.get_i32("c")?, None);
        Ok(())
    }

    #[test]
    fn test_name_lookup_errors() -> Result<()> {
        let mut csv = cursor(NAMED, CsvConfig::new());
        csv.advance()?;
        match csv.get("Nope") {
            Err(CsvError::UnknownField(name)) => assert_eq!(name, "Nope"),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut csv = cursor("1,2\n", CsvConfig::new().has_header(false));
        assert!(!csv.has_field_names());
        csv.advance()?;
        assert_eq!(csv.get(1)?, Some("2"));
        assert!(matches!(csv.get("Col1"), Err(CsvError::NoFieldNames)));
        Ok(())
    }

    #[test]
    fn test_header_names_are_trimmed() -> Result<()> {
        let csv = cursor(" id , name \n", CsvConfig::new());
        assert_eq!(csv.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(csv.field_index("name"), Some(1));
        Ok(())
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let csv = cursor("a,b,a\n", CsvConfig::new());
        assert_eq!(csv.field_index("a"), Some(2));
        assert_eq!(csv.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_explicit_field_names() -> Result<()> {
        let config = CsvConfig::new().with_field_names([" x", "y "]);
        let mut csv = cursor("1,2\n3,4\n", config);
        assert!(csv.advance()?);
        assert_eq!(csv.get("x")?, Some("1"));
        assert_eq!(csv.get("y")?, Some("2"));
        assert!(csv.advance()?);
        assert_eq!(csv.get_i32("y")?, Some(4));
        assert!(!csv.advance()?);
        Ok(())
    }

    #[test]
    fn test_quoting_scenarios() -> Result<()> {
        let config = CsvConfig::new().with_quote('"').has_header(false);
        let mut csv = cursor("\"a,b\",c\n\"a\"\"b\",c\n", config);
        assert!(csv.advance()?);
        assert_eq!(csv.row(), Some(&["a,b".to_string(), "c".to_string()][..]));
        assert!(csv.advance()?);
        assert_eq!(csv.row(), Some(&["a\"b".to_string(), "c".to_string()][..]));
        assert!(!csv.advance()?);
        Ok(())
    }

    #[test]
    fn test_blank_line_is_empty_row() -> Result<()> {
        let mut csv = cursor("h\nx\n\ny\n", CsvConfig::new());
        assert!(csv.advance()?);
        assert_eq!(csv.get(0)?, Some("x"));
        assert!(csv.advance()?);
        assert_eq!(csv.field_count(), 0);
        assert!(!csv.is_exhausted());
        assert_eq!(csv.get(0)?, None);
        assert!(csv.advance()?);
        assert_eq!(csv.get(0)?, Some("y"));
        assert!(!csv.advance()?);
        Ok(())
    }

    #[test]
    fn test_no_phantom_row_after_crlf() -> Result<()> {
        let mut csv = cursor("h\r\nv\r\n", CsvConfig::new());
        assert!(csv.advance()?);
        assert!(!csv.advance()?);
        Ok(())
    }

    #[test]
    fn test_past_last_is_terminal() -> Result<()> {
        let mut csv = cursor("h\nv\n", CsvConfig::new());
        assert!(csv.advance()?);
        assert!(!csv.advance()?);
        let pos = csv.position();
        for _ in 0..3 {
            assert!(!csv.advance()?);
            assert!(csv.is_exhausted());
            assert!(!csv.is_at_start());
            assert!(csv.row().is_none());
        }
        assert_eq!(csv.position(), pos);
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let mut csv = cursor("", CsvConfig::new());
        assert!(csv.has_field_names());
        assert_eq!(csv.field_names().count(), 0);
        assert!(csv.is_at_start());
        assert!(!csv.is_exhausted());
        assert!(!csv.advance()?);
        assert!(csv.is_exhausted());
        Ok(())
    }

    #[test]
    fn test_coercion_failure_is_distinct_from_absence() -> Result<()> {
        let mut csv = cursor("n,flag\nabc,maybe\n", CsvConfig::new());
        csv.advance()?;
        match csv.get_i32("n") {
            Err(CsvError::Coerce { value, kind, .. }) => {
                assert_eq!(value, "abc");
                assert_eq!(kind, CoerceErrorKind::Integer);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            csv.get_bool("flag"),
            Err(CsvError::Coerce { kind: CoerceErrorKind::Bool, .. })
        ));
        assert_eq!(csv.get_bool(9)?, None);
        Ok(())
    }

    #[test]
    fn test_close_twice() -> Result<()> {
        let mut csv = cursor(NAMED, CsvConfig::new());
        csv.advance()?;
        csv.close()?;
        assert_eq!(csv.position(), None);
        assert_eq!(csv.get(0)?, Some("Eric1"));
        assert!(matches!(csv.close(), Err(CsvError::AlreadyClosed)));
        assert!(matches!(csv.advance(), Err(CsvError::AlreadyClosed)));
        Ok(())
    }

    #[test]
    fn test_rows_iterator() -> Result<()> {
        let mut csv = cursor(NAMED, CsvConfig::new());
        let rows: Vec<Vec<String>> = csv.rows().collect::<Result<_>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Eric1", "1", "2012-01-01"]);
        assert_eq!(rows[1], vec!["Eric2", "2", "2012-01-02"]);
        assert!(csv.is_exhausted());
        assert_eq!(csv.rows().count(), 0);
        Ok(())
    }

    #[test]
    fn test_error_during_advance_exhausts_cursor() -> Result<()> {
        let data: &[u8] = b"h\nok\nbad\xff\nnever\n";
        let mut csv = CsvCursor::from_reader(data, CsvConfig::new())?;
        let mut rows = csv.rows();
        assert_eq!(rows.next().transpose()?, Some(vec!["ok".to_string()]));
        assert!(matches!(rows.next(), Some(Err(CsvError::Parse { .. }))));
        assert!(rows.next().is_none());
        assert!(csv.is_exhausted());
        assert!(csv.row().is_none());
        Ok(())
    }

    #[test]
    fn test_boxed_char_cursor() -> Result<()> {
        let inner: Box<dyn CharCursor> = Box::new(ReaderCursor::new("k\nv\n".as_bytes())?);
        let mut csv = CsvCursor::with_config(inner, CsvConfig::new())?;
        assert!(csv.advance()?);
        assert_eq!(csv.get("k")?, Some("v"));
        csv.close()
    }
}
