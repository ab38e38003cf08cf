use std::io;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{Error, Result};
use crate::infer::ColumnType;

/// Streaming reader over one delimited document.
///
/// The first record locks the header and the column count for the lifetime
/// of the reader; every later record must match that arity. Each field read
/// is fed to its column's [`ColumnType`] so the committed type states always
/// reflect everything seen so far.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
    header: Vec<String>,
    header_set: bool,
    types: Vec<ColumnType>,
    rows_read: usize,
}

impl<R: io::Read> Reader<R> {
    pub fn new(input: R, sep: u8) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(sep)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input);
        Self {
            inner,
            header: Vec::new(),
            header_set: false,
            types: Vec::new(),
            rows_read: 0,
        }
    }

    /// Reads the first record and locks it in as the header, initializing
    /// one type state per column. Fails with `HeaderAlreadySet` on a second
    /// explicit call; `read_record` calls this implicitly when needed.
    pub fn read_header(&mut self) -> Result<()> {
        if self.header_set {
            return Err(Error::HeaderAlreadySet);
        }
        let mut record = StringRecord::new();
        if !self.inner.read_record(&mut record)? {
            return Err(Error::EmptyInput);
        }
        self.header = record.iter().map(str::to_string).collect();
        self.types = vec![ColumnType::Integer; self.header.len()];
        self.header_set = true;
        debug!(columns = self.header.len(), "header locked");
        Ok(())
    }

    /// Column names, empty until the header has been read.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Committed per-column type states, in header order.
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Rows consumed so far, header excluded.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub(crate) fn ensure_header(&mut self) -> Result<()> {
        if self.header_set {
            return Ok(());
        }
        self.read_header()
    }

    /// Next data record, or `None` at end of input. On success every field
    /// has been observed by its column's type state.
    pub fn read_record(&mut self) -> Result<Option<StringRecord>> {
        self.ensure_header()?;
        let mut record = StringRecord::new();
        if !self.inner.read_record(&mut record)? {
            return Ok(None);
        }
        if record.len() != self.header.len() {
            return Err(Error::ArityMismatch {
                row: self.rows_read,
                expected: self.header.len(),
                found: record.len(),
            });
        }
        for (ty, field) in self.types.iter_mut().zip(record.iter()) {
            ty.observe(field);
        }
        self.rows_read += 1;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_is_locked_once() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a,b\n1,2\n"), b',');
        r.read_header()?;
        assert_eq!(r.header(), ["a", "b"]);
        assert!(matches!(r.read_header(), Err(Error::HeaderAlreadySet)));
        Ok(())
    }

    #[test]
    fn first_read_sets_header_implicitly() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a,b\n1,2\n"), b',');
        let record = r.read_record()?.expect("one data row");
        assert_eq!(record.iter().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(r.header(), ["a", "b"]);
        Ok(())
    }

    #[test]
    fn arity_mismatch_reports_the_row() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a,b,c\n1,2,3\n4,\n"), b',');
        r.read_record()?;
        match r.read_record() {
            Err(Error::ArityMismatch {
                row,
                expected,
                found,
            }) => {
                assert_eq!((row, expected, found), (1, 3, 2));
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn end_of_input_is_not_an_error() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a\n1\n"), b',');
        assert!(r.read_record()?.is_some());
        assert!(r.read_record()?.is_none());
        assert_eq!(r.rows_read(), 1);
        Ok(())
    }

    #[test]
    fn empty_input_fails_on_header() {
        let mut r = Reader::new(Cursor::new(""), b',');
        assert!(matches!(r.read_header(), Err(Error::EmptyInput)));
    }

    #[test]
    fn fields_feed_the_type_states() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a,b,c\n1,2.5,x\n"), b',');
        r.read_record()?;
        assert_eq!(
            r.types(),
            [ColumnType::Integer, ColumnType::Float, ColumnType::Str]
        );
        Ok(())
    }

    #[test]
    fn alternate_separator() -> anyhow::Result<()> {
        let mut r = Reader::new(Cursor::new("a;b\n1;2\n"), b';');
        let record = r.read_record()?.expect("one data row");
        assert_eq!(record.iter().collect::<Vec<_>>(), ["1", "2"]);
        Ok(())
    }
}
