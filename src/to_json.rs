use std::io;

use csv::StringRecord;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::read::Reader;

/// Structured-document layout for tabular -> JSON conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    /// One object mapping each column name to the array of its values.
    Columns,
    /// One array holding an object per row.
    Records,
}

impl<R: io::Read> Reader<R> {
    /// Converts up to `row_limit` data rows to JSON (`row_limit < 0` means
    /// all remaining rows). Returns the number of rows consumed together
    /// with the emitted bytes. End of input on the very first row is
    /// `EmptyInput`; end of input after at least one row ends the
    /// conversion normally with the rows read so far.
    pub fn to_json(&mut self, orient: Orient, row_limit: i64) -> Result<(usize, Vec<u8>)> {
        let limit = if row_limit < 0 {
            usize::MAX
        } else {
            row_limit as usize
        };
        match orient {
            Orient::Columns => self.to_json_columns(limit),
            Orient::Records => self.to_json_records(limit),
        }
    }

    /// Column orientation is necessarily two-pass: a promotion on a late
    /// row retypes every earlier cell of that column, so all raw rows for
    /// the run are buffered before anything is classified or emitted.
    fn to_json_columns(&mut self, limit: usize) -> Result<(usize, Vec<u8>)> {
        self.ensure_header()?;
        let mut rows: Vec<StringRecord> = Vec::new();
        while rows.len() < limit {
            match self.read_record()? {
                Some(record) => rows.push(record),
                None if rows.is_empty() => return Err(Error::EmptyInput),
                None => break,
            }
        }

        let mut types = self.types().to_vec();
        let mut data = Map::new();
        for (col, name) in self.header().iter().enumerate() {
            let cells: Vec<&str> = rows.iter().map(|r| r.get(col).unwrap_or("")).collect();
            let values = types[col].classify_all(&cells)?;
            data.insert(
                name.clone(),
                Value::Array(values.into_iter().map(Value::from).collect()),
            );
        }
        let bytes = serde_json::to_vec(&Value::Object(data))?;
        Ok((rows.len(), bytes))
    }

    /// Record orientation is a single pass: each row is classified under
    /// the running type states at the moment it is read and emitted
    /// immediately, without buffering the document.
    fn to_json_records(&mut self, limit: usize) -> Result<(usize, Vec<u8>)> {
        self.ensure_header()?;
        let mut out = vec![b'['];
        let mut consumed = 0;
        while consumed < limit {
            let record = match self.read_record()? {
                Some(record) => record,
                None if consumed == 0 => return Err(Error::EmptyInput),
                None => break,
            };
            let mut row = Map::new();
            for ((name, ty), field) in self
                .header()
                .iter()
                .zip(self.types())
                .zip(record.iter())
            {
                row.insert(name.clone(), ty.classify(field)?.into());
            }
            if consumed > 0 {
                out.push(b',');
            }
            serde_json::to_writer(&mut out, &Value::Object(row))?;
            consumed += 1;
        }
        out.push(b']');
        Ok((consumed, out))
    }
}
