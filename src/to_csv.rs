use std::io::{self, Read};

use csv::WriterBuilder;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Reusable JSON -> CSV conversion session.
///
/// One session produces one coherent tabular stream: the header derived
/// from the first payload is locked for the session's lifetime and written
/// exactly once; every later payload must carry keys from that locked set
/// and is emitted in the locked column order without a header line. A
/// payload may be an array of row objects or a map of column arrays.
#[derive(Debug, Default)]
pub struct CsvSession {
    header: Option<Vec<String>>,
}

impl CsvSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The locked header, if a payload has been converted yet.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Converts one JSON payload to delimited text. The payload is tried
    /// as record-oriented first, then as column-oriented; anything else is
    /// `UnrecognizedShape`.
    pub fn convert<R: Read>(&mut self, mut input: R, sep: u8) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        if let Ok(records) = serde_json::from_slice::<Vec<Map<String, Value>>>(&data) {
            debug!(rows = records.len(), "record-oriented payload");
            return self.records_to_csv(&records, sep);
        }
        let columns = serde_json::from_slice::<Map<String, Value>>(&data)
            .ok()
            .filter(|m| m.values().all(Value::is_array))
            .ok_or(Error::UnrecognizedShape)?;
        debug!(columns = columns.len(), "column-oriented payload");
        self.columns_to_csv(&columns, sep)
    }

    fn records_to_csv(&mut self, records: &[Map<String, Value>], sep: u8) -> Result<Vec<u8>> {
        // first-seen order across all rows determines column order
        let mut seen: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !seen.contains(key) {
                    seen.push(key.clone());
                }
            }
        }

        let mut w = WriterBuilder::new().delimiter(sep).from_writer(Vec::new());
        let header = match &self.header {
            None => {
                w.write_record(&seen)?;
                self.header = Some(seen.clone());
                seen
            }
            Some(locked) => {
                for key in &seen {
                    if !locked.contains(key) {
                        return Err(Error::UnexpectedKey(key.clone()));
                    }
                }
                locked.clone()
            }
        };

        for record in records {
            let row: Vec<String> = header
                .iter()
                .map(|name| record.get(name).map_or_else(String::new, render_cell))
                .collect();
            w.write_record(&row)?;
        }
        finish(w)
    }

    fn columns_to_csv(&mut self, columns: &Map<String, Value>, sep: u8) -> Result<Vec<u8>> {
        let keys: Vec<String> = columns.keys().cloned().collect();

        let mut w = WriterBuilder::new().delimiter(sep).from_writer(Vec::new());
        let header = match &self.header {
            None => {
                w.write_record(&keys)?;
                self.header = Some(keys.clone());
                keys
            }
            Some(locked) => {
                // checked both ways: no extra keys, no missing keys
                let extra = keys.iter().any(|k| !locked.contains(k));
                let missing = locked.iter().any(|k| !columns.contains_key(k));
                if extra || missing {
                    return Err(Error::HeaderMismatch);
                }
                locked.clone()
            }
        };

        let n_rows = columns
            .values()
            .map(|v| v.as_array().map_or(0, Vec::len))
            .max()
            .unwrap_or(0);

        for i in 0..n_rows {
            let row: Vec<String> = header
                .iter()
                .map(|name| {
                    columns
                        .get(name)
                        .and_then(Value::as_array)
                        // an array shorter than the row count yields empty
                        // trailing cells
                        .and_then(|values| values.get(i))
                        .map_or_else(String::new, render_cell)
                })
                .collect();
            w.write_record(&row)?;
        }
        finish(w)
    }
}

/// Renders one JSON value as a cell: plain decimal for integers,
/// fixed-point for floats, empty for null, verbatim for strings, and the
/// compact JSON text as a generic fallback for everything else.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map_or_else(|| n.to_string(), |f| format!("{f:.6}"))
            }
        }
        other => {
            warn!(%other, "no tabular rendering for this JSON type, using its JSON text");
            other.to_string()
        }
    }
}

fn finish(w: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    w.into_inner()
        .map_err(|e| Error::Io(io::Error::other(e.to_string())))
}
