//! CSV <-> JSON conversion with progressive per-column type inference.
//!
//! [`Reader`] streams a delimited document, locks its header row, and infers
//! a type for every column from the values it sees; [`Reader::to_json`]
//! emits the data in either a column-oriented or record-oriented JSON
//! layout. [`CsvSession`] goes the other way, accepting either JSON layout
//! and producing delimited text, locking the header set on first use so
//! successive payloads feed one coherent tabular stream.

pub mod error;
pub mod infer;
pub mod read;
pub mod to_csv;
pub mod to_json;

pub use error::{Error, Result};
pub use infer::{ColumnType, ScalarValue};
pub use read::Reader;
pub use to_csv::CsvSession;
pub use to_json::Orient;
