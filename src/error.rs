use thiserror::Error;

/// Everything that can go wrong while converting in either direction.
#[derive(Debug, Error)]
pub enum Error {
    /// `read_header` was called on a reader whose header is already locked.
    #[error("header already set")]
    HeaderAlreadySet,

    /// A data row's field count differs from the header's column count.
    /// `row` is the zero-based index of the offending row, which is also
    /// the number of rows successfully consumed before the failure.
    #[error("row {row} has {found} fields, expected {expected}")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// End of input before any data row was consumed.
    #[error("no rows to read")]
    EmptyInput,

    /// The JSON payload is neither an array of row objects nor a map of
    /// column arrays.
    #[error("JSON does not conform to a tabular layout")]
    UnrecognizedShape,

    /// A record-oriented payload carried a key outside the locked header.
    #[error("key `{0}` is not in the locked header")]
    UnexpectedKey(String),

    /// A column-oriented payload's key set diverges from the locked header.
    #[error("JSON keys do not match the locked header")]
    HeaderMismatch,

    /// A cell failed to parse under its column's committed type. Classifying
    /// only values that were previously observed cannot produce this.
    #[error("value `{value}` does not parse as {expected}")]
    MalformedValue {
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
