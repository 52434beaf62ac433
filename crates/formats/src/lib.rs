pub mod directory;
pub mod records;

pub use directory::*;
pub use records::*;

/// Failure to decode a dataset or directory resource.
///
/// Malformed cells are never an error; they decode as missing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    Json(String),
    NotAnArray,
    Empty,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::Json(msg) => write!(f, "invalid json: {msg}"),
            RecordError::NotAnArray => write!(f, "expected a json array of records"),
            RecordError::Empty => write!(f, "resource contains no records"),
        }
    }
}

impl std::error::Error for RecordError {}
