use thiserror::Error;

/// Fatal errors raised while parsing or resolving a metadata.txt document.
///
/// None of these are recoverable: any error aborts the whole directory so
/// that no file is ever encoded against a partially resolved tag plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("line {line}: malformed line in metadata.txt: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("file '{filename}' referenced in metadata.txt does not exist")]
    UnknownOverrideFile { filename: String },

    #[error("invalid date {value:?} for '{filename}' (expected YYYY, YYYY-MM or YYYY-MM-DD)")]
    InvalidDateShape { filename: String, value: String },
}
