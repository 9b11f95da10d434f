//! Protocol error types.

use thiserror::Error;

/// Errors from encoding, decoding or interpreting admin messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("bencode error: {0}")]
    Bencode(#[from] serde_bencode::Error),

    #[error("expected a dictionary at top level")]
    NotADictionary,

    #[error("field '{field}' has unexpected type, expected {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
}
