use thiserror::Error;

/// Errors raised by key generation, signing and key-state import.
///
/// Failed verification is not an error: verifiers return `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmssError {
    /// Every one-time key of this private key has been used. Fatal for the key.
    #[error("Key exhausted: index {index} reached capacity {capacity}")]
    KeyExhausted { index: u64, capacity: u64 },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid key state: {0}")]
    InvalidState(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The host store could not persist the advanced index; the signature was withheld.
    #[error("Failed to persist key state: {0}")]
    Persistence(String),
}
