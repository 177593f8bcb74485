use thiserror::Error;

/// Failures raised while writing to an [`EoWriter`](crate::EoWriter) or
/// navigating chunks of an [`EoReader`](crate::EoReader).
///
/// Plain reads never produce one of these: truncated or malformed input
/// decodes to fallback values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("Value {value} exceeds maximum of {max}")]
    NumberOutOfRange {
        value: u64,
        max:   u64,
    },

    #[error("String {string:?} does not have expected length of {expected}")]
    FixedStringLength {
        string:   String,
        expected: usize,
    },

    #[error("Padded string {string:?} is too large for a length of {max}")]
    PaddedStringTooLong {
        string: String,
        max:    usize,
    },

    #[error("Not in chunked reading mode")]
    NotChunked,
}
