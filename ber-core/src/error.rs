use thiserror::Error;

/// Main error type for BER/DER codec operations
///
/// The four kinds are deliberately coarse: callers only ever branch on
/// whether data is malformed, too large, truncated, or hit an internal
/// defect. Errors are `Clone` so the stream can record one and replay it
/// on every subsequent operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Asn1Error {
    /// Wrong tag, bad length-of-length, malformed fixed-format content
    #[error("bad data: {0}")]
    BadData(String),

    /// A value or length exceeds a hard ceiling
    #[error("overflow: {0}")]
    Overflow(String),

    /// Stream exhausted before the declared length was satisfied
    #[error("underflow: {0}")]
    Underflow(String),

    /// An invariant the implementation must guarantee was violated.
    /// Always a defect, never user-triggerable.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Asn1Error {
    /// Whether the error indicates definitively malformed data, as opposed
    /// to data that is merely incomplete so far. Streaming callers use this
    /// to tell truncated input apart from garbage.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Asn1Error::Underflow(_))
    }
}

/// Result type alias for BER/DER codec operations
pub type Asn1Result<T> = Result<T, Asn1Error>;
