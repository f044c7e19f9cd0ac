//! Inflate error types

use thiserror::Error;

/// Errors raised while building Huffman tables or decoding deflate data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InflateError {
    /// Input ended before the final block was complete
    #[error("unexpected end of compressed data")]
    UnexpectedEof,

    /// Reserved block type 3
    #[error("invalid block type: {0}")]
    InvalidBlockType(u32),

    /// Stored block length and its complement disagree
    #[error("stored block length mismatch: {len:#06x} vs complement {nlen:#06x}")]
    StoredLengthMismatch {
        /// LEN field
        len: u16,
        /// NLEN field
        nlen: u16,
    },

    /// More symbols than the table can hold
    #[error("too many symbols: {0} (maximum 288)")]
    TooManySymbols(usize),

    /// A code length above 15
    #[error("code length {length} for symbol {symbol} exceeds 15")]
    CodeLengthTooLong {
        /// Offending symbol
        symbol: usize,
        /// Its length
        length: u8,
    },

    /// More codes than a prefix code allows
    #[error("over-subscribed code lengths")]
    OverSubscribed,

    /// A code set that must be complete is not
    #[error("incomplete code lengths")]
    Incomplete,

    /// Bit pattern not assigned to any symbol
    #[error("invalid Huffman code")]
    InvalidCode,

    /// Dynamic block header is inconsistent
    #[error("invalid dynamic block header: {0}")]
    InvalidHeader(&'static str),

    /// Decoded symbol outside the alphabet
    #[error("invalid symbol: {0}")]
    InvalidSymbol(u16),

    /// Back-reference before the start of output
    #[error("distance {distance} too far back (output is {available} bytes)")]
    DistanceTooFar {
        /// Requested distance
        distance: usize,
        /// Bytes decoded so far
        available: usize,
    },

    /// Output would exceed the configured limit
    #[error("decompressed size exceeds limit of {0} bytes")]
    OutputLimit(usize),

    /// zlib header is not deflate or fails its check
    #[error("invalid zlib header: {0:02x} {1:02x}")]
    InvalidZlibHeader(u8, u8),

    /// Preset dictionaries are not supported
    #[error("zlib preset dictionary is not supported")]
    PresetDictionary,

    /// Adler-32 trailer does not match the output
    #[error("adler32 mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Trailer value
        expected: u32,
        /// Computed value
        actual: u32,
    },
}

/// Result type for inflate operations
pub type InflateResult<T> = Result<T, InflateError>;
