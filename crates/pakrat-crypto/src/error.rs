//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No password was supplied to a key derivation
    #[error("password is required for key derivation")]
    MissingPassword,

    /// PBKDF2 iteration count must be at least one
    #[error("invalid iteration count: {0}")]
    InvalidIterationCount(u32),

    /// The pseudorandom function rejected the password as a key
    #[error("password cannot key the pseudorandom function")]
    InvalidPrfKey,

    /// Requested derived key is longer than PBKDF2 can produce
    #[error("derived key too long: {0} bytes")]
    DerivedKeyTooLong(usize),
}
