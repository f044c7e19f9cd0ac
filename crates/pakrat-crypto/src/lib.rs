//! Cryptographic primitives for game archive formats
//!
//! This crate provides the low-level, bit-exact algorithms that archive
//! plugins rely on when decoding container entries.
//!
//! # Components
//!
//! - **Lookup tables**: [`CryptoLut`], the five 256-entry tables shared by
//!   the MPQ string hash and the MPQ cipher
//! - **Encryption**: [`MpqCipher`], the keyed 32-bit block stream cipher
//! - **Hashing**: the FNV-1/FNV-1a family in 32 and 64 bit widths
//! - **Key derivation**: PBKDF2 over a pluggable HMAC pseudorandom function
//!
//! # Examples
//!
//! ## Entry keys
//!
//! ```
//! use pakrat_crypto::lut::{CryptoLut, HashType};
//!
//! let lut = CryptoLut::shared();
//! assert_eq!(lut.hash_string("(hash table)", HashType::FileKey), 0xC3AF_3770);
//! ```
//!
//! ## Decrypting a block
//!
//! ```
//! use pakrat_crypto::mpq::{decrypt_block, encrypt_block};
//!
//! let mut data = b"sixteen byte msg".to_vec();
//! encrypt_block(&mut data, 0xDEAD_BEEF);
//! decrypt_block(&mut data, 0xDEAD_BEEF);
//! assert_eq!(&data, b"sixteen byte msg");
//! ```
//!
//! ## FNV hashing
//!
//! ```
//! use pakrat_crypto::fnv::{Fnv1a64, FnvHasher};
//!
//! let mut hasher = Fnv1a64::default();
//! hasher.update(b"foo");
//! hasher.update(b"bar");
//! assert_eq!(hasher.hash(), Fnv1a64::digest(b"foobar"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod fnv;
pub mod lut;
pub mod mpq;
pub mod pbkdf2;

pub use error::CryptoError;

// Re-export commonly used types
pub use fnv::{Fnv1_32, Fnv1_64, Fnv1a32, Fnv1a64, FnvHasher};
pub use lut::{CryptoLut, HashType};
pub use mpq::{Direction, MpqCipher};
pub use pbkdf2::{HashAlgorithm, Pbkdf2, PseudoRandomFunction};
