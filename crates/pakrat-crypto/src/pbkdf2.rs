//! Password-based key derivation (PBKDF2, RFC 2898)
//!
//! The pseudorandom function is pluggable through [`PseudoRandomFunction`];
//! [`HmacPrf`] covers the HMAC constructions archive formats use in practice.
//!
//! ## Usage
//!
//! ```rust
//! use pakrat_crypto::pbkdf2::{HashAlgorithm, Pbkdf2};
//!
//! let kdf = Pbkdf2::new(b"salt".to_vec(), 2, Some(HashAlgorithm::Sha1));
//! let key = kdf.derive_key(Some("password"), 20, true).expect("password supplied");
//! assert_eq!(hex::encode(key), "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957");
//! ```

use crate::error::CryptoError;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;

/// Hash function underneath the HMAC pseudorandom function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// MD5 (16-byte output)
    Md5,
    /// SHA-1 (20-byte output)
    #[default]
    Sha1,
    /// SHA-256 (32-byte output)
    Sha256,
    /// SHA-512 (64-byte output)
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes
    pub const fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Parse an algorithm name such as `sha256` or `SHA-1`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

/// A pseudorandom function keyed once per derivation
pub trait PseudoRandomFunction {
    /// The PRF bound to a key
    type Keyed: KeyedPrf;

    /// Output length in bytes
    fn output_len(&self) -> usize;

    /// Bind the function to `key`
    fn init(&self, key: &[u8]) -> Result<Self::Keyed, CryptoError>;
}

/// A keyed pseudorandom function
pub trait KeyedPrf {
    /// Compute the function over `data`
    fn compute(&self, data: &[u8]) -> Vec<u8>;
}

/// HMAC over a selectable [`HashAlgorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacPrf {
    algorithm: HashAlgorithm,
}

impl HmacPrf {
    /// HMAC with the given hash
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Underlying hash
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

/// HMAC state with the key already absorbed
#[derive(Clone)]
pub enum KeyedHmac {
    /// HMAC-MD5
    Md5(Hmac<Md5>),
    /// HMAC-SHA1
    Sha1(Hmac<Sha1>),
    /// HMAC-SHA256
    Sha256(Hmac<Sha256>),
    /// HMAC-SHA512
    Sha512(Hmac<Sha512>),
}

fn finish<M: Mac + Clone>(mac: &M, data: &[u8]) -> Vec<u8> {
    let mut mac = mac.clone();
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

impl KeyedPrf for KeyedHmac {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5(mac) => finish(mac, data),
            Self::Sha1(mac) => finish(mac, data),
            Self::Sha256(mac) => finish(mac, data),
            Self::Sha512(mac) => finish(mac, data),
        }
    }
}

impl PseudoRandomFunction for HmacPrf {
    type Keyed = KeyedHmac;

    fn output_len(&self) -> usize {
        self.algorithm.output_len()
    }

    fn init(&self, key: &[u8]) -> Result<KeyedHmac, CryptoError> {
        // HMAC accepts keys of any length
        let invalid = |_| CryptoError::InvalidPrfKey;
        Ok(match self.algorithm {
            HashAlgorithm::Md5 => KeyedHmac::Md5(Hmac::new_from_slice(key).map_err(invalid)?),
            HashAlgorithm::Sha1 => KeyedHmac::Sha1(Hmac::new_from_slice(key).map_err(invalid)?),
            HashAlgorithm::Sha256 => {
                KeyedHmac::Sha256(Hmac::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha512 => {
                KeyedHmac::Sha512(Hmac::new_from_slice(key).map_err(invalid)?)
            }
        })
    }
}

/// PBKDF2 parameters bound to a pseudorandom function
///
/// Derivation is a pure function of the parameters and the password; one
/// instance can serve any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Pbkdf2<P = HmacPrf> {
    salt: Vec<u8>,
    iterations: u32,
    prf: P,
}

impl Pbkdf2<HmacPrf> {
    /// PBKDF2 over HMAC; `None` selects SHA-1
    pub fn new(salt: Vec<u8>, iterations: u32, algorithm: Option<HashAlgorithm>) -> Self {
        Self::with_prf(salt, iterations, HmacPrf::new(algorithm.unwrap_or_default()))
    }
}

impl<P: PseudoRandomFunction> Pbkdf2<P> {
    /// PBKDF2 over a custom pseudorandom function
    pub fn with_prf(salt: Vec<u8>, iterations: u32, prf: P) -> Self {
        Self {
            salt,
            iterations,
            prf,
        }
    }

    /// Salt
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Iteration count
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Derive `len` bytes from a password
    ///
    /// The password is encoded as UTF-8 when `use_utf8` is set, otherwise as
    /// Latin-1 with `?` for characters outside it. A `len` of zero yields the
    /// PRF's output length.
    pub fn derive_key(
        &self,
        password: Option<&str>,
        len: usize,
        use_utf8: bool,
    ) -> Result<Vec<u8>, CryptoError> {
        let password = password.ok_or(CryptoError::MissingPassword)?;
        let bytes = if use_utf8 {
            password.as_bytes().to_vec()
        } else {
            encode_latin1(password)
        };
        self.derive_key_bytes(&bytes, len)
    }

    /// Derive `len` bytes from an already-encoded password
    pub fn derive_key_bytes(&self, password: &[u8], len: usize) -> Result<Vec<u8>, CryptoError> {
        if self.iterations == 0 {
            return Err(CryptoError::InvalidIterationCount(self.iterations));
        }

        let block_len = self.prf.output_len();
        let len = if len == 0 { block_len } else { len };
        let block_count = len.div_ceil(block_len);
        if u32::try_from(block_count).is_err() {
            return Err(CryptoError::DerivedKeyTooLong(len));
        }

        let prf = self.prf.init(password)?;
        let mut output = Vec::with_capacity(block_count * block_len);
        let mut input = Vec::with_capacity(self.salt.len() + 4);

        for index in 1..=block_count as u32 {
            input.clear();
            input.extend_from_slice(&self.salt);
            input.extend_from_slice(&index.to_be_bytes());

            let mut u = prf.compute(&input);
            let mut block = u.clone();
            for _ in 1..self.iterations {
                u = prf.compute(&u);
                for (acc, byte) in block.iter_mut().zip(&u) {
                    *acc ^= byte;
                }
            }
            output.extend_from_slice(&block);
        }

        output.truncate(len);
        Ok(output)
    }
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
