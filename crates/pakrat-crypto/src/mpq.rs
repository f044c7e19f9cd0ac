//! Keyed 32-bit block stream cipher used by MPQ containers
//!
//! Data is processed as little-endian 32-bit words. The key and an internal
//! seed are advanced after every word, so the same plaintext word encrypts
//! differently depending on its position.
//!
//! A trailing partial word (1-3 bytes) is never transformed. Containers rely
//! on this, so it must not be "fixed".
//!
//! ## Usage
//!
//! ```rust
//! use pakrat_crypto::mpq::{Direction, MpqCipher};
//!
//! let mut data = b"Hello, MPQ world!!!!".to_vec();
//! MpqCipher::new(0xC3AF_3770, Direction::Encrypt).apply(&mut data);
//! MpqCipher::new(0xC3AF_3770, Direction::Decrypt).apply(&mut data);
//! assert_eq!(&data, b"Hello, MPQ world!!!!");
//! ```

use crate::lut::{CryptoLut, HashType};

/// Seed every cipher session starts from
pub const INITIAL_SEED: u32 = 0xEEEE_EEEE;

/// Block size in bytes
pub const BLOCK_SIZE: usize = 4;

/// Whether the cipher feeds plaintext or ciphertext back into its seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input is plaintext
    Encrypt,
    /// Input is ciphertext
    Decrypt,
}

/// Cipher state for one encrypt or decrypt session
///
/// Never share one instance between two streams; create a fresh cipher (or
/// call [`MpqCipher::change_key`]) per entry.
#[derive(Debug, Clone)]
pub struct MpqCipher<'a> {
    lut: &'a CryptoLut,
    key: u32,
    seed: u32,
    direction: Direction,
}

impl MpqCipher<'static> {
    /// Create a cipher backed by the shared lookup tables
    pub fn new(key: u32, direction: Direction) -> Self {
        Self::with_lut(CryptoLut::shared(), key, direction)
    }
}

impl<'a> MpqCipher<'a> {
    /// Create a cipher backed by an explicit set of lookup tables
    pub fn with_lut(lut: &'a CryptoLut, key: u32, direction: Direction) -> Self {
        Self {
            lut,
            key,
            seed: INITIAL_SEED,
            direction,
        }
    }

    /// Reset the session with a new key and direction
    pub fn change_key(&mut self, key: u32, direction: Direction) {
        self.key = key;
        self.seed = INITIAL_SEED;
        self.direction = direction;
    }

    /// Current key
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Current direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Transform one word and advance the state
    #[inline]
    pub fn process_word(&mut self, input: u32) -> u32 {
        self.seed = self
            .seed
            .wrapping_add(self.lut.lookup(HashType::Encryption, self.key as u8));
        let output = input ^ self.key.wrapping_add(self.seed);

        let plain = match self.direction {
            Direction::Encrypt => input,
            Direction::Decrypt => output,
        };

        self.seed = self
            .seed
            .wrapping_add(plain)
            .wrapping_add(self.seed << 5)
            .wrapping_add(3);
        self.key = ((!self.key) << 21).wrapping_add(0x1111_1111) | (self.key >> 11);

        output
    }

    /// Transform `data` in place
    ///
    /// Only whole 4-byte words are touched; up to three trailing bytes pass
    /// through unchanged.
    pub fn apply(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            chunk.copy_from_slice(&self.process_word(word).to_le_bytes());
        }
    }

    /// Transform already-decoded words in place
    pub fn apply_words(&mut self, words: &mut [u32]) {
        for word in words {
            *word = self.process_word(*word);
        }
    }
}

/// Encrypt `data` in place with a fresh session
pub fn encrypt_block(data: &mut [u8], key: u32) {
    MpqCipher::new(key, Direction::Encrypt).apply(data);
}

/// Decrypt `data` in place with a fresh session
pub fn decrypt_block(data: &mut [u8], key: u32) {
    MpqCipher::new(key, Direction::Decrypt).apply(data);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_vector() {
        let mut data = b"Hello, MPQ world!!!!".to_vec();
        encrypt_block(&mut data, 0xC3AF_3770);
        assert_eq!(hex::encode(&data), "84aa50ea4fa019994c9689d0f82c7edcc381c48c");

        decrypt_block(&mut data, 0xC3AF_3770);
        assert_eq!(&data, b"Hello, MPQ world!!!!");
    }

    #[test]
    fn test_zero_key_zero_data() {
        let mut data = [0u8; 8];
        encrypt_block(&mut data, 0);
        assert_eq!(hex::encode(data), "8695290810899f29");
    }

    #[test]
    fn test_trailing_bytes_pass_through() {
        let mut data = b"abcdefgXYZ".to_vec();
        encrypt_block(&mut data, 0x1234_5678);
        assert_eq!(&data[8..], b"XYZ");
        assert_ne!(&data[..8], b"abcdefgX");

        let mut short = b"abc".to_vec();
        encrypt_block(&mut short, 0x1234_5678);
        assert_eq!(&short, b"abc");
    }

    #[test]
    fn test_change_key_resets_state() {
        let mut fresh = b"0123456789abcdef".to_vec();
        encrypt_block(&mut fresh, 42);

        let mut cipher = MpqCipher::new(7, Direction::Decrypt);
        let mut scratch = [1u8; 12];
        cipher.apply(&mut scratch);

        cipher.change_key(42, Direction::Encrypt);
        let mut rekeyed = b"0123456789abcdef".to_vec();
        cipher.apply(&mut rekeyed);

        assert_eq!(fresh, rekeyed);
    }

    #[test]
    fn test_words_match_bytes() {
        let bytes: Vec<u8> = (0u8..32).collect();
        let mut words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();

        let mut encrypted = bytes.clone();
        encrypt_block(&mut encrypted, 0xEC83_B3A3);
        MpqCipher::new(0xEC83_B3A3, Direction::Encrypt).apply_words(&mut words);

        let from_words: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(encrypted, from_words);
    }

    #[test]
    fn test_injected_lut() {
        let lut = CryptoLut::generate();
        let mut a = b"injected tables!".to_vec();
        let mut b = a.clone();
        MpqCipher::with_lut(&lut, 99, Direction::Encrypt).apply(&mut a);
        encrypt_block(&mut b, 99);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_round_trip(key in any::<u32>(), words in proptest::collection::vec(any::<u32>(), 0..64)) {
            let plain: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
            let mut data = plain.clone();
            encrypt_block(&mut data, key);
            decrypt_block(&mut data, key);
            prop_assert_eq!(data, plain);
        }

        #[test]
        fn prop_round_trip_with_tail(key in any::<u32>(), plain in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut data = plain.clone();
            encrypt_block(&mut data, key);
            let tail = plain.len() - plain.len() % BLOCK_SIZE;
            prop_assert_eq!(&data[tail..], &plain[tail..]);
            decrypt_block(&mut data, key);
            prop_assert_eq!(data, plain);
        }
    }
}
