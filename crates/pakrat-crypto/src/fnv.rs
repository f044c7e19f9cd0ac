//! Fowler-Noll-Vo hash family
//!
//! Four variants share one accumulator shape and differ only in word width
//! and in whether the input byte is mixed in before (FNV-1a) or after
//! (FNV-1) the multiply by the FNV prime. The multiply itself is done with a
//! fixed shift-add sequence.
//!
//! These hashes are used for name lookups, never for integrity.

use std::fmt;

/// 32-bit offset basis
pub const FNV32_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// 64-bit offset basis
pub const FNV64_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;

/// Incremental hash accumulator
///
/// `init` restarts from the offset basis; `update` continues from the current
/// state, so `init(a)` followed by `update(b)` equals `init(a ++ b)`.
pub trait FnvHasher: Default {
    /// Hash word type
    type Output: Copy + Eq + fmt::LowerHex;

    /// Reset the state and hash `data`
    fn init(&mut self, data: &[u8]) {
        self.reset();
        self.update(data);
    }

    /// Continue hashing `data` onto the current state
    fn update(&mut self, data: &[u8]);

    /// Reset to the offset basis
    fn reset(&mut self);

    /// Current hash value
    fn hash(&self) -> Self::Output;

    /// One-shot hash of `data`
    fn digest(data: &[u8]) -> Self::Output {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.hash()
    }
}

/// Multiply by 16777619 (2^24 + 2^8 + 0x93)
#[inline]
const fn mul_prime32(h: u32) -> u32 {
    h.wrapping_add(h << 1)
        .wrapping_add(h << 4)
        .wrapping_add(h << 7)
        .wrapping_add(h << 8)
        .wrapping_add(h << 24)
}

/// Multiply by 1099511628211 (2^40 + 0x1b3)
#[inline]
const fn mul_prime64(h: u64) -> u64 {
    h.wrapping_add(h << 1)
        .wrapping_add(h << 4)
        .wrapping_add(h << 5)
        .wrapping_add(h << 7)
        .wrapping_add(h << 8)
        .wrapping_add(h << 40)
}

macro_rules! fnv_variant {
    ($(#[$meta:meta])* $name:ident, $word:ty, $basis:expr, $mul:ident, xor_first = $xor_first:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            state: $word,
        }

        impl Default for $name {
            fn default() -> Self {
                Self { state: $basis }
            }
        }

        impl FnvHasher for $name {
            type Output = $word;

            #[inline]
            fn update(&mut self, data: &[u8]) {
                let mut h = self.state;
                for &byte in data {
                    if $xor_first {
                        h ^= <$word>::from(byte);
                        h = $mul(h);
                    } else {
                        h = $mul(h);
                        h ^= <$word>::from(byte);
                    }
                }
                self.state = h;
            }

            fn reset(&mut self) {
                self.state = $basis;
            }

            fn hash(&self) -> $word {
                self.state
            }
        }

        impl std::hash::Hasher for $name {
            fn finish(&self) -> u64 {
                u64::from(self.state)
            }

            fn write(&mut self, bytes: &[u8]) {
                self.update(bytes);
            }
        }
    };
}

fnv_variant!(
    /// FNV-1, 32-bit
    Fnv1_32, u32, FNV32_OFFSET_BASIS, mul_prime32, xor_first = false
);
fnv_variant!(
    /// FNV-1a, 32-bit
    Fnv1a32, u32, FNV32_OFFSET_BASIS, mul_prime32, xor_first = true
);
fnv_variant!(
    /// FNV-1, 64-bit
    Fnv1_64, u64, FNV64_OFFSET_BASIS, mul_prime64, xor_first = false
);
fnv_variant!(
    /// FNV-1a, 64-bit
    Fnv1a64, u64, FNV64_OFFSET_BASIS, mul_prime64, xor_first = true
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::hash::BuildHasherDefault;

    #[test]
    fn test_shift_add_matches_multiply() {
        for h in [0u32, 1, 0x811C_9DC5, u32::MAX, 0xDEAD_BEEF] {
            assert_eq!(mul_prime32(h), h.wrapping_mul(16_777_619));
        }
        for h in [0u64, 1, FNV64_OFFSET_BASIS, u64::MAX, 0x0123_4567_89AB_CDEF] {
            assert_eq!(mul_prime64(h), h.wrapping_mul(1_099_511_628_211));
        }
    }

    #[test]
    fn test_empty_is_offset_basis() {
        assert_eq!(Fnv1_32::digest(b""), FNV32_OFFSET_BASIS);
        assert_eq!(Fnv1a32::digest(b""), FNV32_OFFSET_BASIS);
        assert_eq!(Fnv1_64::digest(b""), FNV64_OFFSET_BASIS);
        assert_eq!(Fnv1a64::digest(b""), FNV64_OFFSET_BASIS);
    }

    #[test]
    fn test_known_vectors() {
        let test_cases: [(&[u8], u32, u32, u64, u64); 3] = [
            (b"a", 0x050c_5d7e, 0xe40c_292c, 0xaf63_bd4c_8601_b7be, 0xaf63_dc4c_8601_ec8c),
            (
                b"foobar",
                0x31f0_b262,
                0xbf9c_f968,
                0x340d_8765_a4dd_a9c2,
                0x8594_4171_f739_67e8,
            ),
            (
                b"Hello, world!",
                0xe84e_ad66,
                0xed90_f094,
                0x6519_bd63_89aa_a166,
                0x38d1_3341_4498_7bf4,
            ),
        ];

        for (data, fnv1_32, fnv1a_32, fnv1_64, fnv1a_64) in test_cases {
            assert_eq!(Fnv1_32::digest(data), fnv1_32);
            assert_eq!(Fnv1a32::digest(data), fnv1a_32);
            assert_eq!(Fnv1_64::digest(data), fnv1_64);
            assert_eq!(Fnv1a64::digest(data), fnv1a_64);
        }
    }

    #[test]
    fn test_init_resets_state() {
        let mut hasher = Fnv1a32::default();
        hasher.update(b"garbage");
        hasher.init(b"foobar");
        assert_eq!(hasher.hash(), 0xbf9c_f968);
    }

    #[test]
    fn test_std_hasher() {
        let mut map: HashMap<&str, u32, BuildHasherDefault<Fnv1a64>> = HashMap::default();
        map.insert("war3map.j", 1);
        map.insert("war3map.w3e", 2);
        assert_eq!(map.get("war3map.j"), Some(&1));
        assert_eq!(map.get("war3map.w3e"), Some(&2));
    }

    proptest! {
        #[test]
        fn prop_update_equals_concatenation(a in proptest::collection::vec(any::<u8>(), 0..64),
                                            b in proptest::collection::vec(any::<u8>(), 0..64)) {
            let joined: Vec<u8> = a.iter().chain(b.iter()).copied().collect();

            let mut h32 = Fnv1_32::default();
            h32.init(&a);
            h32.update(&b);
            prop_assert_eq!(h32.hash(), Fnv1_32::digest(&joined));

            let mut h64 = Fnv1a64::default();
            h64.init(&a);
            h64.update(&b);
            prop_assert_eq!(h64.hash(), Fnv1a64::digest(&joined));
        }

        #[test]
        fn prop_deterministic(data in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assert_eq!(Fnv1a32::digest(&data), Fnv1a32::digest(&data));
            prop_assert_eq!(Fnv1_64::digest(&data), Fnv1_64::digest(&data));
        }

        #[test]
        fn prop_variants_diverge(data in proptest::collection::vec(any::<u8>(), 2..64)) {
            prop_assert_ne!(Fnv1a64::digest(&data), Fnv1_64::digest(&data));
        }

        #[test]
        fn prop_hash32_fits_in_32_bits(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let value = u64::from(Fnv1_32::digest(&data));
            prop_assert!(value < (1u64 << 32));
        }
    }
}
