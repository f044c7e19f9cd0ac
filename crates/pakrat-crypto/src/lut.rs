//! Shared lookup tables for the MPQ hash and cipher
//!
//! Five 256-entry tables of 32-bit words are generated from a single running
//! seed. Tables 0-3 feed the string hash (one per [`HashType`]), table 4 feeds
//! the block cipher in [`crate::mpq`].
//!
//! The generator keeps only the low 16 bits of each seed advance, and every
//! container written with these tables depends on that exact arithmetic.

use std::sync::LazyLock;

/// Number of tables produced by the generator
pub const TABLE_COUNT: usize = 5;

/// Entries per table
pub const TABLE_SIZE: usize = 256;

/// Initial generator seed
const GENERATOR_SEED: u32 = 0x0010_0001;

/// Generator modulus
const GENERATOR_MODULUS: u32 = 0x002A_AAAB;

static SHARED: LazyLock<CryptoLut> = LazyLock::new(CryptoLut::generate);

/// Selects one of the five tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HashType {
    /// Position of a name in a hash table
    TableOffset = 0,
    /// First name-verification hash
    NameA = 1,
    /// Second name-verification hash
    NameB = 2,
    /// Encryption key derived from a file name
    FileKey = 3,
    /// Keystream table used by the block cipher
    Encryption = 4,
}

impl HashType {
    /// Table index of this hash type
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Five immutable 256-entry lookup tables
///
/// Use [`CryptoLut::shared`] for the process-wide instance, or
/// [`CryptoLut::generate`] to build an owned copy for injection.
#[derive(Clone, PartialEq, Eq)]
pub struct CryptoLut {
    tables: [[u32; TABLE_SIZE]; TABLE_COUNT],
}

impl CryptoLut {
    /// Generate the tables from the fixed seed
    pub fn generate() -> Self {
        let mut tables = [[0u32; TABLE_SIZE]; TABLE_COUNT];
        let mut seed = GENERATOR_SEED;

        for row in 0..TABLE_SIZE {
            for table in &mut tables {
                seed = advance(seed);
                let high = seed & 0xFFFF;
                seed = advance(seed);
                let low = seed & 0xFFFF;
                table[row] = (high << 16) | low;
            }
        }

        Self { tables }
    }

    /// Process-wide tables, generated on first use
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Look up `byte` in the table selected by `kind`
    #[inline]
    pub fn lookup(&self, kind: HashType, byte: u8) -> u32 {
        self.tables[kind.index()][byte as usize]
    }

    /// Borrow a whole table
    pub fn table(&self, kind: HashType) -> &[u32; TABLE_SIZE] {
        &self.tables[kind.index()]
    }

    /// Hash a file name with the selected table
    ///
    /// Names are case-insensitive and `/` is treated as `\`, so
    /// `units/human/footman.mdx` and `Units\Human\Footman.mdx` hash alike.
    ///
    /// # Examples
    ///
    /// ```
    /// use pakrat_crypto::lut::{CryptoLut, HashType};
    ///
    /// let lut = CryptoLut::shared();
    /// assert_eq!(lut.hash_string("(block table)", HashType::FileKey), 0xEC83_B3A3);
    /// ```
    pub fn hash_string(&self, name: &str, kind: HashType) -> u32 {
        let mut seed1: u32 = 0x7FED_7FED;
        let mut seed2: u32 = 0xEEEE_EEEE;

        for &byte in name.as_bytes() {
            let ch = normalize(byte);
            seed1 = self.lookup(kind, ch) ^ seed1.wrapping_add(seed2);
            seed2 = u32::from(ch)
                .wrapping_add(seed1)
                .wrapping_add(seed2)
                .wrapping_add(seed2 << 5)
                .wrapping_add(3);
        }

        seed1
    }

    /// Derive the encryption key of a stored file
    ///
    /// Only the final path component is hashed. With `fix_key` the key is
    /// further bound to the entry's position and size.
    pub fn file_key(&self, name: &str, offset: u32, size: u32, fix_key: bool) -> u32 {
        let base = name.rsplit(['\\', '/']).next().unwrap_or(name);
        let key = self.hash_string(base, HashType::FileKey);
        if fix_key {
            key.wrapping_add(offset) ^ size
        } else {
            key
        }
    }
}

impl std::fmt::Debug for CryptoLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoLut")
            .field("first", &format_args!("{:08x}", self.tables[0][0]))
            .finish_non_exhaustive()
    }
}

const fn advance(seed: u32) -> u32 {
    (seed * 125 + 3) % GENERATOR_MODULUS
}

const fn normalize(byte: u8) -> u8 {
    match byte {
        b'/' => b'\\',
        _ => byte.to_ascii_uppercase(),
    }
}
