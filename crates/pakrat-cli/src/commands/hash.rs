//! `pakrat hash`

use crate::{HashKind, OutputFormat};
use anyhow::Result;
use pakrat_crypto::{CryptoLut, Fnv1_32, Fnv1_64, Fnv1a32, Fnv1a64, FnvHasher, HashType};
use serde_json::json;

/// Hash `text`, returned as lower-case hex padded to the hash width
pub fn compute(kind: HashKind, text: &str) -> String {
    let lut = CryptoLut::shared();
    match kind {
        HashKind::Fnv1_32 => format!("{:08x}", Fnv1_32::digest(text.as_bytes())),
        HashKind::Fnv1a32 => format!("{:08x}", Fnv1a32::digest(text.as_bytes())),
        HashKind::Fnv1_64 => format!("{:016x}", Fnv1_64::digest(text.as_bytes())),
        HashKind::Fnv1a64 => format!("{:016x}", Fnv1a64::digest(text.as_bytes())),
        HashKind::MpqOffset => format!("{:08x}", lut.hash_string(text, HashType::TableOffset)),
        HashKind::MpqA => format!("{:08x}", lut.hash_string(text, HashType::NameA)),
        HashKind::MpqB => format!("{:08x}", lut.hash_string(text, HashType::NameB)),
        HashKind::MpqKey => format!("{:08x}", lut.hash_string(text, HashType::FileKey)),
    }
}

/// Print the hash of `text`
pub fn handle(text: &str, kind: HashKind, format: OutputFormat) -> Result<()> {
    let hash = compute(kind, text);
    match format {
        OutputFormat::Text => println!("{hash}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "input": text,
                "algorithm": format!("{kind:?}"),
                "hash": hash,
            }))?
        ),
    }
    Ok(())
}
