//! `pakrat derive-key`

use crate::OutputFormat;
use anyhow::{Context, Result};
use pakrat_crypto::pbkdf2::{HashAlgorithm, Pbkdf2};
use serde_json::json;

/// Key derivation parameters
#[derive(Debug, Clone)]
pub struct DeriveRequest<'a> {
    /// Password text
    pub password: &'a str,
    /// Hex-encoded salt
    pub salt_hex: &'a str,
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Output length in bytes; 0 means the digest length
    pub length: usize,
    /// HMAC hash name
    pub algorithm: &'a str,
    /// Encode the password as Latin-1 instead of UTF-8
    pub latin1: bool,
}

/// Derive a key, returning it hex-encoded
pub fn derive(request: &DeriveRequest<'_>) -> Result<String> {
    let salt = hex::decode(request.salt_hex).context("salt is not valid hex")?;
    let algorithm = HashAlgorithm::from_name(request.algorithm)
        .with_context(|| format!("unknown hash algorithm {}", request.algorithm))?;

    let key = Pbkdf2::new(salt, request.iterations, Some(algorithm)).derive_key(
        Some(request.password),
        request.length,
        !request.latin1,
    )?;
    Ok(hex::encode(key))
}

/// Print a derived key
pub fn handle(request: &DeriveRequest<'_>, format: OutputFormat) -> Result<()> {
    let key = derive(request)?;
    match format {
        OutputFormat::Text => println!("{key}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "algorithm": request.algorithm,
                "iterations": request.iterations,
                "key": key,
            }))?
        ),
    }
    Ok(())
}
