//! pakrat command-line library
//!
//! Command handlers and helpers behind the `pakrat` binary.

pub mod commands;
pub mod config;
pub mod output;

use clap::ValueEnum;

/// How command results are printed
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables and plain text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Hash functions the `hash` command exposes
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashKind {
    /// 32-bit FNV-1
    #[value(name = "fnv1-32")]
    Fnv1_32,
    /// 32-bit FNV-1a
    #[value(name = "fnv1a-32")]
    Fnv1a32,
    /// 64-bit FNV-1
    #[value(name = "fnv1-64")]
    Fnv1_64,
    /// 64-bit FNV-1a
    #[value(name = "fnv1a-64")]
    Fnv1a64,
    /// MPQ hash-table offset hash
    MpqOffset,
    /// MPQ first name check hash
    MpqA,
    /// MPQ second name check hash
    MpqB,
    /// MPQ entry key hash
    MpqKey,
}
