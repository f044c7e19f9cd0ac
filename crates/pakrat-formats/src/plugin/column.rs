//! Column descriptors consumed by listings and exporters

use crate::resource::Resource;
use serde::Serialize;

/// One displayable attribute of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    /// Single-character code
    pub code: char,
    /// Header text
    pub name: &'static str,
}

impl Column {
    /// Describe a column
    pub const fn new(code: char, name: &'static str) -> Self {
        Self { code, name }
    }
}

/// Path inside the container
pub const PATH: Column = Column::new('P', "Filename");
/// Stored offset
pub const OFFSET: Column = Column::new('O', "Offset");
/// Stored length
pub const LENGTH: Column = Column::new('L', "Length");
/// Decoded length
pub const DECOMPRESSED: Column = Column::new('D', "Decompressed Length");
/// Compression method
pub const COMPRESSION: Column = Column::new('C', "Compression");
/// File extension
pub const EXTENSION: Column = Column::new('E', "Extension");
/// FNV-1a name hash
pub const NAME_HASH: Column = Column::new('H', "Name Hash");

/// Columns every plugin supports
pub fn generic_columns() -> Vec<Column> {
    vec![
        PATH,
        OFFSET,
        LENGTH,
        DECOMPRESSED,
        COMPRESSION,
        EXTENSION,
        NAME_HASH,
    ]
}

/// Value of a generic column, or `None` for codes this function doesn't know
pub fn generic_value(resource: &Resource, column: char) -> Option<String> {
    match column {
        'P' => Some(resource.name.clone()),
        'O' => Some(resource.offset.to_string()),
        'L' => Some(resource.compressed_length.to_string()),
        'D' => Some(resource.decompressed_length.to_string()),
        'C' => Some(resource.compression.to_string()),
        'E' => Some(resource.extension().unwrap_or_default()),
        'H' => Some(format!("{:016x}", resource.name_hash())),
        _ => None,
    }
}
