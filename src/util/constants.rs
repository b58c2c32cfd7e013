/// log2 of the number of bytes in a compressed reference (a 32-bit int)
pub const LOG_BYTES_IN_COMPRESSED_REFERENCE: u8 = 2;
/// The number of bytes in a compressed reference
pub const BYTES_IN_COMPRESSED_REFERENCE: usize = 1 << LOG_BYTES_IN_COMPRESSED_REFERENCE;

#[cfg(target_pointer_width = "32")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 2;
#[cfg(target_pointer_width = "64")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 3;
/// The number of bytes in an address
pub const BYTES_IN_ADDRESS: usize = 1 << LOG_BYTES_IN_ADDRESS;

/// log2 of the number of bytes in a word
pub const LOG_BYTES_IN_WORD: u8 = LOG_BYTES_IN_ADDRESS;
/// The number of bytes in a word
pub const BYTES_IN_WORD: usize = 1 << LOG_BYTES_IN_WORD;

