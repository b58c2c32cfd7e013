use crate::util::constants::*;
use crate::util::Address;

/* Alignment */

pub fn is_address_aligned(addr: Address) -> bool {
    addr.is_aligned_to(BYTES_IN_ADDRESS)
}

pub fn word_align_down(address: Address) -> Address {
    address.align_down(BYTES_IN_WORD)
}

pub fn word_align_up(address: Address) -> Address {
    address.align_up(BYTES_IN_WORD)
}

pub const fn raw_align_up(val: usize, align: usize) -> usize {
    // See https://github.com/rust-lang/rust/blob/e620d0f337d0643c757bab791fc7d88d63217704/src/libcore/alloc.rs#L192
    val.wrapping_add(align).wrapping_sub(1) & !align.wrapping_sub(1)
}

pub const fn raw_align_down(val: usize, align: usize) -> usize {
    val & !align.wrapping_sub(1)
}

pub const fn raw_is_aligned(val: usize, align: usize) -> bool {
    val & align.wrapping_sub(1) == 0
}

/* Conversion */

pub const fn bytes_to_words_up(bytes: usize) -> usize {
    (bytes + BYTES_IN_WORD - 1) >> LOG_BYTES_IN_WORD
}
