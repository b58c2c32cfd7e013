//! Utilities used by the barrier sets and their runtime.

/// Address and reference types.
pub mod address;
/// Constants.
pub mod constants;
/// Calculation, conversion and rounding for memory related numbers.
pub mod conversions;
/// The tag set used to identify barrier set variants.
pub mod fake_rtti;
/// Descriptions of the heap.
pub mod heap;
/// Logger initialization
pub mod logger;
/// Wrapper for pointers the barrier layer passes around but never dereferences.
pub mod opaque_pointer;
/// Options for the barrier set runtime.
pub mod options;
/// Helpers that fill in for the standard library.
pub mod rust_util;


pub use self::address::Address;
pub use self::address::ObjectReference;
pub use self::opaque_pointer::*;
