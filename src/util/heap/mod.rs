//! Descriptions of the heap that barriers need to know about.

mod mem_region;

pub use self::mem_region::MemRegion;
