use std::fmt;

use bytemuck::NoUninit;

use crate::util::conversions;
use crate::util::Address;

/// A contiguous range of heap memory `[start, start + byte_size)`.
///
/// The barrier set records the region of the heap it covers, and the array and region
/// post-write barriers describe what was written as a `MemRegion`.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, NoUninit)]
pub struct MemRegion {
    start: Address,
    byte_size: usize,
}

impl MemRegion {
    /// The empty region at address zero.
    pub const EMPTY: Self = MemRegion {
        start: Address::ZERO,
        byte_size: 0,
    };

    pub const fn new(start: Address, byte_size: usize) -> Self {
        MemRegion { start, byte_size }
    }

    /// Create the region `[start, end)`. `end` must not be lower than `start`.
    pub fn from_range(start: Address, end: Address) -> Self {
        assert!(
            start <= end,
            "invalid region: start {} is above end {}",
            start,
            end
        );
        MemRegion {
            start,
            byte_size: end - start,
        }
    }

    pub const fn start(&self) -> Address {
        self.start
    }

    pub const fn end(&self) -> Address {
        self.start.add(self.byte_size)
    }

    /// The last byte in the region. Must not be called on an empty region.
    pub fn last(&self) -> Address {
        debug_assert!(!self.is_empty());
        self.end() - 1usize
    }

    pub const fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Size in words, rounded up.
    pub const fn word_size(&self) -> usize {
        conversions::bytes_to_words_up(self.byte_size)
    }

    pub const fn is_empty(&self) -> bool {
        self.byte_size == 0
    }

    pub fn contains_address(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end()
    }

    /// Is `other` entirely within this region? The empty region is contained everywhere.
    pub fn contains(&self, other: &MemRegion) -> bool {
        other.is_empty() || (other.start >= self.start && other.end() <= self.end())
    }

    /// The overlap of the two regions. Disjoint regions give an empty region.
    pub fn intersection(&self, other: &MemRegion) -> MemRegion {
        let start = std::cmp::max(self.start, other.start);
        let end = std::cmp::min(self.end(), other.end());
        if start < end {
            MemRegion::from_range(start, end)
        } else {
            MemRegion::new(start, 0)
        }
    }

    /// The smallest region covering both regions. The two regions must overlap or touch.
    pub fn union(&self, other: &MemRegion) -> MemRegion {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        assert!(
            self.start <= other.end() && other.start <= self.end(),
            "the union of {} and {} is not contiguous",
            self,
            other
        );
        MemRegion::from_range(
            std::cmp::min(self.start, other.start),
            std::cmp::max(self.end(), other.end()),
        )
    }

    /// Grow the region so that both ends are aligned to `align`.
    pub fn align_outward(&self, align: usize) -> MemRegion {
        MemRegion::from_range(self.start.align_down(align), self.end().align_up(align))
    }
}

impl fmt::Display for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

impl fmt::Debug for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MemRegion[{}, {})", self.start, self.end())
    }
}
