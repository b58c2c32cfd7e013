//! This module provides the trait [`Slot`] and the reference representations that barriers
//! receive: full-width slots, compressed (narrow) slots, and ranges of slots written by a bulk
//! array store.

use std::fmt::Debug;
use std::hash::Hash;

use atomic::Atomic;

use crate::util::constants::{BYTES_IN_ADDRESS, BYTES_IN_COMPRESSED_REFERENCE};
use crate::util::conversions;
use crate::util::heap::MemRegion;
use crate::util::{Address, ObjectReference};

/// `Slot` is an abstraction for loading and storing object references in memory.
///
/// A `Slot` value *points to* a slot, and is not the slot itself.  The simplest implementation
/// ([`SimpleSlot`]) only contains the address of the slot.  A `Slot` can be
/// [copied](std::marker::Copy), and the copied `Slot` instance points to the same slot.
///
/// Barriers only care about the object reference held inside the slot.  A pre-write barrier may
/// load the value that is about to be overwritten, and tests use `store` to play the mutator's
/// part of a reference store.
///
/// # Performance notes
///
/// The methods of this trait are called on hot paths.  Please ensure they have high performance.
pub trait Slot: Copy + Send + Debug + PartialEq + Eq + Hash {
    /// Load object reference from the slot.
    ///
    /// If the slot is holding null, this method should return `None`.
    fn load(&self) -> Option<ObjectReference>;

    /// Store the object reference `object` into the slot.
    fn store(&self, object: ObjectReference);
}

/// A simple slot implementation that represents a word-sized slot which holds the raw address of
/// an `ObjectReference`, or 0 if it is holding a null reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SimpleSlot {
    slot_addr: *mut Atomic<Address>,
}

impl SimpleSlot {
    /// Create a simple slot from an address.
    ///
    /// Arguments:
    /// *   `address`: The address in memory where an `ObjectReference` is stored.
    pub fn from_address(address: Address) -> Self {
        Self {
            slot_addr: address.to_mut_ptr(),
        }
    }

    /// Get the address of the slot.
    pub fn as_address(&self) -> Address {
        Address::from_mut_ptr(self.slot_addr)
    }
}

unsafe impl Send for SimpleSlot {}
unsafe impl Sync for SimpleSlot {}

impl Slot for SimpleSlot {
    fn load(&self) -> Option<ObjectReference> {
        let addr = unsafe { (*self.slot_addr).load(atomic::Ordering::Relaxed) };
        ObjectReference::from_raw_address(addr)
    }

    fn store(&self, object: ObjectReference) {
        unsafe { (*self.slot_addr).store(object.to_raw_address(), atomic::Ordering::Relaxed) }
    }
}

/// The heap base and shift used to expand a 32-bit narrow reference to a full address.
///
/// A narrow value of 0 is null. Any other value `n` decodes to `base + (n << shift)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NarrowOopEncoding {
    pub base: Address,
    pub shift: u8,
}

impl NarrowOopEncoding {
    /// Zero-based encoding with 8-byte object alignment.
    pub const ZERO_BASED: Self = NarrowOopEncoding {
        base: Address::ZERO,
        shift: 3,
    };

    pub const fn new(base: Address, shift: u8) -> Self {
        NarrowOopEncoding { base, shift }
    }

    /// Compress a full reference.
    pub fn encode(&self, object: ObjectReference) -> u32 {
        let offset = object.to_raw_address() - self.base;
        debug_assert!(
            offset & ((1usize << self.shift) - 1) == 0,
            "{} is not aligned to the narrow reference shift {}",
            object,
            self.shift
        );
        let narrow = offset >> self.shift;
        debug_assert!(
            narrow <= u32::MAX as usize,
            "{} cannot be encoded relative to {}",
            object,
            self.base
        );
        narrow as u32
    }

    /// Expand a narrow value. Returns `None` for the narrow null.
    pub fn decode(&self, narrow: u32) -> Option<ObjectReference> {
        if narrow == 0 {
            return None;
        }
        ObjectReference::from_raw_address(self.base + ((narrow as usize) << self.shift))
    }
}

impl Default for NarrowOopEncoding {
    fn default() -> Self {
        Self::ZERO_BASED
    }
}

/// This represents a location that holds a 32-bit narrow reference, as used by runtimes that
/// compress references on 64-bit machines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompressedOopSlot {
    slot_addr: *mut Atomic<u32>,
    encoding: NarrowOopEncoding,
}

unsafe impl Send for CompressedOopSlot {}
unsafe impl Sync for CompressedOopSlot {}

impl CompressedOopSlot {
    pub fn from_address(address: Address, encoding: NarrowOopEncoding) -> Self {
        Self {
            slot_addr: address.to_mut_ptr(),
            encoding,
        }
    }

    pub fn as_address(&self) -> Address {
        Address::from_mut_ptr(self.slot_addr)
    }

    pub fn encoding(&self) -> NarrowOopEncoding {
        self.encoding
    }

    /// Load the raw narrow value without decoding it.
    pub fn load_narrow(&self) -> u32 {
        unsafe { (*self.slot_addr).load(atomic::Ordering::Relaxed) }
    }
}

impl Slot for CompressedOopSlot {
    fn load(&self) -> Option<ObjectReference> {
        self.encoding.decode(self.load_narrow())
    }

    fn store(&self, object: ObjectReference) {
        let narrow = self.encoding.encode(object);
        unsafe { (*self.slot_addr).store(narrow, atomic::Ordering::Relaxed) }
    }
}

/// How reference slots are laid out in the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RefEncoding {
    /// Every slot is a word holding the full address.
    #[default]
    Full,
    /// Every slot is a 32-bit narrow value.
    Compressed(NarrowOopEncoding),
}

impl RefEncoding {
    /// The size of one reference slot.
    pub const fn bytes_per_reference(&self) -> usize {
        match self {
            RefEncoding::Full => BYTES_IN_ADDRESS,
            RefEncoding::Compressed(_) => BYTES_IN_COMPRESSED_REFERENCE,
        }
    }

    pub const fn is_compressed(&self) -> bool {
        matches!(self, RefEncoding::Compressed(_))
    }

    /// Make a slot of this encoding at `address`.
    pub fn slot_at(&self, address: Address) -> RefSlot {
        match self {
            RefEncoding::Full => RefSlot::Full(SimpleSlot::from_address(address)),
            RefEncoding::Compressed(enc) => {
                RefSlot::Compressed(CompressedOopSlot::from_address(address, *enc))
            }
        }
    }
}

/// A reference field of either width. Scalar pre-write barriers take a `RefSlot` so that a
/// single entry covers both the full and the compressed store sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefSlot {
    Full(SimpleSlot),
    Compressed(CompressedOopSlot),
}

impl RefSlot {
    pub fn address(&self) -> Address {
        match self {
            RefSlot::Full(s) => s.as_address(),
            RefSlot::Compressed(s) => s.as_address(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, RefSlot::Compressed(_))
    }
}

impl From<SimpleSlot> for RefSlot {
    fn from(slot: SimpleSlot) -> Self {
        RefSlot::Full(slot)
    }
}

impl From<CompressedOopSlot> for RefSlot {
    fn from(slot: CompressedOopSlot) -> Self {
        RefSlot::Compressed(slot)
    }
}

impl Slot for RefSlot {
    fn load(&self) -> Option<ObjectReference> {
        match self {
            RefSlot::Full(s) => s.load(),
            RefSlot::Compressed(s) => s.load(),
        }
    }

    fn store(&self, object: ObjectReference) {
        match self {
            RefSlot::Full(s) => s.store(object),
            RefSlot::Compressed(s) => s.store(object),
        }
    }
}

/// The destination of a bulk reference store: `count` consecutive slots of one encoding,
/// starting at `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RefSlice {
    start: Address,
    count: usize,
    encoding: RefEncoding,
}

impl RefSlice {
    pub fn new(start: Address, count: usize, encoding: RefEncoding) -> Self {
        RefSlice {
            start,
            count,
            encoding,
        }
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn encoding(&self) -> RefEncoding {
        self.encoding
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Size of the slice in bytes
    pub fn bytes(&self) -> usize {
        self.count * self.encoding.bytes_per_reference()
    }

    /// The address just past the last slot
    pub fn end(&self) -> Address {
        self.start + self.bytes()
    }

    /// The smallest word-aligned region containing every slot of the slice. Narrow slots may
    /// start and end in the middle of a word, so the start is aligned down and the end up.
    pub fn covering_region(&self) -> MemRegion {
        let aligned_start = conversions::word_align_down(self.start);
        let aligned_end = conversions::word_align_up(self.end());
        MemRegion::from_range(aligned_start, aligned_end)
    }

    /// Iterate the slots of the slice in address order.
    pub fn iter_slots(&self) -> RefSliceIterator {
        RefSliceIterator {
            cursor: self.start,
            limit: self.end(),
            encoding: self.encoding,
        }
    }
}

/// Iterate slots within a [`RefSlice`].
pub struct RefSliceIterator {
    cursor: Address,
    limit: Address,
    encoding: RefEncoding,
}

impl Iterator for RefSliceIterator {
    type Item = RefSlot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.limit {
            None
        } else {
            let slot = self.encoding.slot_at(self.cursor);
            self.cursor += self.encoding.bytes_per_reference();
            Some(slot)
        }
    }
}
