use bytemuck::NoUninit;

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::*;

use crate::util::conversions;

/// size in bytes
pub type ByteSize = usize;

/// A raw machine address: the address of a field, of an array element, or of a region
/// boundary.  It has the size and layout of a `usize`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Hash, PartialOrd, Ord, PartialEq, NoUninit)]
pub struct Address(usize);

impl Add<ByteSize> for Address {
    type Output = Address;
    fn add(self, offset: ByteSize) -> Address {
        Address(self.0 + offset)
    }
}

impl AddAssign<ByteSize> for Address {
    fn add_assign(&mut self, offset: ByteSize) {
        self.0 += offset;
    }
}

impl Sub<ByteSize> for Address {
    type Output = Address;
    fn sub(self, offset: ByteSize) -> Address {
        Address(self.0 - offset)
    }
}

/// The distance in bytes from `other` up to `self`.
impl Sub<Address> for Address {
    type Output = ByteSize;
    fn sub(self, other: Address) -> ByteSize {
        debug_assert!(
            self.0 >= other.0,
            "cannot subtract {} from the lower address {}",
            other,
            self
        );
        self.0 - other.0
    }
}

impl Address {
    pub const ZERO: Self = Address(0);

    /// The address of a Rust value, such as a slot in a test heap.
    pub fn from_ref<T>(r: &T) -> Address {
        Address(r as *const T as usize)
    }

    pub fn from_mut_ptr<T>(ptr: *mut T) -> Address {
        Address(ptr as usize)
    }

    /// # Safety
    /// Nothing checks that `raw` points anywhere meaningful. The static entry points receive
    /// addresses this way from generated code.
    pub const unsafe fn from_usize(raw: usize) -> Address {
        Address(raw)
    }

    // Add::add cannot be const.
    #[allow(clippy::should_implement_trait)]
    pub const fn add(self, size: ByteSize) -> Address {
        Address(self.0 + size)
    }

    pub const fn align_up(self, align: ByteSize) -> Address {
        Address(conversions::raw_align_up(self.0, align))
    }

    pub const fn align_down(self, align: ByteSize) -> Address {
        Address(conversions::raw_align_down(self.0, align))
    }

    pub const fn is_aligned_to(self, align: ByteSize) -> bool {
        conversions::raw_is_aligned(self.0, align)
    }

    pub fn to_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// `ObjectReference` is the full-width representation of a reference to a managed object, i.e.
/// the value a mutator stores into a reference field. It is never null. Fields that may hold
/// null are modelled as `Option<ObjectReference>`, which has the same size as a word thanks to
/// the niche of `NonZeroUsize`.
///
/// Barriers never dereference an `ObjectReference`. They only pass it to the concrete barrier
/// set, which may record it.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Hash, PartialOrd, Ord, PartialEq)]
pub struct ObjectReference(NonZeroUsize);

impl ObjectReference {
    /// Objects are at least word aligned.
    pub const ALIGNMENT: usize = crate::util::constants::BYTES_IN_ADDRESS;

    pub fn to_raw_address(self) -> Address {
        Address(self.0.get())
    }

    /// Cast a raw address to an object reference. Returns `None` for the zero address.
    pub fn from_raw_address(addr: Address) -> Option<ObjectReference> {
        debug_assert!(
            addr.is_aligned_to(Self::ALIGNMENT),
            "unaligned object reference {addr}"
        );
        NonZeroUsize::new(addr.0).map(ObjectReference)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

impl fmt::Debug for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}
