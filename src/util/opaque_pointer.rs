use crate::util::Address;
use libc::c_void;

/// OpaquePointer represents pointers that the barrier layer needs to pass around but will never
/// dereference, such as a pointer to a compiled method.
/// The type does not provide any method for dereferencing.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OpaquePointer(*mut c_void);

// We never dereference an opaque pointer.
unsafe impl Sync for OpaquePointer {}
unsafe impl Send for OpaquePointer {}

impl Default for OpaquePointer {
    fn default() -> Self {
        Self::UNINITIALIZED
    }
}

impl OpaquePointer {
    /// Represents an uninitialized value for [`OpaquePointer`].
    pub const UNINITIALIZED: Self = Self(std::ptr::null_mut());

    /// Cast an [`Address`] type to an [`OpaquePointer`].
    pub fn from_address(addr: Address) -> Self {
        OpaquePointer(addr.to_mut_ptr::<c_void>())
    }

    /// Cast the opaque pointer to an [`Address`] type.
    pub fn to_address(self) -> Address {
        Address::from_mut_ptr(self.0)
    }

    /// Is this opaque pointer null?
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// A VMCompiledMethod identifies a unit of compiled code in the VM. Compiled code embeds
/// references to heap objects, and the VM reports stores of such references through
/// [`crate::barriers::BarrierSet::write_ref_nmethod_pre`] and
/// [`crate::barriers::BarrierSet::write_ref_nmethod_post`].
/// Barrier sets may record it and compare it, but never look inside.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VMCompiledMethod(pub OpaquePointer);

impl VMCompiledMethod {
    /// Represents an uninitialized value for [`VMCompiledMethod`].
    pub const UNINITIALIZED: Self = Self(OpaquePointer::UNINITIALIZED);

    pub fn from_address(addr: Address) -> Self {
        Self(OpaquePointer::from_address(addr))
    }

    pub fn to_address(self) -> Address {
        self.0.to_address()
    }
}
