//! Types describing how the VM represents the things barriers see.
//!
//! A VM hands barriers the locations of reference fields as slots ([`slot::RefSlot`] for
//! scalar stores, [`slot::RefSlice`] for bulk stores) and identifies compiled code with
//! [`crate::util::opaque_pointer::VMCompiledMethod`].

pub mod slot;
