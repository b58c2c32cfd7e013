//! VM-to-barrier-set interface: safe Rust APIs.
//!
//! This module provides a safe Rust API for VMs to install a barrier set and to invoke barriers
//! on the installed barrier set.  Generated code that cannot hold a reference to the barrier set
//! calls the two `extern "C"` static entry points at the end of this module.
//!
//! A VM is expected to
//! 1. create a [`BarrierSetBuilder`] and set options on it,
//! 2. create the barrier set variant its collector requires,
//! 3. install it with [`install_barrier_set`] before any mutator runs,
//! 4. call [`resize_covered_region`] whenever the heap grows or shrinks.

use crate::barriers::BarrierSet;
use crate::runtime::{self, BarrierSetBuilder};
use crate::util::heap::MemRegion;
use crate::util::opaque_pointer::VMCompiledMethod;
use crate::util::{Address, ObjectReference};
use crate::vm::slot::{RefEncoding, RefSlice, RefSlot, SimpleSlot};

/// Install the process-wide barrier set.
///
/// This method initializes the built-in logger (see [`crate::util::logger`]) unless a logger
/// has already been set. If the VM would like to use its own logger, it should initialize the
/// logger before calling this method.
///
/// The barrier set is never uninstalled. It lives until the process exits.
///
/// Panics if a barrier set is already installed.
///
/// Arguments:
/// * `builder`: The options to install the barrier set with.
/// * `barrier_set`: The barrier set for the collector the VM runs.
pub fn install_barrier_set(
    builder: BarrierSetBuilder,
    barrier_set: Box<dyn BarrierSet>,
) -> &'static dyn BarrierSet {
    crate::util::logger::init();
    runtime::install(builder, barrier_set).barrier_set()
}

/// The installed barrier set. Panics if no barrier set is installed.
#[inline(always)]
pub fn barrier_set() -> &'static dyn BarrierSet {
    runtime::get().barrier_set()
}

/// The installed barrier set, or `None` if no barrier set is installed yet.
pub fn try_barrier_set() -> Option<&'static dyn BarrierSet> {
    runtime::try_get().map(|runtime| runtime.barrier_set())
}

/// Has a barrier set been installed?
pub fn is_barrier_set_installed() -> bool {
    runtime::is_installed()
}

/// Inform the installed barrier set that the heap now spans `new_region`.
///
/// If the `verify_covered_regions` option is set, this panics if either end of the region is
/// not aligned to the granularity of the barrier set.
///
/// The VM must make sure that no barrier runs during the call (for example, by calling it while
/// all mutators are stopped), and that no other thread calls this function at the same time.
/// Mutators see the new region once they synchronize with the resizing thread.
pub fn resize_covered_region(new_region: MemRegion) {
    runtime::resize_covered_region(new_region)
}

/// The layout of reference slots configured at install time. The static entry points interpret
/// their `start` and `count` arguments with this layout.
pub fn reference_encoding() -> RefEncoding {
    runtime::get().reference_encoding()
}

/// The pre-write barrier for a reference field. A VM should call this *before* it stores
/// `target` into `slot`.
///
/// Arguments:
/// * `slot`: The location of the field to be modified, either a full or a narrow slot.
/// * `target`: The value that is about to be stored. `None` for null.
#[inline(always)]
pub fn object_reference_write_pre(slot: RefSlot, target: Option<ObjectReference>) {
    barrier_set().write_ref_field_pre(slot, target)
}

/// The post-write barrier for a reference field. A VM should call this *after* it stores `target`
/// into the field at `field`.
///
/// Arguments:
/// * `field`: The address of the modified field.
/// * `target`: The value that was stored. `None` for null.
/// * `release`: If true, the store is guaranteed to be visible to any thread that observes the
///   barrier's bookkeeping.
#[inline(always)]
pub fn object_reference_write_post(
    field: Address,
    target: Option<ObjectReference>,
    release: bool,
) {
    barrier_set().write_ref_field(field, target, release)
}

/// The pre-write barrier for a bulk store into the slots of `dst`, such as an array copy. A VM
/// should call this *before* it copies.
///
/// Arguments:
/// * `dst`: The slots that will be written.
/// * `dest_uninitialized`: True if `dst` does not hold any reference yet, for example, because
///   the array has just been allocated.
#[inline(always)]
pub fn array_copy_pre(dst: RefSlice, dest_uninitialized: bool) {
    barrier_set().write_ref_array_pre(dst, dest_uninitialized)
}

/// The post-write barrier for a bulk store into the slots of `dst`. A VM should call this
/// *after* it copies.
#[inline(always)]
pub fn array_copy_post(dst: RefSlice) {
    barrier_set().write_ref_array(dst)
}

/// The post-write barrier for a store of arbitrary data, which may contain references, into the
/// heap region `mr`, such as the clone of an object.
#[inline(always)]
pub fn region_write(mr: MemRegion) {
    barrier_set().write_region(mr)
}

/// A VM should call this before compiled code `nm` starts to refer to the object in `dst`.
pub fn code_reference_write_pre(dst: SimpleSlot, nm: VMCompiledMethod) {
    barrier_set().write_ref_nmethod_pre(dst, nm)
}

/// A VM should call this after compiled code `nm` refers to the object in `dst`.
pub fn code_reference_write_post(dst: SimpleSlot, nm: VMCompiledMethod) {
    barrier_set().write_ref_nmethod_post(dst, nm)
}

/// Render the installed barrier set for diagnostics.
pub fn dump_barrier_set() -> String {
    runtime::get().dump()
}

/// The number of calls to the static pre-write and post-write entry points since install. Both
/// are 0 unless the `count_static_barrier_calls` option is set.
pub fn static_barrier_call_counts() -> (usize, usize) {
    runtime::get().state().static_barrier_call_counts()
}

/// The number of times the covered region was resized since install.
pub fn covered_region_resizes() -> usize {
    runtime::get().state().covered_region_resizes()
}

/// The slots a static entry point receives. `count` is the number of references, each of the
/// size the configured encoding gives.
#[inline(always)]
fn static_ref_slice(runtime: &runtime::BarrierSetRuntime, start: Address, count: usize) -> RefSlice {
    assert!(
        count <= isize::MAX as usize,
        "reference count {} is too large",
        count
    );
    RefSlice::new(start, count, runtime.reference_encoding())
}

/// The array pre-write barrier for generated code, which has no reference to the barrier set.
/// Equivalent to `barrier_set().write_ref_array_pre(slice, false)` where `slice` holds `count`
/// references of the configured encoding starting at `start`.
#[no_mangle]
pub extern "C" fn barrier_set_static_write_ref_array_pre(start: Address, count: usize) {
    let runtime = runtime::get();
    probe!(barrier_set, static_write_ref_array_pre, start.as_usize(), count);
    let slice = static_ref_slice(runtime, start, count);
    trace!("static_write_ref_array_pre {:?}", slice);
    runtime.state().count_static_pre_call();
    runtime.barrier_set().write_ref_array_pre(slice, false)
}

/// The array post-write barrier for generated code. Equivalent to
/// `barrier_set().write_ref_array(slice)`.
#[no_mangle]
pub extern "C" fn barrier_set_static_write_ref_array_post(start: Address, count: usize) {
    let runtime = runtime::get();
    probe!(barrier_set, static_write_ref_array_post, start.as_usize(), count);
    let slice = static_ref_slice(runtime, start, count);
    trace!("static_write_ref_array_post {:?}", slice);
    runtime.state().count_static_post_call();
    runtime.barrier_set().write_ref_array(slice)
}
