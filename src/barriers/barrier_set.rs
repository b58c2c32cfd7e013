use std::fmt;
use std::sync::atomic::{fence, Ordering};

use atomic::Atomic;
use downcast_rs::Downcast;

use crate::barriers::name::{BarrierSetKind, BarrierSetName, FakeRtti};
use crate::util::conversions;
use crate::util::heap::MemRegion;
use crate::util::opaque_pointer::VMCompiledMethod;
use crate::util::{Address, ObjectReference};
use crate::vm::slot::{CompressedOopSlot, RefSlice, RefSlot, SimpleSlot};

/// State shared by every barrier set: the tag set identifying the variant, and the region of
/// the heap the barrier set currently covers.
///
/// Every variant embeds a `BarrierSetBase` (directly, or through the variant it is built on) and
/// returns it from [`BarrierSet::base`].
///
/// The covered region changes while mutators hold `&dyn BarrierSet` references, so it is
/// stored atomically.  Resizes are still serialized with barrier calls by the VM.
#[derive(Debug)]
pub struct BarrierSetBase {
    fake_rtti: FakeRtti,
    covered: Atomic<MemRegion>,
}

impl BarrierSetBase {
    pub fn new(fake_rtti: FakeRtti) -> Self {
        BarrierSetBase {
            fake_rtti,
            covered: Atomic::new(MemRegion::EMPTY),
        }
    }

    pub fn fake_rtti(&self) -> FakeRtti {
        self.fake_rtti
    }

    pub fn covered_region(&self) -> MemRegion {
        self.covered.load(Ordering::Acquire)
    }

    pub fn set_covered_region(&self, region: MemRegion) {
        self.covered.store(region, Ordering::Release);
    }

    /// Print the part of a barrier set's state that is common to all variants.
    pub fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{} [", self.fake_rtti.concrete_tag())?;
        for (i, tag) in self.fake_rtti.tags().enumerate() {
            if i != 0 {
                write!(out, ", ")?;
            }
            write!(out, "{}", tag)?;
        }
        write!(out, "] covering {}", self.covered_region())
    }
}

/// A barrier set provides the barriers a mutator must execute around every reference store, and
/// around bulk stores of references into arrays and heap regions.
///
/// # Barrier protocol
///
/// For a scalar reference store `*field = new_val` the mutator executes
/// 1. [`write_ref_field_pre`](BarrierSet::write_ref_field_pre) before the store, while the slot
///    still holds the old value,
/// 2. the store itself,
/// 3. [`write_ref_field`](BarrierSet::write_ref_field) after the store.
///
/// For a bulk store into `count` consecutive slots, the mutator calls
/// [`write_ref_array_pre`](BarrierSet::write_ref_array_pre) before and
/// [`write_ref_array`](BarrierSet::write_ref_array) after the copy. Generated code that has no
/// reference to the barrier set uses the static entry points in
/// [`memory_manager`](crate::memory_manager) instead.
///
/// # Fast paths and `*_work` hooks
///
/// The barrier entry points are provided methods which are the same for every variant.  They
/// normalize the arguments and call a `*_work` hook, which is where a variant does its
/// bookkeeping.  A variant overrides hooks, not entry points.  Hooks that every variant must
/// provide are required methods.  Pre-write hooks default to no-ops, since most variants do not
/// need a pre-write barrier.
///
/// # Identity
///
/// A barrier set carries a tag set (see [`FakeRtti`]).  [`kind`](BarrierSet::kind) names the
/// concrete variant and [`is_a`](BarrierSet::is_a) tests whether the barrier set can be viewed as
/// a given variant, including the intermediate variants it is built on.  Use
/// [`barrier_set_cast`] to get the concrete type back from a `&dyn BarrierSet`.  There is no
/// cast to an ancestor type: code that works on any variant built on an ancestor takes
/// `&dyn BarrierSet` and tests [`is_a`](BarrierSet::is_a), so every call still reaches the
/// hooks of the concrete variant.
///
/// # Concurrency
///
/// Barrier methods take `&self` and are called from many mutator threads at the same time.
/// Apart from [`resize_covered_region`](BarrierSet::resize_covered_region), no method may block.
pub trait BarrierSet: Downcast + Send + Sync {
    /// The shared state of the barrier set.
    fn base(&self) -> &BarrierSetBase;

    /// The tag of the concrete variant.
    fn kind(&self) -> BarrierSetName {
        self.base().fake_rtti().concrete_tag()
    }

    /// Can this barrier set be viewed as the variant `name`? True for the concrete variant and
    /// for every variant it is built on.
    fn is_a(&self, name: BarrierSetName) -> bool {
        self.base().fake_rtti().has_tag(name)
    }

    /// Pre-write barrier for a scalar reference store. Must be called before the store, with the
    /// value about to be stored.
    #[inline(always)]
    fn write_ref_field_pre(&self, field: RefSlot, new_val: Option<ObjectReference>) {
        match field {
            RefSlot::Full(slot) => self.write_ref_field_pre_work(slot, new_val),
            RefSlot::Compressed(slot) => self.write_narrow_ref_field_pre_work(slot, new_val),
        }
    }

    /// Pre-write hook for a full-width field.
    fn write_ref_field_pre_work(&self, _field: SimpleSlot, _new_val: Option<ObjectReference>) {}

    /// Pre-write hook for a narrow field.
    fn write_narrow_ref_field_pre_work(
        &self,
        _field: CompressedOopSlot,
        _new_val: Option<ObjectReference>,
    ) {
    }

    /// Post-write barrier for a scalar reference store. Must be called after `new_val` has been
    /// stored into `field`.
    ///
    /// If `release` is true, every memory operation before this call (the reference store in
    /// particular) happens before the bookkeeping done by the hook, so a thread that observes the
    /// bookkeeping with acquire ordering also observes the store.
    #[inline(always)]
    fn write_ref_field(&self, field: Address, new_val: Option<ObjectReference>, release: bool) {
        if release {
            fence(Ordering::Release);
        }
        self.write_ref_field_work(field, new_val, release)
    }

    /// Post-write hook. Called concurrently from many threads.
    fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool);

    /// Pre-write barrier for a bulk store into `dst`. If `dest_uninitialized` is true, `dst` holds
    /// no references yet.
    fn write_ref_array_pre(&self, _dst: RefSlice, _dest_uninitialized: bool) {}

    /// Post-write barrier for a bulk store into `dst`. The hook receives the word-aligned region
    /// covering every written slot.
    #[inline(always)]
    fn write_ref_array(&self, dst: RefSlice) {
        if dst.is_empty() {
            return;
        }
        debug_assert!(
            dst.encoding().is_compressed() || conversions::is_address_aligned(dst.start()),
            "unaligned array of full references at {}",
            dst.start()
        );
        self.write_ref_array_work(dst.covering_region())
    }

    /// Array post-write hook. Equivalent to a scalar post-write of every reference-sized unit in
    /// `mr`.
    fn write_ref_array_work(&self, mr: MemRegion);

    /// Post-write barrier for a store of arbitrary data, which may include references, into
    /// `mr`.
    #[inline(always)]
    fn write_region(&self, mr: MemRegion) {
        self.write_region_work(mr)
    }

    /// Region post-write hook.
    fn write_region_work(&self, mr: MemRegion);

    /// Called before compiled code `nm` starts to refer to the object in `dst`.
    fn write_ref_nmethod_pre(&self, _dst: SimpleSlot, _nm: VMCompiledMethod) {}

    /// Called after compiled code `nm` refers to the object in `dst`.
    fn write_ref_nmethod_post(&self, _dst: SimpleSlot, _nm: VMCompiledMethod) {}

    /// The heap has grown or shrunk to `new_region`. The caller guarantees that no barrier
    /// is running on this barrier set during the call.
    fn resize_covered_region(&self, new_region: MemRegion);

    /// The region of the heap this barrier set covers.
    fn covered_region(&self) -> MemRegion {
        self.base().covered_region()
    }

    /// Does `addr` satisfy the granularity constraint of this barrier set? Callers use this
    /// to validate region boundaries before handing them to the barrier set.
    fn is_aligned(&self, addr: Address) -> bool;

    /// Print a description of the barrier set for diagnostics.
    fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

impl_downcast!(BarrierSet);

impl fmt::Debug for dyn BarrierSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.print_on(f)
    }
}

#[cold]
#[inline(never)]
fn wrong_type(expected: BarrierSetName, found: BarrierSetName) -> ! {
    panic!(
        "wrong type of barrier set: expected {}, found {}",
        expected, found
    )
}

/// Cast a barrier set to its concrete type `T`.
///
/// `bs` must be a `T`.  In debug builds and in builds with the `checked_casts` feature, a
/// barrier set without the tag of `T` (`!bs.is_a(T::NAME)`) panics before the cast.  A barrier
/// set of another concrete type always panics, including one built on `T`, since the result
/// would bypass the hooks the concrete variant overrides.
pub fn barrier_set_cast<T: BarrierSet + BarrierSetKind>(bs: &dyn BarrierSet) -> &T {
    if cfg!(any(debug_assertions, feature = "checked_casts")) && !bs.is_a(T::NAME) {
        wrong_type(T::NAME, bs.kind());
    }
    match bs.downcast_ref::<T>() {
        Some(t) => t,
        None => wrong_type(T::NAME, bs.kind()),
    }
}

/// Like [`barrier_set_cast`], but returns `None` instead of panicking if `bs` is not a `T`.
#[inline(always)]
pub fn try_barrier_set_cast<T: BarrierSet + BarrierSetKind>(bs: &dyn BarrierSet) -> Option<&T> {
    if bs.kind() != T::NAME {
        return None;
    }
    bs.downcast_ref::<T>()
}

/// Cast a barrier set to the concrete type `T` with no check in release builds.
///
/// # Safety
/// The concrete type of `bs` must be `T`.
#[inline(always)]
pub unsafe fn barrier_set_cast_unchecked<T: BarrierSet + BarrierSetKind>(bs: &dyn BarrierSet) -> &T {
    debug_assert!(
        bs.kind() == T::NAME,
        "wrong type of barrier set: expected {}, found {}",
        T::NAME,
        bs.kind()
    );
    &*(bs as *const dyn BarrierSet as *const T)
}
