use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString};

use crate::util::fake_rtti::FakeRttiSupport;

/// One value per barrier set variant known to the runtime.
///
/// The variants form a hierarchy, which is recorded in the tag set of every instance rather than
/// in this enumeration:
///
/// ```text
/// ModRef
/// └── CardTableModRef
///     ├── CardTableForRS
///     │   └── CardTableExtension
///     └── G1SATBCT
///         └── G1SATBCTLogging
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Enum, EnumString, Display, EnumIter)]
pub enum BarrierSetName {
    /// Reference-modification tracking with no further state.
    ModRef,
    /// Card-marking post-write barrier.
    CardTableModRef,
    /// Card table used as the remembered set of a generational heap.
    CardTableForRS,
    /// Card table with parallel-scavenge extensions.
    CardTableExtension,
    /// Snapshot-at-the-beginning pre-write barrier over a card table.
    G1SATBCT,
    /// SATB card table that also logs dirtied cards.
    G1SATBCTLogging,
}

// Every name must be a bit in the tag set word.
const_assert!(<BarrierSetName as Enum>::LENGTH <= usize::BITS as usize);

/// The tag set of a barrier set instance.
pub type FakeRtti = FakeRttiSupport<BarrierSetName>;

/// Implemented by every concrete barrier set type that can be the target of
/// [`barrier_set_cast`](crate::barriers::barrier_set_cast). `NAME` is the tag the type puts into
/// its tag set. A type must not be used as a cast target unless it implements this trait.
pub trait BarrierSetKind: 'static {
    const NAME: BarrierSetName;
}
