//! Recording barrier sets for tests.
//!
//! The mocks reproduce the variant hierarchy with composition: every variant embeds the variant
//! it is built on and delegates the hooks it does not change.  Barrier calls are recorded as
//! [`BarrierEvent`]s in a lock-free queue shared by the whole composition, so tests can call
//! barriers from many threads and inspect what reached the hooks.

use std::fmt;

use crossbeam::queue::SegQueue;
use delegate::delegate;

use crate::barriers::{BarrierSet, BarrierSetBase, BarrierSetKind, BarrierSetName, FakeRtti};
use crate::util::constants::BYTES_IN_WORD;
use crate::util::heap::MemRegion;
use crate::util::opaque_pointer::VMCompiledMethod;
use crate::util::{Address, ObjectReference};
use crate::vm::slot::{CompressedOopSlot, RefSlice, SimpleSlot, Slot};

/// Cards are 512 bytes.
pub const LOG_BYTES_IN_CARD: usize = 9;
pub const BYTES_IN_CARD: usize = 1 << LOG_BYTES_IN_CARD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierEvent {
    FieldPre {
        field: Address,
        compressed: bool,
    },
    FieldPost {
        field: Address,
        new_val: Option<ObjectReference>,
        release: bool,
    },
    ArrayPre {
        start: Address,
        count: usize,
        dest_uninitialized: bool,
    },
    ArrayPost {
        region: MemRegion,
    },
    Region {
        region: MemRegion,
    },
    NmethodPre {
        dst: Address,
        nm: VMCompiledMethod,
    },
    NmethodPost {
        dst: Address,
        nm: VMCompiledMethod,
    },
    Resize {
        region: MemRegion,
    },
}

#[derive(Default)]
pub struct EventLog {
    events: SegQueue<BarrierEvent>,
}

impl EventLog {
    pub fn record(&self, event: BarrierEvent) {
        self.events.push(event);
    }

    /// Remove and return the recorded events, oldest first.
    pub fn take(&self) -> Vec<BarrierEvent> {
        std::iter::from_fn(|| self.events.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// The root of the hierarchy. Its barriers do nothing, apart from the covered region update.
pub struct MockModRef {
    base: BarrierSetBase,
    log: EventLog,
}

impl MockModRef {
    pub fn new() -> Self {
        Self::with_rtti(FakeRtti::new(BarrierSetName::ModRef))
    }

    /// Build the layer for a variant whose tags so far are `fake_rtti`.
    pub fn with_rtti(fake_rtti: FakeRtti) -> Self {
        MockModRef {
            base: BarrierSetBase::new(fake_rtti.add_tag(BarrierSetName::ModRef)),
            log: EventLog::default(),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn take_events(&self) -> Vec<BarrierEvent> {
        self.log.take()
    }
}

impl BarrierSetKind for MockModRef {
    const NAME: BarrierSetName = BarrierSetName::ModRef;
}

impl BarrierSet for MockModRef {
    fn base(&self) -> &BarrierSetBase {
        &self.base
    }

    fn write_ref_field_work(&self, _field: Address, _new_val: Option<ObjectReference>, _release: bool) {}

    fn write_ref_array_work(&self, _mr: MemRegion) {}

    fn write_region_work(&self, _mr: MemRegion) {}

    fn resize_covered_region(&self, new_region: MemRegion) {
        self.base.set_covered_region(new_region);
        self.log.record(BarrierEvent::Resize { region: new_region });
    }

    fn is_aligned(&self, addr: Address) -> bool {
        addr.is_aligned_to(BYTES_IN_WORD)
    }

    fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.base.print_on(out)
    }
}

/// A card table. Post-write barriers and the other bulk barriers are recorded.
pub struct MockCardTable {
    mod_ref: MockModRef,
}

impl MockCardTable {
    pub fn new() -> Self {
        Self::with_rtti(FakeRtti::new(BarrierSetName::CardTableModRef))
    }

    pub fn with_rtti(fake_rtti: FakeRtti) -> Self {
        MockCardTable {
            mod_ref: MockModRef::with_rtti(fake_rtti.add_tag(BarrierSetName::CardTableModRef)),
        }
    }

    delegate! {
        to self.mod_ref {
            pub fn log(&self) -> &EventLog;
            pub fn take_events(&self) -> Vec<BarrierEvent>;
        }
    }
}

impl BarrierSetKind for MockCardTable {
    const NAME: BarrierSetName = BarrierSetName::CardTableModRef;
}

impl BarrierSet for MockCardTable {
    delegate! {
        to self.mod_ref {
            fn base(&self) -> &BarrierSetBase;
        }
    }

    fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool) {
        self.log().record(BarrierEvent::FieldPost {
            field,
            new_val,
            release,
        });
    }

    fn write_ref_array_pre(&self, dst: RefSlice, dest_uninitialized: bool) {
        self.log().record(BarrierEvent::ArrayPre {
            start: dst.start(),
            count: dst.count(),
            dest_uninitialized,
        });
    }

    fn write_ref_array_work(&self, mr: MemRegion) {
        self.log().record(BarrierEvent::ArrayPost { region: mr });
    }

    fn write_region_work(&self, mr: MemRegion) {
        self.log().record(BarrierEvent::Region { region: mr });
    }

    fn write_ref_nmethod_pre(&self, dst: SimpleSlot, nm: VMCompiledMethod) {
        self.log().record(BarrierEvent::NmethodPre {
            dst: dst.as_address(),
            nm,
        });
    }

    fn write_ref_nmethod_post(&self, dst: SimpleSlot, nm: VMCompiledMethod) {
        self.log().record(BarrierEvent::NmethodPost {
            dst: dst.as_address(),
            nm,
        });
    }

    fn resize_covered_region(&self, new_region: MemRegion) {
        self.mod_ref.resize_covered_region(new_region)
    }

    fn is_aligned(&self, addr: Address) -> bool {
        addr.is_aligned_to(BYTES_IN_CARD)
    }

    fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.mod_ref.print_on(out)?;
        write!(out, ", {} byte cards", BYTES_IN_CARD)
    }
}

/// A card table used as a remembered set.
pub struct MockCardTableForRS {
    card_table: MockCardTable,
}

impl MockCardTableForRS {
    pub fn new() -> Self {
        Self::with_rtti(FakeRtti::new(BarrierSetName::CardTableForRS))
    }

    pub fn with_rtti(fake_rtti: FakeRtti) -> Self {
        MockCardTableForRS {
            card_table: MockCardTable::with_rtti(
                fake_rtti.add_tag(BarrierSetName::CardTableForRS),
            ),
        }
    }

    delegate! {
        to self.card_table {
            pub fn log(&self) -> &EventLog;
            pub fn take_events(&self) -> Vec<BarrierEvent>;
        }
    }
}

impl BarrierSetKind for MockCardTableForRS {
    const NAME: BarrierSetName = BarrierSetName::CardTableForRS;
}

impl BarrierSet for MockCardTableForRS {
    delegate! {
        to self.card_table {
            fn base(&self) -> &BarrierSetBase;
            fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool);
            fn write_ref_array_pre(&self, dst: RefSlice, dest_uninitialized: bool);
            fn write_ref_array_work(&self, mr: MemRegion);
            fn write_region_work(&self, mr: MemRegion);
            fn write_ref_nmethod_pre(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn write_ref_nmethod_post(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn resize_covered_region(&self, new_region: MemRegion);
            fn is_aligned(&self, addr: Address) -> bool;
            fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result;
        }
    }
}

/// The remembered set card table with extensions. Behaves as its ancestor.
pub struct MockCardTableExtension {
    for_rs: MockCardTableForRS,
}

impl MockCardTableExtension {
    pub fn new() -> Self {
        MockCardTableExtension {
            for_rs: MockCardTableForRS::with_rtti(
                FakeRtti::new(BarrierSetName::CardTableExtension),
            ),
        }
    }

    delegate! {
        to self.for_rs {
            pub fn log(&self) -> &EventLog;
            pub fn take_events(&self) -> Vec<BarrierEvent>;
        }
    }
}

impl BarrierSetKind for MockCardTableExtension {
    const NAME: BarrierSetName = BarrierSetName::CardTableExtension;
}

impl BarrierSet for MockCardTableExtension {
    delegate! {
        to self.for_rs {
            fn base(&self) -> &BarrierSetBase;
            fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool);
            fn write_ref_array_pre(&self, dst: RefSlice, dest_uninitialized: bool);
            fn write_ref_array_work(&self, mr: MemRegion);
            fn write_region_work(&self, mr: MemRegion);
            fn write_ref_nmethod_pre(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn write_ref_nmethod_post(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn resize_covered_region(&self, new_region: MemRegion);
            fn is_aligned(&self, addr: Address) -> bool;
            fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result;
        }
    }
}

/// A snapshot-at-the-beginning card table. The pre-write barriers remember the values being
/// overwritten.
pub struct MockSATB {
    card_table: MockCardTable,
    old_values: SegQueue<ObjectReference>,
}

impl MockSATB {
    pub fn new() -> Self {
        Self::with_rtti(FakeRtti::new(BarrierSetName::G1SATBCT))
    }

    pub fn with_rtti(fake_rtti: FakeRtti) -> Self {
        MockSATB {
            card_table: MockCardTable::with_rtti(fake_rtti.add_tag(BarrierSetName::G1SATBCT)),
            old_values: SegQueue::new(),
        }
    }

    /// Remove and return the values seen by pre-write barriers, oldest first.
    pub fn take_old_values(&self) -> Vec<ObjectReference> {
        std::iter::from_fn(|| self.old_values.pop()).collect()
    }

    fn remember(&self, old: Option<ObjectReference>) {
        if let Some(old) = old {
            self.old_values.push(old);
        }
    }

    delegate! {
        to self.card_table {
            pub fn log(&self) -> &EventLog;
            pub fn take_events(&self) -> Vec<BarrierEvent>;
        }
    }
}

impl BarrierSetKind for MockSATB {
    const NAME: BarrierSetName = BarrierSetName::G1SATBCT;
}

impl BarrierSet for MockSATB {
    delegate! {
        to self.card_table {
            fn base(&self) -> &BarrierSetBase;
            fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool);
            fn write_ref_array_work(&self, mr: MemRegion);
            fn write_region_work(&self, mr: MemRegion);
            fn write_ref_nmethod_pre(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn write_ref_nmethod_post(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn resize_covered_region(&self, new_region: MemRegion);
            fn is_aligned(&self, addr: Address) -> bool;
            fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result;
        }
    }

    fn write_ref_field_pre_work(&self, field: SimpleSlot, _new_val: Option<ObjectReference>) {
        self.remember(field.load());
        self.log().record(BarrierEvent::FieldPre {
            field: field.as_address(),
            compressed: false,
        });
    }

    fn write_narrow_ref_field_pre_work(
        &self,
        field: CompressedOopSlot,
        _new_val: Option<ObjectReference>,
    ) {
        self.remember(field.load());
        self.log().record(BarrierEvent::FieldPre {
            field: field.as_address(),
            compressed: true,
        });
    }

    fn write_ref_array_pre(&self, dst: RefSlice, dest_uninitialized: bool) {
        if !dest_uninitialized {
            for slot in dst.iter_slots() {
                self.remember(slot.load());
            }
        }
        self.card_table.write_ref_array_pre(dst, dest_uninitialized)
    }
}

/// A SATB card table that also logs the cards of post-write barriers.
pub struct MockSATBLogging {
    satb: MockSATB,
    logged_cards: SegQueue<Address>,
}

impl MockSATBLogging {
    pub fn new() -> Self {
        MockSATBLogging {
            satb: MockSATB::with_rtti(
                FakeRtti::new(BarrierSetName::G1SATBCTLogging),
            ),
            logged_cards: SegQueue::new(),
        }
    }

    /// Remove and return the start addresses of the logged cards, oldest first.
    pub fn take_logged_cards(&self) -> Vec<Address> {
        std::iter::from_fn(|| self.logged_cards.pop()).collect()
    }

    delegate! {
        to self.satb {
            pub fn log(&self) -> &EventLog;
            pub fn take_events(&self) -> Vec<BarrierEvent>;
            pub fn take_old_values(&self) -> Vec<ObjectReference>;
        }
    }
}

impl BarrierSetKind for MockSATBLogging {
    const NAME: BarrierSetName = BarrierSetName::G1SATBCTLogging;
}

impl BarrierSet for MockSATBLogging {
    delegate! {
        to self.satb {
            fn base(&self) -> &BarrierSetBase;
            fn write_ref_field_pre_work(&self, field: SimpleSlot, new_val: Option<ObjectReference>);
            fn write_narrow_ref_field_pre_work(&self, field: CompressedOopSlot, new_val: Option<ObjectReference>);
            fn write_ref_array_pre(&self, dst: RefSlice, dest_uninitialized: bool);
            fn write_ref_array_work(&self, mr: MemRegion);
            fn write_region_work(&self, mr: MemRegion);
            fn write_ref_nmethod_pre(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn write_ref_nmethod_post(&self, dst: SimpleSlot, nm: VMCompiledMethod);
            fn resize_covered_region(&self, new_region: MemRegion);
            fn is_aligned(&self, addr: Address) -> bool;
            fn print_on(&self, out: &mut dyn fmt::Write) -> fmt::Result;
        }
    }

    fn write_ref_field_work(&self, field: Address, new_val: Option<ObjectReference>, release: bool) {
        self.satb.write_ref_field_work(field, new_val, release);
        self.logged_cards.push(field.align_down(BYTES_IN_CARD));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::slot::RefEncoding;
    use atomic::Atomic;

    fn objref(raw: usize) -> ObjectReference {
        ObjectReference::from_raw_address(unsafe { Address::from_usize(raw) }).unwrap()
    }

    #[test]
    fn satb_array_pre_remembers_initialized_slots() {
        let bs = MockSATB::new();
        let slots: [Atomic<Address>; 3] = [
            Atomic::new(objref(0x1000_0000).to_raw_address()),
            Atomic::new(Address::ZERO),
            Atomic::new(objref(0x1000_0010).to_raw_address()),
        ];
        let dst = RefSlice::new(Address::from_ref(&slots[0]), 3, RefEncoding::Full);

        bs.write_ref_array_pre(dst, true);
        assert!(bs.take_old_values().is_empty());

        bs.write_ref_array_pre(dst, false);
        assert_eq!(
            bs.take_old_values(),
            vec![objref(0x1000_0000), objref(0x1000_0010)]
        );
        assert_eq!(bs.take_events().len(), 2);
    }

    #[test]
    fn satb_logging_logs_cards() {
        let bs = MockSATBLogging::new();
        let field = unsafe { Address::from_usize(0x1000_0208) };
        bs.write_ref_field(field, Some(objref(0x2000_0000)), false);
        assert_eq!(bs.take_logged_cards(), vec![unsafe {
            Address::from_usize(0x1000_0200)
        }]);
        assert_eq!(bs.take_events().len(), 1);
    }

    #[test]
    fn derived_variants_share_one_log() {
        let bs = MockCardTableExtension::new();
        bs.write_region(MemRegion::new(unsafe { Address::from_usize(0x1000) }, 0x10));
        assert_eq!(bs.log().len(), 1);
        assert_eq!(bs.for_rs.card_table.take_events().len(), 1);
        assert!(bs.log().is_empty());
    }

    #[test]
    fn print_on_adds_card_size() {
        let bs = MockCardTableForRS::new();
        let mut out = String::new();
        bs.print_on(&mut out).unwrap();
        assert_eq!(
            out,
            "CardTableForRS [ModRef, CardTableModRef, CardTableForRS] covering [0x0, 0x0), 512 byte cards"
        );
    }
}
