//! A tag set standing in for runtime type information.
//!
//! A value of [`FakeRttiSupport`] names the concrete type of an object (its concrete tag) and
//! every type the object may be viewed as (its tag set).  A type hierarchy is described by a
//! closed enumeration with one value per type.  Constructors build the tag set bottom-up: the
//! concrete constructor creates the set with its own tag, and every layer it is built on adds the
//! tag of that layer.  The result is a cheap, branch-predictable `is_a` query that needs no
//! language-level type information.

use std::fmt;
use std::marker::PhantomData;

use enum_map::Enum;

/// The bitset word. Each enumeration value is one bit.
type TagSet = usize;

/// Tag set over the enumeration `T`.  `T` must have at most `usize::BITS` values.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FakeRttiSupport<T: Enum + Copy> {
    concrete_tag: T,
    tag_set: TagSet,
}

impl<T: Enum + Copy> FakeRttiSupport<T> {
    /// A tag set containing only `concrete_tag`.
    pub fn new(concrete_tag: T) -> Self {
        debug_assert!(T::LENGTH <= TagSet::BITS as usize);
        FakeRttiSupport {
            concrete_tag,
            tag_set: Self::tag_bit(concrete_tag),
        }
    }

    /// Returns a copy of this tag set with `tag` added. The concrete tag is unchanged.
    #[must_use]
    pub fn add_tag(&self, tag: T) -> Self {
        FakeRttiSupport {
            concrete_tag: self.concrete_tag,
            tag_set: self.tag_set | Self::tag_bit(tag),
        }
    }

    /// The tag of the most derived type.
    pub fn concrete_tag(&self) -> T {
        self.concrete_tag
    }

    pub fn has_tag(&self, tag: T) -> bool {
        self.tag_set & Self::tag_bit(tag) != 0
    }

    /// Iterate the tags in the set, in enumeration order.
    pub fn tags(&self) -> impl Iterator<Item = T> {
        let tag_set = self.tag_set;
        (0..T::LENGTH)
            .filter(move |i| tag_set & (1 << i) != 0)
            .map(T::from_usize)
    }

    fn tag_bit(tag: T) -> TagSet {
        1 << tag.into_usize()
    }
}

impl<T: Enum + Copy + fmt::Debug> fmt::Debug for FakeRttiSupport<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FakeRttiSupport")
            .field("concrete_tag", &self.concrete_tag)
            .field("tags", &TagsDebug::<T>(self.tag_set, PhantomData))
            .finish()
    }
}

struct TagsDebug<T>(TagSet, PhantomData<T>);

impl<T: Enum + Copy + fmt::Debug> fmt::Debug for TagsDebug<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set()
            .entries(
                (0..T::LENGTH)
                    .filter(|i| self.0 & (1 << i) != 0)
                    .map(T::from_usize),
            )
            .finish()
    }
}
