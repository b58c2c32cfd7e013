//! Barrier sets: the interface every write barrier variant implements, the names identifying the
//! variants, and casts from the interface to concrete variants.

mod barrier_set;
mod name;

pub use self::barrier_set::*;
pub use self::name::*;
