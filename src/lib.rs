//! The write barrier layer between a managed runtime's mutators and its garbage collector.
//!
//! Every reference store in a managed heap goes through a write barrier, so that the collector
//! can keep its bookkeeping (card tables, remembered sets, snapshot-at-the-beginning queues)
//! up to date.  This crate defines
//!
//! * [`barriers::BarrierSet`], the interface every barrier variant implements, with pre-write,
//!   post-write, bulk array, bulk region and compiled-code barriers,
//! * [`barriers::BarrierSetName`] and the tag set each barrier set carries, which identify a
//!   variant and the variants it is built on, and let a caller cast a `&dyn BarrierSet` back
//!   to its concrete type with [`barriers::barrier_set_cast`],
//! * a process-wide installed barrier set with the API in [`memory_manager`], including two
//!   static `extern "C"` entry points for generated code.
//!
//! A VM implements the variant its collector needs, installs one instance at startup and calls
//! the barriers around every reference store.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate downcast_rs;
#[macro_use]
extern crate static_assertions;
#[macro_use]
extern crate probe;

pub mod barriers;
pub mod build_info;
mod global_state;
pub mod memory_manager;
pub mod runtime;
pub mod util;
pub mod vm;

pub use crate::barriers::{BarrierSet, BarrierSetBase, BarrierSetKind, BarrierSetName};
pub use crate::global_state::GlobalState;
pub use crate::runtime::BarrierSetBuilder;
