//! The process-wide barrier set.
//!
//! A VM creates one barrier set at startup, matching the collector it runs, and installs it with
//! [`crate::memory_manager::install_barrier_set`].  The installed barrier set lives until the
//! process exits.  Store sites and generated code reach it through
//! [`crate::memory_manager::barrier_set`] and the static entry points.

use crate::barriers::BarrierSet;
use crate::global_state::GlobalState;
use crate::util::heap::MemRegion;
use crate::util::options::Options;
use crate::util::rust_util::InitializeOnce;
use crate::vm::slot::RefEncoding;

/// BarrierSetBuilder is used to set options before installing a barrier set.
/// The options are read from `BARRIER_SET_*` environment variables when the builder is created,
/// and can then be changed with [`BarrierSetBuilder::set_option`] and
/// [`BarrierSetBuilder::set_options_bulk`].
pub struct BarrierSetBuilder {
    pub options: Options,
}

impl BarrierSetBuilder {
    /// Create a BarrierSetBuilder with options from environment variables, or default values.
    pub fn new() -> Self {
        BarrierSetBuilder {
            options: Options::default(),
        }
    }

    /// Set an option. The name may be in snake_case or camelCase. Returns false if the value is
    /// rejected.
    pub fn set_option(&mut self, name: &str, val: &str) -> bool {
        self.options.set_from_camelcase_str(name, val)
    }

    /// Set multiple options from a string of whitespace separated `name=value` pairs.
    pub fn set_options_bulk(&mut self, options: &str) -> bool {
        self.options.set_bulk_from_str(options)
    }
}

impl Default for BarrierSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The installed barrier set, with the options it was installed with and the runtime's
/// bookkeeping about it.
pub struct BarrierSetRuntime {
    barrier_set: Box<dyn BarrierSet>,
    pub options: Options,
    reference_encoding: RefEncoding,
    pub(crate) state: GlobalState,
}

impl BarrierSetRuntime {
    fn new(options: Options, barrier_set: Box<dyn BarrierSet>) -> Self {
        let reference_encoding = options.reference_encoding();
        let state = GlobalState::new(options.count_static_barrier_calls);
        BarrierSetRuntime {
            barrier_set,
            options,
            reference_encoding,
            state,
        }
    }

    pub fn barrier_set(&self) -> &dyn BarrierSet {
        self.barrier_set.as_ref()
    }

    /// The layout of reference slots in the heap, used by the static entry points.
    pub fn reference_encoding(&self) -> RefEncoding {
        self.reference_encoding
    }

    pub fn state(&self) -> &GlobalState {
        &self.state
    }

    /// Render the barrier set with [`BarrierSet::print_on`].
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing to a String does not fail.
        let _ = self.barrier_set.print_on(&mut out);
        out
    }

    /// Panic if `region` does not start and end at boundaries the barrier set accepts.
    fn verify_region(&self, region: MemRegion) {
        if region.is_empty() {
            return;
        }
        assert!(
            self.barrier_set.is_aligned(region.start()) && self.barrier_set.is_aligned(region.end()),
            "covered region {} is not aligned for barrier set {}",
            region,
            self.barrier_set.kind()
        );
    }

    fn resize_covered_region(&self, new_region: MemRegion) {
        let old_region = self.barrier_set.covered_region();
        debug!(
            "Resizing the covered region of {} from {} to {}",
            self.barrier_set.kind(),
            old_region,
            new_region
        );
        if self.options.verify_covered_regions {
            self.verify_region(new_region);
        }
        self.barrier_set.resize_covered_region(new_region);
        debug_assert_eq!(self.barrier_set.covered_region(), new_region);
        let resizes = self.state.inform_covered_region_resized();
        trace!("Covered region resized {} times", resizes);
    }
}

static RUNTIME: InitializeOnce<BarrierSetRuntime> = InitializeOnce::new();

/// Install `barrier_set` as the process-wide barrier set. Panics if one is already installed.
pub(crate) fn install(
    builder: BarrierSetBuilder,
    barrier_set: Box<dyn BarrierSet>,
) -> &'static BarrierSetRuntime {
    let kind = barrier_set.kind();
    let installed = RUNTIME
        .initialize_once(move || BarrierSetRuntime::new(builder.options, barrier_set));
    if !installed {
        panic!(
            "cannot install barrier set {}: barrier set {} is already installed",
            kind,
            RUNTIME.barrier_set().kind()
        );
    }

    let runtime = RUNTIME.get_ref();
    info!(
        "Installed barrier set {} (barrier-set {}, {})",
        kind,
        crate::build_info::BARRIER_SET_PKG_VERSION,
        *crate::build_info::BARRIER_SET_GIT_VERSION
    );
    debug!("Reference encoding: {:?}", runtime.reference_encoding);
    if runtime.options.print_barrier_set {
        info!("{}", runtime.dump());
    }
    if runtime.options.verify_covered_regions {
        runtime.verify_region(runtime.barrier_set.covered_region());
    }
    runtime
}

/// The installed runtime. Panics if no barrier set is installed.
#[inline(always)]
pub(crate) fn get() -> &'static BarrierSetRuntime {
    match RUNTIME.try_get_ref() {
        Some(runtime) => runtime,
        None => not_installed(),
    }
}

#[cold]
#[inline(never)]
fn not_installed() -> ! {
    panic!("no barrier set is installed. Call memory_manager::install_barrier_set() first.")
}

pub(crate) fn try_get() -> Option<&'static BarrierSetRuntime> {
    RUNTIME.try_get_ref()
}

pub(crate) fn is_installed() -> bool {
    RUNTIME.is_initialized()
}

/// Resize the covered region of the installed barrier set. The VM serializes resizes with
/// barrier calls.
pub(crate) fn resize_covered_region(new_region: MemRegion) {
    get().resize_covered_region(new_region)
}
