use std::sync::atomic::{AtomicUsize, Ordering};

/// Running totals of runtime allocations, for leak probes in tests.
///
/// Counters are cumulative construction counts, not live-object counts;
/// tests pair them with `Rc::strong_count` probes on the objects themselves.
#[derive(Debug, Clone, Copy)]
pub struct LeakStats {
    pub code_objects: usize,
    pub callables: usize,
    pub lists: usize,
}

static CODE_OBJECTS: AtomicUsize = AtomicUsize::new(0);
static CALLABLES: AtomicUsize = AtomicUsize::new(0);
static LISTS: AtomicUsize = AtomicUsize::new(0);

pub fn record_code_object() {
    CODE_OBJECTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_callable() {
    CALLABLES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_list() {
    LISTS.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> LeakStats {
    LeakStats {
        code_objects: CODE_OBJECTS.load(Ordering::Relaxed),
        callables: CALLABLES.load(Ordering::Relaxed),
        lists: LISTS.load(Ordering::Relaxed),
    }
}
