use std::{cell::RefCell, thread_local};

pub const NUM_BUCKETS: usize = 6;
pub type BucketArray = [Vec<usize>; NUM_BUCKETS];

thread_local! {
    /// Thread local for the buckets used while building to reduce allocations during build
    static BUCKETS: RefCell<BucketArray> = RefCell::new(Default::default());
}

/// Runs `closure` with this thread's (cleared) bucket assignment vectors.
pub fn with_buckets<R>(closure: impl FnOnce(&mut BucketArray) -> R) -> R {
    BUCKETS.with(move |buckets| {
        let mut buckets = buckets.borrow_mut();
        for bucket in buckets.iter_mut() {
            bucket.clear();
        }
        closure(&mut buckets)
    })
}
