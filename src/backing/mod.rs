#[cfg(feature = "std")]
pub mod memmap;
pub mod array;
pub mod slice;

use core::ptr::NonNull;

/// Memory a [`crate::region::RegionAlloc`] carves its blocks out of.
///
/// # Safety requirements
///
/// - for the function region
///     - it MUST be safe to use the returned pointer AFTER Self has been moved
///     - every call must return the same region
///
pub unsafe trait Backing {
    fn region(&mut self) -> NonNull<[u8]>;
}
