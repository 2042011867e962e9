//! backing based on slices. the array backing could be replaced by this one,
//! but that one keeps the size in the type.
//!
//! handy for anything that derefs to a byte slice, like a `Vec<u8>` kept
//! alive by the caller

use core::ptr::NonNull;

use super::Backing;

/// # Safety
///
/// same trick as the array backing: the borrow pins the slice in place
///
unsafe impl Backing for &mut [u8] {
    fn region(&mut self) -> NonNull<[u8]> {
        NonNull::from(&mut **self)
    }
}
