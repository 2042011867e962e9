//! backing based on stack-allocated arrays

use core::ptr::NonNull;

use super::Backing;

/// # Safety
///
/// Backing is implemented **on a reference**, so the reference keeps the array
/// from moving, ties the allocator to the array's lifetime, and can itself be
/// moved around freely.
///
unsafe impl<const S: usize> Backing for &mut [u8; S] {
    fn region(&mut self) -> NonNull<[u8]> {
        NonNull::from(&mut self[..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_covers_the_whole_array() {
        let mut mem = [0u8; 64];
        let mut backing = &mut mem;
        let region = backing.region();
        assert_eq!(region.len(), 64);
        assert_eq!(region.cast::<u8>().as_ptr(), mem.as_mut_ptr());
    }
}
