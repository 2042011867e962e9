//! The process heap, reached through the C allocator.

use core::{alloc::Layout, ffi::c_void, mem::size_of, ptr::NonNull};

use crate::allocator::{AllocError, Allocator};

/// Alignment `malloc` guarantees for every allocation (`max_align_t`).
const MIN_ALIGN: usize = 2 * size_of::<usize>();

/// The default allocator, backed by `malloc`/`free`.
///
/// Stateless, so it is `Copy` and every array can carry its own instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Heap;

unsafe impl Allocator for Heap {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        // malloc(0) may hand back null or a unique pointer, neither of which we want
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        let ptr = if layout.align() <= MIN_ALIGN && layout.align() <= layout.size() {
            unsafe { libc::malloc(layout.size()) }
        } else {
            aligned_malloc(layout)
        };
        NonNull::new(ptr.cast::<u8>()).ok_or(AllocError)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            libc::free(ptr.as_ptr().cast::<c_void>());
        }
    }
}

fn dangling(layout: Layout) -> NonNull<u8> {
    // safety: alignments are never zero
    unsafe { NonNull::new_unchecked(layout.align() as *mut u8) }
}

#[cfg(unix)]
fn aligned_malloc(layout: Layout) -> *mut c_void {
    let mut out = core::ptr::null_mut();
    // posix_memalign wants at least pointer alignment
    let align = layout.align().max(size_of::<usize>());
    match unsafe { libc::posix_memalign(&mut out, align, layout.size()) } {
        0 => out,
        _ => core::ptr::null_mut(),
    }
}

#[cfg(not(unix))]
fn aligned_malloc(layout: Layout) -> *mut c_void {
    // only small alignments can be served without posix_memalign
    if layout.align() <= MIN_ALIGN {
        unsafe { libc::malloc(layout.size()) }
    } else {
        log::debug!("heap: alignment {} unsupported on this platform", layout.align());
        core::ptr::null_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_allocations_do_not_touch_malloc() {
        let layout = Layout::from_size_align(0, 16).unwrap();
        let ptr = Heap.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize, 16);
        unsafe { Heap.release(ptr, layout) };
    }

    #[test]
    fn over_aligned_allocations_are_aligned() {
        for align in [32, 64, 4096] {
            let layout = Layout::from_size_align(100, align).unwrap();
            let ptr = Heap.allocate(layout).unwrap();
            assert_eq!(ptr.as_ptr() as usize % align, 0);
            unsafe { Heap.release(ptr, layout) };
        }
    }

    #[test]
    fn small_allocations_are_writable() {
        let layout = Layout::array::<u32>(16).unwrap();
        let ptr = Heap.allocate(layout).unwrap().cast::<u32>();
        unsafe {
            for i in 0..16 {
                ptr.as_ptr().add(i).write(i as u32);
            }
            assert_eq!(ptr.as_ptr().add(15).read(), 15);
            Heap.release(ptr.cast(), layout);
        }
    }
}
