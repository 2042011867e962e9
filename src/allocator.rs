use core::{alloc::Layout, fmt, ptr::NonNull};

#[cfg(feature = "alloc")]
use alloc::rc::Rc;

/// The allocator ran out of memory (or refused the layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// A source of raw memory blocks.
///
/// Any state the allocator needs (an arena, a pool, a file mapping) lives in
/// `self`. Methods take `&self` so that a single instance can be shared by
/// several containers through `&A` or `Rc<A>`; allocators that need to
/// mutate their state use interior mutability (see [`crate::wrappers::shared::Shared`]).
///
/// # Safety
///
/// - a block returned by `allocate` must stay valid, and must not overlap any
///   other live block, until it is passed to `release` on the same instance
/// - the returned pointer must be aligned to `layout.align()`
///
pub unsafe trait Allocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// # Safety
    ///
    /// - `ptr` must have come from `allocate` on **this** allocator instance
    /// - `layout` must be the layout it was allocated with
    /// - it must not have been released before
    ///
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);

    fn allocate_block(&self, layout: Layout) -> Result<Block, AllocError> {
        let ptr = self.allocate(layout)?;
        Ok(Block { ptr, layout })
    }

    /// # Safety
    ///
    /// same as [`Allocator::release`], with `block` coming from `allocate_block` on this instance
    unsafe fn release_block(&self, block: Block) {
        self.release(block.ptr, block.layout)
    }
}

/// A raw block handed out by an [`Allocator`], remembering its own layout.
///
/// Dropping a `Block` does nothing: whoever holds it decides which allocator
/// gets it back (see [`crate::DynArray::clear_in`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Block {
    pub fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).release(ptr, layout)
    }
}

// the Rc keeps the allocator (and with it every block) alive until the last handle is gone
#[cfg(feature = "alloc")]
unsafe impl<A: Allocator + ?Sized> Allocator for Rc<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).release(ptr, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn block_remembers_layout() {
        let layout = Layout::from_size_align(24, 8).unwrap();
        let block = Heap.allocate_block(layout).unwrap();
        assert_eq!(block.layout(), layout);
        assert_eq!(block.size(), 24);
        assert_eq!(block.ptr().as_ptr() as usize % 8, 0);
        unsafe { Heap.release_block(block) };
    }

    #[test]
    fn references_forward_to_the_allocator() {
        let heap = Heap;
        let by_ref = &heap;
        let layout = Layout::new::<u64>();
        let ptr = by_ref.allocate(layout).unwrap();
        unsafe {
            ptr.cast::<u64>().as_ptr().write(7);
            assert_eq!(ptr.cast::<u64>().as_ptr().read(), 7);
            by_ref.release(ptr, layout);
        }
    }

    #[test]
    fn alloc_error_displays() {
        assert_eq!(AllocError.to_string(), "memory allocation failed");
    }
}
