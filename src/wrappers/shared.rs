use core::{alloc::Layout, cell::RefCell, ptr::NonNull};

use alloc::rc::Rc;

use crate::{
    allocator::{AllocError, Allocator},
    backing::Backing,
    region::RegionAlloc,
};

/// A shared handle to a [`RegionAlloc`].
///
/// not thread safe.
///
/// Cloning the handle is cheap and every clone allocates from the same
/// region, so several arrays can draw from one arena. The region lives until
/// the last handle is dropped.
#[derive(Debug)]
pub struct Shared<B: Backing>(Rc<RefCell<RegionAlloc<B>>>);

impl<B: Backing> Shared<B> {
    pub fn new(alloc: RegionAlloc<B>) -> Self {
        Self(Rc::new(RefCell::new(alloc)))
    }

    /// Build the region allocator and wrap it in one go.
    pub fn from_backing(backing: B) -> Option<Self> {
        RegionAlloc::new(backing).map(Self::new)
    }

    /// Free payload bytes left in the region.
    pub fn available(&self) -> usize {
        self.0.borrow().available()
    }

    /// Gives the region allocator back if this is the last handle.
    pub fn try_unwrap(self) -> Result<RegionAlloc<B>, Self> {
        Rc::try_unwrap(self.0).map(RefCell::into_inner).map_err(Self)
    }
}

/// because rust cant figure out that cloning Shared does not clone `B`
impl<B: Backing> Clone for Shared<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

unsafe impl<B: Backing> Allocator for Shared<B> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            // safety: alignments are never zero
            return Ok(unsafe { NonNull::new_unchecked(layout.align() as *mut u8) });
        }
        let mut region = self.0.try_borrow_mut().map_err(|_| AllocError)?;
        region.malloc(layout.size(), layout.align())
    }

    #[forbid(unsafe_op_in_unsafe_fn)]
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // Safety
        // covered by the requirements of Allocator::release
        unsafe { self.0.borrow_mut().free(ptr) };
    }
}
