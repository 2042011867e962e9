use core::{alloc::Layout, cell::Cell, ptr::NonNull};

use crate::allocator::{AllocError, Allocator};

/// Forwards to an inner allocator and counts the calls going through it.
///
/// Only successful allocations count as allocations; a balanced lifecycle
/// ends with `allocations() == releases()`.
#[derive(Debug, Default)]
pub struct Counting<A> {
    inner: A,
    allocations: Cell<usize>,
    releases: Cell<usize>,
    failures: Cell<usize>,
}

impl<A> Counting<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: Cell::new(0),
            releases: Cell::new(0),
            failures: Cell::new(0),
        }
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub fn releases(&self) -> usize {
        self.releases.get()
    }

    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Blocks handed out and not yet released.
    ///
    /// Zero if more blocks were released than allocated, which happens when
    /// blocks from another allocator are released through this one.
    pub fn outstanding(&self) -> usize {
        self.allocations().saturating_sub(self.releases())
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

unsafe impl<A: Allocator> Allocator for Counting<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.allocations.set(self.allocations.get() + 1);
                Ok(ptr)
            }
            Err(e) => {
                self.failures.set(self.failures.get() + 1);
                Err(e)
            }
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.releases.set(self.releases.get() + 1);
        self.inner.release(ptr, layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn counts_balance_after_release() {
        let counting = Counting::new(Heap);
        let layout = Layout::new::<[u64; 4]>();
        let a = counting.allocate(layout).unwrap();
        let b = counting.allocate(layout).unwrap();
        assert_eq!(counting.outstanding(), 2);
        unsafe {
            counting.release(a, layout);
            counting.release(b, layout);
        }
        assert_eq!(counting.allocations(), 2);
        assert_eq!(counting.releases(), 2);
        assert_eq!(counting.outstanding(), 0);
    }

    #[test]
    fn releasing_foreign_blocks_does_not_underflow() {
        let counting = Counting::new(Heap);
        let layout = Layout::new::<u64>();
        let foreign = Heap.allocate(layout).unwrap();
        unsafe { counting.release(foreign, layout) };
        assert_eq!(counting.releases(), 1);
        assert_eq!(counting.outstanding(), 0);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn failures_are_counted_separately() {
        use crate::wrappers::shared::Shared;

        let mut mem = [0u8; 32];
        let counting = Counting::new(Shared::from_backing(&mut mem).unwrap());
        assert!(counting.allocate(Layout::new::<[u8; 128]>()).is_err());
        assert_eq!(counting.failures(), 1);
        assert_eq!(counting.allocations(), 0);
    }
}
