//! A contiguous, growable array over an injectable [`Allocator`].
//!
//! The buffer is never resized in place: growing or shrinking allocates a
//! fresh buffer, moves the live prefix `[0, len)` into it and releases the
//! old one. Slots past `len` are uninitialized.

use core::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut},
    ptr::{self, NonNull},
};

use crate::{
    allocator::{Allocator, Block},
    error::{ArrayError, PushError},
    heap::Heap,
};

/// Capacity of the first buffer an empty array allocates.
pub const MIN_CAPACITY: usize = 8;

/// Growth factor used by [`DynArray::new`].
pub const DEFAULT_GROWTH_FACTOR: usize = 8;

/// Outcome of [`DynArray::try_shrink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shrink {
    /// A smaller buffer is now in use.
    Shrunk,
    /// The buffer is already as small as the policy allows.
    NotNeeded,
}

pub struct DynArray<T, A: Allocator = Heap> {
    buf: NonNull<T>,
    capacity: usize,
    len: usize,
    growth_factor: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// the array owns its elements and its buffer exclusively
unsafe impl<T: Send, A: Allocator + Send> Send for DynArray<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for DynArray<T, A> {}

impl<T> DynArray<T, Heap> {
    /// An empty array on the process heap with [`DEFAULT_GROWTH_FACTOR`].
    pub const fn new() -> Self {
        Self::from_parts(Heap, DEFAULT_GROWTH_FACTOR)
    }
}

impl<T> Default for DynArray<T, Heap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> DynArray<T, A> {
    /// An empty array drawing its buffer from `alloc`.
    ///
    /// Nothing is allocated until the first push. Fails if `growth_factor`
    /// is below 2.
    pub fn new_in(alloc: A, growth_factor: usize) -> Result<Self, ArrayError> {
        if growth_factor < 2 {
            return Err(ArrayError::InvalidGrowthFactor(growth_factor));
        }
        Ok(Self::from_parts(alloc, growth_factor))
    }

    const fn from_parts(alloc: A, growth_factor: usize) -> Self {
        Self {
            buf: NonNull::dangling(),
            capacity: 0,
            len: 0,
            growth_factor,
            alloc,
            _owns: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the current buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn growth_factor(&self) -> usize {
        self.growth_factor
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Appends `value`, growing the buffer first if it is full.
    ///
    /// On error the array is left exactly as it was and `value` comes back
    /// inside the [`PushError`].
    pub fn push(&mut self, value: T) -> Result<(), PushError<T>> {
        if self.len == self.capacity {
            if let Err(e) = self.grow() {
                return Err(PushError::new(value, e));
            }
        }
        // safety: len < capacity, so the slot is inside the buffer and unused
        unsafe { self.buf.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            // safety: slots below len are initialized
            Some(unsafe { &*self.buf.as_ptr().add(index) })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(unsafe { &mut *self.buf.as_ptr().add(index) })
        } else {
            None
        }
    }

    /// Removes and returns the element at `index`, shifting everything after
    /// it one slot to the left.
    ///
    /// Afterwards the buffer is shrunk if the policy allows it; a failed
    /// shrink is logged and otherwise ignored.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let value = unsafe {
            let slot = self.buf.as_ptr().add(index);
            let value = slot.read();
            ptr::copy(slot.add(1), slot, self.len - index - 1);
            value
        };
        self.len -= 1;

        if let Err(e) = self.try_shrink() {
            log::debug!("remove: shrink failed, keeping capacity {}: {e}", self.capacity);
        }
        Some(value)
    }

    /// Moves the elements into a smaller buffer if the current one is mostly empty.
    ///
    /// The buffer shrinks by the growth factor, but never below
    /// [`MIN_CAPACITY`] and only if at least half of the smaller buffer would
    /// still be free. An emptied array keeps its smallest buffer for the next
    /// push; only [`DynArray::clear_with`] gives the buffer back entirely.
    pub fn try_shrink(&mut self) -> Result<Shrink, ArrayError> {
        let new_capacity = self.capacity / self.growth_factor;
        if new_capacity < MIN_CAPACITY || self.len > new_capacity / 2 {
            return Ok(Shrink::NotNeeded);
        }
        self.reallocate(new_capacity)?;
        Ok(Shrink::Shrunk)
    }

    /// Hands every element, in order, to `release`, then gives the buffer back.
    pub fn clear_with<F: FnMut(T)>(&mut self, mut release: F) {
        // a panicking `release` leaks the rest instead of releasing them twice
        let len = mem::replace(&mut self.len, 0);
        for i in 0..len {
            release(unsafe { self.buf.as_ptr().add(i).read() });
        }

        self.release_buffer();
        self.buf = NonNull::dangling();
        self.capacity = 0;
    }

    /// Drops every element and gives the buffer back.
    pub fn clear(&mut self) {
        self.clear_with(drop)
    }

    fn grow(&mut self) -> Result<(), ArrayError> {
        let new_capacity = if self.capacity == 0 {
            MIN_CAPACITY
        } else {
            self.capacity
                .checked_mul(self.growth_factor)
                .ok_or(ArrayError::CapacityOverflow)?
        };
        self.reallocate(new_capacity)
    }

    /// Swaps in a buffer of `new_capacity` slots holding the same `len` elements.
    fn reallocate(&mut self, new_capacity: usize) -> Result<(), ArrayError> {
        debug_assert!(new_capacity >= self.len);
        let new_buf = self.allocate_buffer(new_capacity)?;
        // safety: the buffers are distinct and both hold at least len slots
        unsafe { ptr::copy_nonoverlapping(self.buf.as_ptr(), new_buf.as_ptr(), self.len) };
        self.release_buffer();
        log::trace!("reallocated buffer: {} -> {} slots", self.capacity, new_capacity);
        self.buf = new_buf;
        self.capacity = new_capacity;
        Ok(())
    }

    fn allocate_buffer(&self, capacity: usize) -> Result<NonNull<T>, ArrayError> {
        let layout = Layout::array::<T>(capacity).map_err(|_| ArrayError::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.alloc.allocate(layout)?.cast())
    }

    /// Releases the current buffer without touching `buf` or `capacity`.
    fn release_buffer(&mut self) {
        if self.capacity == 0 {
            return;
        }
        // the layout was valid when the buffer was allocated
        if let Ok(layout) = Layout::array::<T>(self.capacity) {
            if layout.size() != 0 {
                unsafe { self.alloc.release(self.buf.cast(), layout) };
            }
        }
    }
}

impl<A: Allocator> DynArray<Block, A> {
    /// Releases every stored block through `items`, the allocator the blocks
    /// came from, then empties the array like [`DynArray::clear`].
    ///
    /// # Safety
    ///
    /// every stored block must have been allocated by `items` and not released since
    pub unsafe fn clear_in<E: Allocator + ?Sized>(&mut self, items: &E) {
        self.clear_with(|block| unsafe { items.release_block(block) })
    }
}

impl<T, A: Allocator> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.as_ptr(), self.len)) };
        self.release_buffer();
    }
}

impl<T, A: Allocator> Index<usize> for DynArray<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len;
        match self.get(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for DynArray<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..self.len).filter_map(|i| self.get(i))).finish()
    }
}
