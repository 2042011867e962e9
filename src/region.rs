//! First-fit allocation inside a fixed region of memory.
//!
//! The region is tiled by chunks, each a header followed by its payload.
//! Headers are stored as raw bytes, so they need no alignment and the region
//! can start anywhere.

use core::{
    mem::size_of,
    ptr::{slice_from_raw_parts, slice_from_raw_parts_mut, NonNull},
};

use crate::{allocator::AllocError, backing::Backing};

/// payload left over after a split must be at least this big to become its own chunk
const MIN_SIZE_TO_FRAGMENT: usize = 16;

/// chunk header, stored as raw bytes in front of every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Metadata {
    size: usize,
    used: bool,
}

impl Metadata {
    const fn new(size: usize, used: bool) -> Self {
        Self { size, used }
    }

    fn to_bytes(self) -> [u8; Metadata::size()] {
        let mut data = [0u8; Metadata::size()];
        data[0..size_of::<usize>()].copy_from_slice(&self.size.to_le_bytes()[..]);
        data[size_of::<usize>()] = self.used as u8;
        data
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() == Metadata::size());
        let mut size_data = [0u8; size_of::<usize>()];
        size_data.copy_from_slice(&bytes[0..size_of::<usize>()]);
        Self {
            size: usize::from_le_bytes(size_data),
            used: match bytes[size_of::<usize>()] {
                0 => false,
                1 => true,
                v => panic!("corrupt chunk header: cannot convert {v} to a bool"),
            },
        }
    }

    const fn size() -> usize {
        size_of::<usize>() + size_of::<bool>()
    }
}

/// An allocator handing out blocks from the memory of a [`Backing`].
///
/// Needs `&mut self`; wrap it in [`crate::wrappers::shared::Shared`] to use
/// it as an [`crate::Allocator`].
#[derive(Debug)]
pub struct RegionAlloc<B: Backing> {
    mem: NonNull<[u8]>,
    // keeps the memory behind `mem` alive
    backing: B,
}

impl<B: Backing> RegionAlloc<B> {
    /// Returns `None` if the region cannot hold even a single one byte chunk.
    pub fn new(mut backing: B) -> Option<Self> {
        let mem = backing.region();
        let payload = mem.len().checked_sub(Metadata::size())?;
        if payload == 0 {
            return None;
        }
        let mut this = Self { mem, backing };
        this.write_meta_at(0, Metadata::new(payload, false));
        Some(this)
    }

    /// Gives the backing back. Every block handed out by this allocator is invalid afterwards.
    pub fn into_backing(self) -> B {
        self.backing
    }

    /// Total payload bytes held by free chunks.
    pub fn available(&self) -> usize {
        self.chunks()
            .filter(|(_, meta)| !meta.used)
            .map(|(_, meta)| meta.size)
            .sum()
    }

    /// Allocate `size` bytes aligned to `align` (a power of two).
    ///
    /// # Lifetime of returned values
    ///
    /// - The returned pointer is valid untill either the instance it came from is dropped, or it is passed to RegionAlloc::free
    ///
    pub fn malloc(&mut self, size: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(align.is_power_of_two());
        // this allocator cannot do alignment on its own, so over-allocate and round up inside the chunk
        let needed = size.checked_add(align - 1).ok_or(AllocError)?.max(1);
        self.defrag();

        let best = self
            .chunks()
            .filter(|(_, meta)| !meta.used && meta.size >= needed)
            .min_by_key(|(_, meta)| meta.size);
        let Some((offset, meta)) = best else {
            log::trace!("region: no free chunk for {needed} bytes ({} available)", self.available());
            return Err(AllocError);
        };

        if meta.size - needed >= Metadata::size() + MIN_SIZE_TO_FRAGMENT {
            self.split_chunk(offset, needed);
        }
        self.set_chunk_used(offset, true);

        let start = self.payload_ptr(offset);
        let shift = start.align_offset(align);
        if shift >= align {
            self.set_chunk_used(offset, false);
            return Err(AllocError);
        }
        // safety: shift < align, and the chunk holds at least size + align - 1 bytes
        Ok(unsafe { NonNull::new_unchecked(start.add(shift)) })
    }

    /// # Note
    ///
    /// `ptr` may point anywhere inside the chunk, which is what lets [`RegionAlloc::malloc`] round up for alignment
    ///
    /// # Panics
    ///
    /// - if ptr is outside of the bounds of the region
    /// - if the chunk the pointer points to was already free
    ///
    /// # Safety
    ///
    /// - ptr MUST have been returned by the malloc() method of **this** allocator
    /// - the chunk pointed to by ptr must have not been passed to this function before
    ///
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let raw_offset = offset_from(self.mem, ptr.as_ptr());
        let found = self.chunks().find(|(offset, meta)| {
            offset + Metadata::size() <= raw_offset
                && raw_offset < offset + Metadata::size() + meta.size
        });
        match found {
            Some((offset, _)) => self.set_chunk_used(offset, false),
            None => panic!("no chunk found for ptr (it points into a chunk header)"),
        }
    }

    fn chunks(&self) -> impl Iterator<Item = (usize, Metadata)> + '_ {
        let mut next = Some(0);
        core::iter::from_fn(move || {
            let offset = next?;
            let meta = self.read_meta_at(offset);
            let following = offset + Metadata::size() + meta.size;
            next = (following < self.capacity()).then_some(following);
            Some((offset, meta))
        })
    }

    /// merges every run of adjacent free chunks into one
    fn defrag(&mut self) {
        let mut offset = 0;
        while offset < self.capacity() {
            let mut meta = self.read_meta_at(offset);
            if !meta.used {
                let mut next = offset + Metadata::size() + meta.size;
                while next < self.capacity() {
                    let n_meta = self.read_meta_at(next);
                    if n_meta.used {
                        break;
                    }
                    meta.size += Metadata::size() + n_meta.size;
                    next += Metadata::size() + n_meta.size;
                }
                self.write_meta_at(offset, meta);
            }
            offset += Metadata::size() + meta.size;
        }
    }

    fn set_chunk_used(&mut self, offset: usize, used: bool) {
        let Metadata { size, used: prev_used } = self.read_meta_at(offset);
        if used {
            assert!(!prev_used, "cannot allocate an already allocated chunk!");
        } else {
            assert!(prev_used, "cannot free an already freed chunk!");
        }
        self.write_meta_at(offset, Metadata { size, used });
    }

    fn split_chunk(&mut self, offset: usize, new_size: usize) {
        let Metadata { size, used } = self.read_meta_at(offset);
        assert!(!used, "cannot split an in-use chunk!");
        assert!(
            size >= new_size + Metadata::size() + 1,
            "New size is too small to fit another section!"
        );
        self.write_meta_at(offset, Metadata::new(new_size, false));
        self.write_meta_at(
            offset + Metadata::size() + new_size,
            Metadata::new(size - new_size - Metadata::size(), false),
        );
    }

    fn payload_ptr(&self, offset: usize) -> *mut u8 {
        // safety: chunks never extend past the region
        unsafe { self.mem.cast::<u8>().as_ptr().add(offset + Metadata::size()) }
    }

    fn read_meta_at(&self, offset: usize) -> Metadata {
        Metadata::from_bytes(self.mem(offset, Metadata::size()))
    }

    fn write_meta_at(&mut self, offset: usize, meta: Metadata) {
        self.mem_mut(offset, Metadata::size()).copy_from_slice(&meta.to_bytes()[..]);
    }

    fn capacity(&self) -> usize {
        self.mem.len()
    }

    fn mem(&self, offset: usize, len: usize) -> &[u8] {
        assert!(offset + len <= self.capacity());
        unsafe { &*slice_from_raw_parts(self.mem.cast::<u8>().as_ptr().add(offset), len) }
    }

    fn mem_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        assert!(offset + len <= self.capacity());
        unsafe { &mut *slice_from_raw_parts_mut(self.mem.cast::<u8>().as_ptr().add(offset), len) }
    }
}

/// Returns the offset of `ptr` into `slice`.
/// Panics if `ptr` points to a location outside the slice.
fn offset_from(slice: NonNull<[u8]>, ptr: *const u8) -> usize {
    let start = slice.cast::<u8>().as_ptr() as usize;
    let addr = ptr as usize;
    assert!(
        (start..start + slice.len()).contains(&addr),
        "pointer is outside of the region"
    );
    addr - start
}
