//! A growable, index-addressable array whose backing buffer comes from an
//! injectable [`Allocator`].
//!
//! The allocator can be the process heap ([`Heap`]), a first-fit allocator
//! over a caller supplied region ([`region::RegionAlloc`]) or anything else
//! implementing the trait. One allocator instance may back any number of
//! arrays by handing out `&A`, `Rc<A>` or a [`wrappers::shared::Shared`].
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod allocator;
pub mod backing;
pub mod dyn_array;
pub mod error;
pub mod heap;
pub mod region;
pub mod wrappers;

pub use allocator::{AllocError, Allocator, Block};
pub use dyn_array::{DynArray, Shrink, DEFAULT_GROWTH_FACTOR, MIN_CAPACITY};
pub use error::{ArrayError, PushError};
pub use heap::Heap;
