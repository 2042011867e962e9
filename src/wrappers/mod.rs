pub mod counting;
#[cfg(feature = "alloc")]
pub mod shared;
