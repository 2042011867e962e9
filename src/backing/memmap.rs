use std::{fs::OpenOptions, io::{self, Seek, SeekFrom}, ops::DerefMut, path::Path, ptr::NonNull};

use memmap2::{MmapMut, MmapOptions};

use super::Backing;

/// helper function for creating a file-backed map to carve a region out of
///
/// # Safety
///
/// from MmapOptions::new:
/// > All file-backed memory map constructors are marked unsafe because of the potential for Undefined Behavior (UB)
/// using the map if the underlying file is subsequently modified, in or out of process. Applications must consider the risk and
/// take appropriate precautions when using file-backed maps. Solutions such as file permissions, locks or process-private (e.g. unlinked)
/// files exist but are platform specific and limited.
///
#[forbid(unsafe_op_in_unsafe_fn)]
pub unsafe fn new_map<P: AsRef<Path>>(path: P, size: usize) -> Result<MmapMut, io::Error> {
    let mut handle = OpenOptions::new().create(true).read(true).write(true).open(path)?;
    handle.seek(SeekFrom::Start(0))?;
    handle.set_len(size as u64)?;
    let map = unsafe { MmapOptions::new().len(size).map_mut(&handle)? };
    Ok(map)
}

/// # Safety
///
/// the mapping lives on the OS side, so moving the `MmapMut` handle does not move the memory
unsafe impl Backing for MmapMut {
    fn region(&mut self) -> NonNull<[u8]> {
        NonNull::from(<MmapMut as DerefMut>::deref_mut(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_map_region_keeps_its_address_across_moves() {
        let mut map = MmapOptions::new().len(4096).map_anon().unwrap();
        let before = map.region();
        let mut moved = map;
        let after = moved.region();
        assert_eq!(before.cast::<u8>(), after.cast::<u8>());
        assert_eq!(after.len(), 4096);
    }
}
