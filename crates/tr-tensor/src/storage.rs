use std::ops::{Deref, DerefMut, Range};
use std::sync::Arc;

use log::trace;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::device::Device;
use crate::error::{Result, TensorError};

/// Heap bytes aligned to 8 so any element type can be viewed in place.
#[derive(Debug, Clone, Default)]
pub struct AlignedBytes {
    words: Vec<u64>,
    len: usize,
}

impl AlignedBytes {
    /// Zero-filled buffer of `len` bytes, or `None` if the reservation fails.
    pub fn try_zeroed(len: usize) -> Option<Self> {
        let n_words = len.div_ceil(8);
        let mut words = Vec::new();
        words.try_reserve_exact(n_words).ok()?;
        words.resize(n_words, 0);
        Some(AlignedBytes { words, len })
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buf = AlignedBytes {
            words: vec![0u64; bytes.len().div_ceil(8)],
            len: bytes.len(),
        };
        buf.copy_from_slice(bytes);
        buf
    }
}

impl Deref for AlignedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }
}

impl DerefMut for AlignedBytes {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }
}

/// A fixed-capacity byte arena on one device, shared by every tensor view over it.
///
/// Always handled through `Arc<Storage>`; the buffer is released when the last
/// view drops. Bytes sit behind a reader/writer lock so kernels can read inputs
/// while writing an output held in a different storage.
#[derive(Debug)]
pub struct Storage {
    device: Device,
    capacity: usize,
    buffer: RwLock<AlignedBytes>,
}

impl Storage {
    /// Allocate a zeroed arena of `bytes` bytes on `device`.
    pub fn allocate(device: Device, bytes: usize) -> Result<Arc<Storage>> {
        if !device.is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: "allocate",
                device,
            });
        }
        let buffer =
            AlignedBytes::try_zeroed(bytes).ok_or(TensorError::AllocationFailed { bytes, device })?;
        trace!("allocated {} bytes on {}", bytes, device);
        Ok(Arc::new(Storage {
            device,
            capacity: bytes,
            buffer: RwLock::new(buffer),
        }))
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Size of the arena in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks that `[offset, offset + len)` lies inside the arena.
    pub fn check_range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.capacity => Ok(offset..end),
            _ => Err(TensorError::OutOfBounds {
                offset,
                extent: len,
                capacity: self.capacity,
            }),
        }
    }

    /// Shared access to the whole arena. Recursive so several inputs backed by
    /// the same storage can be read at once.
    pub fn read(&self) -> RwLockReadGuard<'_, AlignedBytes> {
        self.buffer.read_recursive()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, AlignedBytes> {
        self.buffer.write()
    }

    /// Shared access to a byte range.
    ///
    /// # Panics
    /// Panics if the range is outside the arena; views validate their range at
    /// construction so this only fires on internal misuse.
    pub fn read_range(&self, range: Range<usize>) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.read(), |bytes| &(**bytes)[range])
    }

    /// Exclusive access to a byte range. Same panics as [`read_range`](Self::read_range).
    pub fn write_range(&self, range: Range<usize>) -> MappedRwLockWriteGuard<'_, [u8]> {
        RwLockWriteGuard::map(self.write(), |bytes| &mut (**bytes)[range])
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        trace!("released {} bytes on {}", self.capacity, self.device);
    }
}
