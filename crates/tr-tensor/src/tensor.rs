use std::ops::Range;
use std::sync::Arc;

use bytemuck::Pod;
use log::trace;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::cpu::rearrange::rearrange;
use crate::device::Device;
use crate::dtype::DType;
use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::layout::TensorMeta;
use crate::shape::Shape;
use crate::storage::{AlignedBytes, Storage};

/// A strided view over shared [`Storage`].
///
/// Cloning a tensor, or deriving a view with [`permute`](Tensor::permute),
/// [`slice`](Tensor::slice) or [`view`](Tensor::view), never copies data; the new
/// handle holds another reference to the same storage. Every handle checks at
/// construction that the bytes it can address lie inside its storage.
#[derive(Debug, Clone)]
pub struct Tensor {
    meta: TensorMeta,
    storage: Arc<Storage>,
    /// Byte offset of element 0 within the storage.
    offset: usize,
}

impl Tensor {
    /// Allocate a zero-filled dense tensor.
    pub fn create(shape: impl Into<Shape>, dtype: DType, device: Device) -> Result<Tensor> {
        let shape = shape.into();
        let bytes = shape
            .checked_numel()
            .and_then(|n| n.checked_mul(dtype.size_in_bytes()))
            .ok_or(TensorError::AllocationFailed {
                bytes: usize::MAX,
                device,
            })?;
        let storage = Storage::allocate(device, bytes)?;
        Tensor::from_parts(TensorMeta::contiguous(shape, dtype), storage, 0)
    }

    /// Dense host tensor holding a copy of `data`.
    pub fn from_slice<T: Element>(data: &[T], shape: impl Into<Shape>) -> Result<Tensor> {
        let tensor = Tensor::create(shape, T::DTYPE, Device::Cpu)?;
        tensor.load_slice(data)?;
        Ok(tensor)
    }

    /// Builds a handle over existing storage, validating its byte range.
    pub fn from_parts(meta: TensorMeta, storage: Arc<Storage>, offset: usize) -> Result<Tensor> {
        let extent = meta
            .extent()
            .and_then(|e| e.checked_mul(meta.element_size()))
            .ok_or(TensorError::OutOfBounds {
                offset,
                extent: usize::MAX,
                capacity: storage.capacity(),
            })?;
        storage.check_range(offset, extent)?;
        Ok(Tensor {
            meta,
            storage,
            offset,
        })
    }

    pub fn meta(&self) -> &TensorMeta {
        &self.meta
    }

    pub fn shape(&self) -> &[usize] {
        self.meta.shape().dims()
    }

    pub fn strides(&self) -> &[usize] {
        self.meta.strides()
    }

    pub fn ndim(&self) -> usize {
        self.meta.ndim()
    }

    pub fn numel(&self) -> usize {
        self.meta.numel()
    }

    pub fn dtype(&self) -> DType {
        self.meta.dtype()
    }

    pub fn element_size(&self) -> usize {
        self.meta.element_size()
    }

    pub fn device(&self) -> Device {
        self.storage.device()
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Byte offset of the first element within the storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_contiguous(&self) -> bool {
        self.meta.is_contiguous()
    }

    /// True if both handles are views over the same storage.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Reorders dimensions without copying.
    pub fn permute(&self, order: &[usize]) -> Result<Tensor> {
        let meta = self.meta.permute(order)?;
        trace!("permute {:?} -> {}", order, meta.shape());
        Tensor::from_parts(meta, Arc::clone(&self.storage), self.offset)
    }

    /// Narrows `dim` to `[start, end)` without copying.
    pub fn slice(&self, dim: usize, start: usize, end: usize) -> Result<Tensor> {
        let (meta, elem_offset) = self.meta.slice(dim, start, end)?;
        let offset = elem_offset
            .checked_mul(self.element_size())
            .and_then(|b| b.checked_add(self.offset))
            .ok_or(TensorError::OutOfBounds {
                offset: self.offset,
                extent: usize::MAX,
                capacity: self.storage.capacity(),
            })?;
        trace!("slice dim {} [{}, {}) -> {}", dim, start, end, meta.shape());
        Tensor::from_parts(meta, Arc::clone(&self.storage), offset)
    }

    /// Reinterprets a contiguous tensor under a new shape without copying.
    pub fn view(&self, shape: impl Into<Shape>) -> Result<Tensor> {
        let meta = self.meta.view(shape.into())?;
        trace!("view {} -> {}", self.meta.shape(), meta.shape());
        Tensor::from_parts(meta, Arc::clone(&self.storage), self.offset)
    }

    /// Bytes this view can address, relative to the start of the storage.
    pub fn byte_range(&self) -> Range<usize> {
        // Validated in `from_parts`.
        let extent = self.meta.extent().unwrap_or(0) * self.element_size();
        self.offset..self.offset + extent
    }

    pub(crate) fn read_bytes(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        self.storage.read_range(self.byte_range())
    }

    pub(crate) fn write_bytes(&self) -> MappedRwLockWriteGuard<'_, [u8]> {
        self.storage.write_range(self.byte_range())
    }

    /// Copies the addressable bytes into a fresh aligned buffer.
    pub(crate) fn snapshot(&self) -> AlignedBytes {
        AlignedBytes::from_slice(&self.read_bytes())
    }

    /// Copies raw bytes into a contiguous host tensor.
    pub fn load(&self, src: &[u8]) -> Result<()> {
        if !self.device().is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: "load",
                device: self.device(),
            });
        }
        if !self.is_contiguous() {
            return Err(TensorError::invalid("load", "destination is not contiguous"));
        }
        let expected = self.numel() * self.element_size();
        if src.len() != expected {
            return Err(TensorError::invalid(
                "load",
                format!("expected {} bytes, got {}", expected, src.len()),
            ));
        }
        self.write_bytes().copy_from_slice(src);
        Ok(())
    }

    /// Typed variant of [`load`](Tensor::load).
    pub fn load_slice<T: Element>(&self, data: &[T]) -> Result<()> {
        if T::DTYPE != self.dtype() {
            return Err(TensorError::DTypeMismatch {
                op: "load",
                expected: self.dtype(),
                got: T::DTYPE,
            });
        }
        self.load(bytemuck::cast_slice(data))
    }

    /// Host copy of the elements in logical (row-major) order. Works on
    /// non-contiguous views.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype() {
            return Err(TensorError::DTypeMismatch {
                op: "to_vec",
                expected: self.dtype(),
                got: T::DTYPE,
            });
        }
        if !self.device().is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: "to_vec",
                device: self.device(),
            });
        }
        self.gather::<T>("to_vec")
    }

    /// Dense copy of the elements reinterpreted as `T`, which must have the
    /// element size of this tensor's dtype.
    pub(crate) fn gather<T: Pod>(&self, op: &'static str) -> Result<Vec<T>> {
        if std::mem::size_of::<T>() != self.element_size() {
            return Err(TensorError::Layout {
                op,
                reason: format!(
                    "cannot read {} elements as {}-byte values",
                    self.dtype(),
                    std::mem::size_of::<T>()
                ),
            });
        }
        let bytes = self.read_bytes();
        let src = bytemuck::try_cast_slice::<u8, T>(&bytes).map_err(|e| TensorError::Layout {
            op,
            reason: e.to_string(),
        })?;
        let mut out = vec![T::zeroed(); self.numel()];
        let dense = self.meta.shape().strides();
        rearrange(&mut out, src, self.shape(), &dense, self.strides());
        Ok(out)
    }

    /// One-line summary: shape, strides and dtype.
    pub fn info(&self) -> String {
        format!(
            "Tensor: shape{:?} strides{:?} dtype={} device={}",
            self.shape(),
            self.strides(),
            self.dtype(),
            self.device()
        )
    }
}
