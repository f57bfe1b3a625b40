use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Element type, shape and per-dimension strides (in elements) of a tensor view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorMeta {
    dtype: DType,
    shape: Shape,
    strides: Vec<usize>,
}

impl TensorMeta {
    /// Metadata for a dense row-major tensor of the given shape.
    pub fn contiguous(shape: Shape, dtype: DType) -> Self {
        let strides = shape.strides();
        TensorMeta {
            dtype,
            shape,
            strides,
        }
    }

    pub fn from_parts(dtype: DType, shape: Shape, strides: Vec<usize>) -> Result<Self> {
        if strides.len() != shape.ndim() {
            return Err(TensorError::invalid(
                "layout",
                format!(
                    "rank {} does not match {} strides",
                    shape.ndim(),
                    strides.len()
                ),
            ));
        }
        Ok(TensorMeta {
            dtype,
            shape,
            strides,
        })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn element_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// Scans dimensions last to first, ignoring size-1 dimensions. An empty
    /// view addresses no memory and is always contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.numel() == 0 {
            return true;
        }
        let mut expected = 1usize;
        for (&size, &stride) in self.shape.dims().iter().zip(&self.strides).rev() {
            if size == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected = match expected.checked_mul(size) {
                Some(next) => next,
                None => return false,
            };
        }
        true
    }

    /// Number of elements between the first and one past the last addressed
    /// element. Zero for empty tensors, `None` on overflow.
    pub fn extent(&self) -> Option<usize> {
        if self.numel() == 0 {
            return Some(0);
        }
        let mut last = 0usize;
        for (&size, &stride) in self.shape.dims().iter().zip(&self.strides) {
            last = last.checked_add((size - 1).checked_mul(stride)?)?;
        }
        last.checked_add(1)
    }

    /// Reorders dimensions; `order[i]` names the source axis placed at position `i`.
    pub fn permute(&self, order: &[usize]) -> Result<Self> {
        let ndim = self.ndim();
        if order.len() != ndim {
            return Err(TensorError::invalid(
                "permute",
                format!("order has {} entries for {} dimensions", order.len(), ndim),
            ));
        }
        let mut seen = vec![false; ndim];
        let mut dims = Vec::with_capacity(ndim);
        let mut strides = Vec::with_capacity(ndim);
        for &axis in order {
            if axis >= ndim {
                return Err(TensorError::invalid(
                    "permute",
                    format!("axis {} out of range for {} dimensions", axis, ndim),
                ));
            }
            if seen[axis] {
                return Err(TensorError::invalid(
                    "permute",
                    format!("axis {} appears more than once", axis),
                ));
            }
            seen[axis] = true;
            dims.push(self.shape.dim(axis));
            strides.push(self.strides[axis]);
        }
        Ok(TensorMeta {
            dtype: self.dtype,
            shape: Shape::new(dims),
            strides,
        })
    }

    /// Narrows `dim` to `[start, end)`. Returns the new metadata and the element
    /// offset the view starts at relative to this one.
    pub fn slice(&self, dim: usize, start: usize, end: usize) -> Result<(Self, usize)> {
        if dim >= self.ndim() {
            return Err(TensorError::invalid(
                "slice",
                format!("dim {} out of range for {} dimensions", dim, self.ndim()),
            ));
        }
        let size = self.shape.dim(dim);
        if start > end || end > size {
            return Err(TensorError::invalid(
                "slice",
                format!("range [{}, {}) invalid for dimension of size {}", start, end, size),
            ));
        }
        let mut dims = self.shape.dims().to_vec();
        dims[dim] = end - start;
        let meta = TensorMeta {
            dtype: self.dtype,
            shape: Shape::new(dims),
            strides: self.strides.clone(),
        };
        Ok((meta, start * self.strides[dim]))
    }

    /// Reinterprets a dense layout under a new shape with canonical strides.
    pub fn view(&self, shape: Shape) -> Result<Self> {
        if !self.is_contiguous() {
            return Err(TensorError::invalid("view", "tensor is not contiguous"));
        }
        if shape.checked_numel() != Some(self.numel()) {
            return Err(TensorError::ShapeMismatch {
                op: "view",
                expected: self.shape.dims().to_vec(),
                got: shape.dims().to_vec(),
            });
        }
        Ok(TensorMeta::contiguous(shape, self.dtype))
    }
}
