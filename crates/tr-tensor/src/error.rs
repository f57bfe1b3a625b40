use thiserror::Error;

use crate::device::Device;
use crate::dtype::DType;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("{op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },
    #[error("{op}: shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("{op}: dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch {
        op: &'static str,
        expected: DType,
        got: DType,
    },
    #[error("{op}: device mismatch: expected {expected}, got {got}")]
    DeviceMismatch {
        op: &'static str,
        expected: Device,
        got: Device,
    },
    #[error("{op}: input must be non-empty")]
    EmptyInput { op: &'static str },
    #[error("view [{offset}, {offset}+{extent}) bytes exceeds storage capacity {capacity}")]
    OutOfBounds {
        offset: usize,
        extent: usize,
        capacity: usize,
    },
    #[error("failed to allocate {bytes} bytes on {device}")]
    AllocationFailed { bytes: usize, device: Device },
    #[error("{op}: unsupported dtype {dtype}")]
    UnsupportedDType { op: &'static str, dtype: DType },
    #[error("{op}: not available on {device}")]
    CapabilityUnavailable { op: &'static str, device: Device },
    #[error("{op}: {reason}")]
    Layout { op: &'static str, reason: String },
}

impl TensorError {
    pub(crate) fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        TensorError::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }

    /// True for the caller-correctable class: bad shapes, dtypes, devices, ranges.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            TensorError::InvalidArgument { .. }
                | TensorError::ShapeMismatch { .. }
                | TensorError::DTypeMismatch { .. }
                | TensorError::DeviceMismatch { .. }
                | TensorError::EmptyInput { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;
