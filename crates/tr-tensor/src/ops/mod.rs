//! Operator entry points.
//!
//! Every operator writes into a caller-allocated output and checks its operands
//! in a fixed order before any kernel runs:
//!
//! 1. all tensors live on one device ([`TensorError::DeviceMismatch`]),
//! 2. ranks and shapes agree (`InvalidArgument` / `ShapeMismatch`),
//! 3. element types agree ([`TensorError::DTypeMismatch`]),
//! 4. operands are dense (a panic; `rearrange` accepts any strides),
//! 5. the [`Context`] selects a backend, which picks the typed kernel.

mod argmax;
mod attention;
mod embedding;
mod layout;
mod linear;
mod rearrange;
mod rms_norm;
mod rope;

pub use argmax::argmax;
pub use attention::self_attention;
pub use embedding::embedding;
pub use layout::{contiguous, reshape, to_device};
pub use linear::linear;
pub use rearrange::rearrange;
pub use rms_norm::rms_norm;
pub use rope::rope;

use std::ops::Deref;

use log::debug;
use parking_lot::MappedRwLockReadGuard;

use crate::backend::ComputeBackend;
use crate::context::Context;
use crate::device::Device;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::storage::AlignedBytes;
use crate::tensor::Tensor;

/// Returns the device shared by `tensors`.
fn check_same_device(op: &'static str, tensors: &[&Tensor]) -> Result<Device> {
    let device = tensors.first().map(|t| t.device()).unwrap_or_default();
    for t in tensors {
        if t.device() != device {
            return Err(TensorError::DeviceMismatch {
                op,
                expected: device,
                got: t.device(),
            });
        }
    }
    Ok(device)
}

fn check_rank(op: &'static str, name: &str, t: &Tensor, rank: usize) -> Result<()> {
    if t.ndim() != rank {
        return Err(TensorError::invalid(
            op,
            format!("{} must be {}-D, got shape {:?}", name, rank, t.shape()),
        ));
    }
    Ok(())
}

fn check_shape(op: &'static str, t: &Tensor, expected: &[usize]) -> Result<()> {
    if t.shape() != expected {
        return Err(TensorError::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            got: t.shape().to_vec(),
        });
    }
    Ok(())
}

fn check_dtype(op: &'static str, t: &Tensor, expected: DType) -> Result<()> {
    if t.dtype() != expected {
        return Err(TensorError::DTypeMismatch {
            op,
            expected,
            got: t.dtype(),
        });
    }
    Ok(())
}

/// Kernels index operands with canonical strides; anything else is a caller bug.
fn assert_contiguous(op: &'static str, tensors: &[(&str, &Tensor)]) {
    for (name, t) in tensors {
        assert!(
            t.is_contiguous(),
            "{}: {} must be contiguous (shape {:?}, strides {:?})",
            op,
            name,
            t.shape(),
            t.strides()
        );
    }
}

/// Backend for `device`, logging the dispatch.
fn dispatch<'a>(
    ctx: &'a mut Context,
    op: &'static str,
    device: Device,
    dtype: DType,
) -> Result<&'a dyn ComputeBackend> {
    debug!("{} on {} ({})", op, device, dtype);
    ctx.backend_for(op, device)
}

/// Read access to an operand's bytes.
///
/// Operands backed by the same storage as an output are copied first so the
/// output's write lock can be taken while the input is still being read.
enum Input<'a> {
    Shared(MappedRwLockReadGuard<'a, [u8]>),
    Copied(AlignedBytes),
}

impl Deref for Input<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Input::Shared(guard) => &**guard,
            Input::Copied(bytes) => &**bytes,
        }
    }
}

fn acquire<'a>(input: &'a Tensor, outputs: &[&Tensor]) -> Input<'a> {
    if outputs.iter().any(|out| out.shares_storage(input)) {
        Input::Copied(input.snapshot())
    } else {
        Input::Shared(input.read_bytes())
    }
}
