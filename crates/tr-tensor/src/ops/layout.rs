use log::trace;

use super::rearrange;
use crate::context::Context;
use crate::device::Device;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::tensor::Tensor;

/// Dense version of `t`. Returns `t` itself (sharing storage) when it is
/// already contiguous, otherwise a fresh row-major copy.
pub fn contiguous(ctx: &mut Context, t: &Tensor) -> Result<Tensor> {
    if t.is_contiguous() {
        return Ok(t.clone());
    }
    trace!("materializing {}", t.info());
    let out = Tensor::create(t.shape(), t.dtype(), t.device())?;
    rearrange(ctx, &out, t)?;
    Ok(out)
}

/// Reshape that copies only when `t` cannot be viewed in place.
pub fn reshape(ctx: &mut Context, t: &Tensor, shape: impl Into<Shape>) -> Result<Tensor> {
    let shape = shape.into();
    if shape.checked_numel() != Some(t.numel()) {
        return Err(TensorError::ShapeMismatch {
            op: "reshape",
            expected: t.shape().to_vec(),
            got: shape.dims().to_vec(),
        });
    }
    contiguous(ctx, t)?.view(shape)
}

/// Dense copy of `t` on `device`.
///
/// Only host-to-host copies exist; any accelerator endpoint reports
/// `CapabilityUnavailable`.
pub fn to_device(ctx: &mut Context, t: &Tensor, device: Device) -> Result<Tensor> {
    for endpoint in [t.device(), device] {
        if !endpoint.is_cpu() {
            return Err(TensorError::CapabilityUnavailable {
                op: "to_device",
                device: endpoint,
            });
        }
    }
    ctx.set_device(device)?;
    let out = Tensor::create(t.shape(), t.dtype(), device)?;
    rearrange(ctx, &out, t)?;
    Ok(out)
}
