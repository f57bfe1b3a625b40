use super::{acquire, check_dtype, check_same_device, check_shape, dispatch};
use crate::context::Context;
use crate::error::Result;
use crate::tensor::Tensor;

const OP: &str = "rearrange";

/// Copies `input` into `out` element by element. The two views must have equal
/// shape and dtype; their strides are independent and need not be dense.
pub fn rearrange(ctx: &mut Context, out: &Tensor, input: &Tensor) -> Result<()> {
    let device = check_same_device(OP, &[out, input])?;
    check_shape(OP, input, out.shape())?;
    let dtype = out.dtype();
    check_dtype(OP, input, dtype)?;

    let backend = dispatch(ctx, OP, device, dtype)?;
    let input_bytes = acquire(input, &[out]);
    backend.rearrange(
        &mut out.write_bytes(),
        &input_bytes,
        dtype,
        out.shape(),
        out.strides(),
        input.strides(),
    )
}
