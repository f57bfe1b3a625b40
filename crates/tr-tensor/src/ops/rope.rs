use super::{
    acquire, assert_contiguous, check_dtype, check_rank, check_same_device, check_shape, dispatch,
};
use crate::context::Context;
use crate::cpu::rope::RopeDims;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

const OP: &str = "rope";

/// Rotary position embedding.
///
/// - `input`, `out`: [S, H, Dh] with `Dh` even
/// - `pos_ids`: i64 [S]
///
/// `out` may be `input` itself.
pub fn rope(
    ctx: &mut Context,
    out: &Tensor,
    input: &Tensor,
    pos_ids: &Tensor,
    theta: f32,
) -> Result<()> {
    let device = check_same_device(OP, &[out, input, pos_ids])?;

    check_rank(OP, "input", input, 3)?;
    let dims = RopeDims {
        seq_len: input.shape()[0],
        n_heads: input.shape()[1],
        head_dim: input.shape()[2],
    };
    if dims.head_dim % 2 != 0 {
        return Err(TensorError::invalid(
            OP,
            format!("head dimension {} must be even", dims.head_dim),
        ));
    }
    check_shape(OP, out, input.shape())?;
    check_shape(OP, pos_ids, &[dims.seq_len])?;

    let dtype = out.dtype();
    check_dtype(OP, input, dtype)?;
    check_dtype(OP, pos_ids, DType::I64)?;

    assert_contiguous(OP, &[("out", out), ("input", input), ("pos_ids", pos_ids)]);

    let backend = dispatch(ctx, OP, device, dtype)?;
    let input_bytes = acquire(input, &[out]);
    let pos_bytes = acquire(pos_ids, &[out]);
    backend.rope(
        &mut out.write_bytes(),
        &input_bytes,
        &pos_bytes,
        dtype,
        dims,
        theta,
    )
}
