use super::{
    acquire, assert_contiguous, check_dtype, check_rank, check_same_device, check_shape, dispatch,
};
use crate::context::Context;
use crate::cpu::attention::AttentionDims;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

const OP: &str = "self_attention";

/// Causal grouped-query attention.
///
/// - `q`, `out`: [Sq, H, Dh]
/// - `k`, `v`: [Skv, Hkv, Dh], with `Hkv` dividing `H`
///
/// Query position `i` attends to key positions `j <= i`; scores are multiplied
/// by `scale` before the softmax.
pub fn self_attention(
    ctx: &mut Context,
    out: &Tensor,
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    scale: f32,
) -> Result<()> {
    let device = check_same_device(OP, &[out, q, k, v])?;

    check_rank(OP, "q", q, 3)?;
    check_rank(OP, "k", k, 3)?;
    let dims = AttentionDims {
        q_len: q.shape()[0],
        kv_len: k.shape()[0],
        n_heads: q.shape()[1],
        n_kv_heads: k.shape()[1],
        head_dim: q.shape()[2],
    };
    check_shape(OP, out, q.shape())?;
    check_shape(OP, k, &[dims.kv_len, dims.n_kv_heads, dims.head_dim])?;
    check_shape(OP, v, k.shape())?;
    if dims.n_kv_heads == 0 || dims.n_heads % dims.n_kv_heads != 0 {
        return Err(TensorError::invalid(
            OP,
            format!(
                "{} query heads cannot be grouped over {} kv heads",
                dims.n_heads, dims.n_kv_heads
            ),
        ));
    }
    if dims.q_len > 0 && dims.kv_len == 0 {
        return Err(TensorError::invalid(OP, "queries need at least one key position"));
    }

    let dtype = out.dtype();
    for t in [q, k, v] {
        check_dtype(OP, t, dtype)?;
    }

    assert_contiguous(OP, &[("out", out), ("q", q), ("k", k), ("v", v)]);

    let backend = dispatch(ctx, OP, device, dtype)?;
    let q_bytes = acquire(q, &[out]);
    let k_bytes = acquire(k, &[out]);
    let v_bytes = acquire(v, &[out]);
    backend.self_attention(
        &mut out.write_bytes(),
        &q_bytes,
        &k_bytes,
        &v_bytes,
        dtype,
        dims,
        scale,
    )
}
