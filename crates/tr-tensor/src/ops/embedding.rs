use log::{debug, warn};

use super::{
    acquire, assert_contiguous, check_dtype, check_rank, check_same_device, check_shape, dispatch,
};
use crate::config::IndexPolicy;
use crate::context::Context;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

const OP: &str = "embedding";

/// Row gather `out[i] = weight[index[i]]`.
///
/// - `index`: i64 [L]
/// - `weight`: [V, D]
/// - `out`: [L, D]
///
/// Out-of-range indices are handled by the context's [`IndexPolicy`]: skipped
/// rows keep whatever `out` held before the call.
pub fn embedding(ctx: &mut Context, out: &Tensor, index: &Tensor, weight: &Tensor) -> Result<()> {
    let device = check_same_device(OP, &[out, index, weight])?;

    check_rank(OP, "index", index, 1)?;
    check_rank(OP, "weight", weight, 2)?;
    let len = index.shape()[0];
    let (vocab, dim) = (weight.shape()[0], weight.shape()[1]);
    check_shape(OP, out, &[len, dim])?;

    check_dtype(OP, index, DType::I64)?;
    check_dtype(OP, weight, out.dtype())?;

    assert_contiguous(OP, &[("out", out), ("index", index), ("weight", weight)]);

    let policy = ctx.config().index_policy;
    let dtype = out.dtype();
    let backend = dispatch(ctx, OP, device, dtype)?;
    let index_bytes = acquire(index, &[out]);
    let weight_bytes = acquire(weight, &[out]);
    let indices =
        bytemuck::try_cast_slice::<u8, i64>(&index_bytes).map_err(|e| TensorError::Layout {
            op: OP,
            reason: e.to_string(),
        })?;
    check_indices(policy, indices, vocab)?;

    let skipped = backend.embedding(
        &mut out.write_bytes(),
        &index_bytes,
        &weight_bytes,
        dtype,
        vocab,
        dim,
    )?;
    if skipped > 0 {
        match policy {
            IndexPolicy::SkipInvalid => warn!(
                "embedding: skipped {} of {} rows with index outside [0, {})",
                skipped, len, vocab
            ),
            _ => debug!("embedding: skipped {} ignored rows", skipped),
        }
    }
    Ok(())
}

/// Rejects indices the policy does not allow to be skipped, before anything is written.
fn check_indices(policy: IndexPolicy, indices: &[i64], vocab: usize) -> Result<()> {
    let in_range = |idx: i64| idx >= 0 && (idx as u64) < vocab as u64;
    if let IndexPolicy::IgnoreIndex(ignored) = policy {
        if in_range(ignored) {
            return Err(TensorError::invalid(
                OP,
                format!("ignore index {} lies inside the vocabulary of {}", ignored, vocab),
            ));
        }
    }
    for (pos, &idx) in indices.iter().enumerate() {
        if !in_range(idx) && !policy.allows_skip(idx) {
            return Err(TensorError::invalid(
                OP,
                format!("index {} at position {} outside vocabulary of {}", idx, pos, vocab),
            ));
        }
    }
    Ok(())
}
