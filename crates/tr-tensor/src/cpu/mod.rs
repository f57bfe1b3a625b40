pub mod argmax;
pub mod attention;
pub mod embedding;
pub mod linear;
pub mod rearrange;
pub mod rms_norm;
pub mod rope;

use bytemuck::Pod;
use half::{bf16, f16};

use crate::backend::ComputeBackend;
use crate::dtype::DType;
use crate::error::{Result, TensorError};

use attention::AttentionDims;
use linear::LinearDims;
use rope::RopeDims;

/// Pure-Rust CPU compute backend.
///
/// Straightforward loops optimized for correctness rather than peak
/// performance. Intended as the reference implementation.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn typed<'a, T: Pod>(op: &'static str, bytes: &'a [u8]) -> Result<&'a [T]> {
    bytemuck::try_cast_slice(bytes).map_err(|e| TensorError::Layout {
        op,
        reason: e.to_string(),
    })
}

fn typed_mut<'a, T: Pod>(op: &'static str, bytes: &'a mut [u8]) -> Result<&'a mut [T]> {
    bytemuck::try_cast_slice_mut(bytes).map_err(|e| TensorError::Layout {
        op,
        reason: e.to_string(),
    })
}

/// Runs `$body` with `$t` bound to the Rust type of a kernel float dtype.
macro_rules! with_float {
    ($op:expr, $dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DType::F32 => {
                type $t = f32;
                $body
            }
            DType::F16 => {
                type $t = f16;
                $body
            }
            DType::BF16 => {
                type $t = bf16;
                $body
            }
            other => Err(TensorError::UnsupportedDType {
                op: $op,
                dtype: other,
            }),
        }
    };
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn embedding(
        &self,
        out: &mut [u8],
        index: &[u8],
        weight: &[u8],
        dtype: DType,
        vocab: usize,
        dim: usize,
    ) -> Result<usize> {
        const OP: &str = "embedding";
        let index = typed::<i64>(OP, index)?;
        with_float!(OP, dtype, T => Ok(embedding::embedding::<T>(
            typed_mut(OP, out)?,
            index,
            typed(OP, weight)?,
            vocab,
            dim,
        )))
    }

    fn linear(
        &self,
        out: &mut [u8],
        input: &[u8],
        weight: &[u8],
        bias: Option<&[u8]>,
        dtype: DType,
        dims: LinearDims,
    ) -> Result<()> {
        const OP: &str = "linear";
        with_float!(OP, dtype, T => {
            let bias = match bias {
                Some(b) => Some(typed::<T>(OP, b)?),
                None => None,
            };
            linear::linear::<T>(
                typed_mut(OP, out)?,
                typed(OP, input)?,
                typed(OP, weight)?,
                bias,
                dims,
            );
            Ok(())
        })
    }

    fn rms_norm(
        &self,
        out: &mut [u8],
        input: &[u8],
        weight: &[u8],
        dtype: DType,
        rows: usize,
        cols: usize,
        eps: f32,
    ) -> Result<()> {
        const OP: &str = "rms_norm";
        with_float!(OP, dtype, T => {
            rms_norm::rms_norm::<T>(
                typed_mut(OP, out)?,
                typed(OP, input)?,
                typed(OP, weight)?,
                rows,
                cols,
                eps,
            );
            Ok(())
        })
    }

    fn rope(
        &self,
        out: &mut [u8],
        input: &[u8],
        pos_ids: &[u8],
        dtype: DType,
        dims: RopeDims,
        theta: f32,
    ) -> Result<()> {
        const OP: &str = "rope";
        let pos_ids = typed::<i64>(OP, pos_ids)?;
        with_float!(OP, dtype, T => {
            rope::rope::<T>(typed_mut(OP, out)?, typed(OP, input)?, pos_ids, dims, theta);
            Ok(())
        })
    }

    fn self_attention(
        &self,
        out: &mut [u8],
        q: &[u8],
        k: &[u8],
        v: &[u8],
        dtype: DType,
        dims: AttentionDims,
        scale: f32,
    ) -> Result<()> {
        const OP: &str = "self_attention";
        with_float!(OP, dtype, T => {
            attention::self_attention::<T>(
                typed_mut(OP, out)?,
                typed(OP, q)?,
                typed(OP, k)?,
                typed(OP, v)?,
                dims,
                scale,
            );
            Ok(())
        })
    }

    fn argmax(&self, max_val: &mut [u8], vals: &[u8], dtype: DType) -> Result<Option<usize>> {
        const OP: &str = "argmax";
        with_float!(OP, dtype, T => {
            let found = argmax::argmax::<T>(typed(OP, vals)?);
            if let Some((_, val)) = found {
                typed_mut::<T>(OP, max_val)?[0] = val;
            }
            Ok(found.map(|(idx, _)| idx))
        })
    }

    fn rearrange(
        &self,
        out: &mut [u8],
        input: &[u8],
        dtype: DType,
        shape: &[usize],
        out_strides: &[usize],
        in_strides: &[usize],
    ) -> Result<()> {
        const OP: &str = "rearrange";
        if dtype == DType::I64 {
            let (out, input) = (typed_mut(OP, out)?, typed(OP, input)?);
            rearrange::rearrange::<i64>(out, input, shape, out_strides, in_strides);
            return Ok(());
        }
        with_float!(OP, dtype, T => {
            let (out, input) = (typed_mut(OP, out)?, typed(OP, input)?);
            rearrange::rearrange::<T>(out, input, shape, out_strides, in_strides);
            Ok(())
        })
    }
}
