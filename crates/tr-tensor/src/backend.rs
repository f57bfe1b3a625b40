use std::fmt::Debug;

use crate::cpu::attention::AttentionDims;
use crate::cpu::linear::LinearDims;
use crate::cpu::rope::RopeDims;
use crate::dtype::DType;
use crate::error::Result;

/// Trait for pluggable compute backends.
///
/// Operator entry points in [`ops`](crate::ops) validate tensors, then hand a
/// backend the raw byte regions of each dense operand together with the element
/// type. The backend picks the typed kernel for that element type and writes the
/// result into `out`. Byte regions start at each view's first element.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Row gather. Returns the number of rows skipped for out-of-range indices.
    fn embedding(
        &self,
        out: &mut [u8],
        index: &[u8],
        weight: &[u8],
        dtype: DType,
        vocab: usize,
        dim: usize,
    ) -> Result<usize>;

    /// `out = input @ weightᵗ + bias`.
    fn linear(
        &self,
        out: &mut [u8],
        input: &[u8],
        weight: &[u8],
        bias: Option<&[u8]>,
        dtype: DType,
        dims: LinearDims,
    ) -> Result<()>;

    /// Row-wise RMS normalization of a `[rows, cols]` matrix.
    #[allow(clippy::too_many_arguments)]
    fn rms_norm(
        &self,
        out: &mut [u8],
        input: &[u8],
        weight: &[u8],
        dtype: DType,
        rows: usize,
        cols: usize,
        eps: f32,
    ) -> Result<()>;

    /// Rotary position embedding; `pos_ids` holds i64 positions.
    fn rope(
        &self,
        out: &mut [u8],
        input: &[u8],
        pos_ids: &[u8],
        dtype: DType,
        dims: RopeDims,
        theta: f32,
    ) -> Result<()>;

    /// Causal grouped-query attention.
    #[allow(clippy::too_many_arguments)]
    fn self_attention(
        &self,
        out: &mut [u8],
        q: &[u8],
        k: &[u8],
        v: &[u8],
        dtype: DType,
        dims: AttentionDims,
        scale: f32,
    ) -> Result<()>;

    /// Writes the maximum into `max_val` and returns its index.
    fn argmax(&self, max_val: &mut [u8], vals: &[u8], dtype: DType) -> Result<Option<usize>>;

    /// Strided copy between two views of identical shape.
    fn rearrange(
        &self,
        out: &mut [u8],
        input: &[u8],
        dtype: DType,
        shape: &[usize],
        out_strides: &[usize],
        in_strides: &[usize],
    ) -> Result<()>;
}
