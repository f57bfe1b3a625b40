use super::{
    acquire, assert_contiguous, check_dtype, check_rank, check_same_device, check_shape, dispatch,
};
use crate::context::Context;
use crate::cpu::linear::LinearDims;
use crate::error::Result;
use crate::tensor::Tensor;

const OP: &str = "linear";

/// Affine projection `out = input @ weightᵗ + bias`.
///
/// - `input`: [N, Fin]
/// - `weight`: [Fout, Fin]
/// - `bias`: [Fout], optional
/// - `out`: [N, Fout]
pub fn linear(
    ctx: &mut Context,
    out: &Tensor,
    input: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<()> {
    let mut operands = vec![out, input, weight];
    operands.extend(bias);
    let device = check_same_device(OP, &operands)?;

    check_rank(OP, "input", input, 2)?;
    check_rank(OP, "weight", weight, 2)?;
    let dims = LinearDims {
        rows: input.shape()[0],
        in_features: input.shape()[1],
        out_features: weight.shape()[0],
    };
    check_shape(OP, weight, &[dims.out_features, dims.in_features])?;
    check_shape(OP, out, &[dims.rows, dims.out_features])?;
    if let Some(bias) = bias {
        check_shape(OP, bias, &[dims.out_features])?;
    }

    let dtype = out.dtype();
    for t in &operands[1..] {
        check_dtype(OP, t, dtype)?;
    }

    assert_contiguous(OP, &[("out", out), ("input", input), ("weight", weight)]);
    if let Some(bias) = bias {
        assert_contiguous(OP, &[("bias", bias)]);
    }

    let backend = dispatch(ctx, OP, device, dtype)?;
    let input_bytes = acquire(input, &[out]);
    let weight_bytes = acquire(weight, &[out]);
    let bias_bytes = bias.map(|b| acquire(b, &[out]));
    backend.linear(
        &mut out.write_bytes(),
        &input_bytes,
        &weight_bytes,
        bias_bytes.as_deref(),
        dtype,
        dims,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::dtype::DType;
    use crate::error::TensorError;
    use half::bf16;

    #[test]
    fn test_linear_with_bias() {
        let mut ctx = Context::default();
        let input = Tensor::from_slice(&[1.0f32, 2.0], [1, 2]).unwrap();
        let weight = Tensor::from_slice(&[1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0], [3, 2]).unwrap();
        let bias = Tensor::from_slice(&[0.5f32, -1.0, 0.0], [3]).unwrap();
        let out = Tensor::create([1, 3], DType::F32, Device::Cpu).unwrap();
        linear(&mut ctx, &out, &input, &weight, Some(&bias)).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![1.5, 1.0, 3.0]);
    }

    #[test]
    fn test_linear_bf16() {
        let mut ctx = Context::default();
        let conv = |v: &[f32]| v.iter().map(|&x| bf16::from_f32(x)).collect::<Vec<_>>();
        let input = Tensor::from_slice(&conv(&[1.0, 0.0]), [1, 2]).unwrap();
        let weight = Tensor::from_slice(&conv(&[1.0, 2.0, 3.0, 4.0]), [2, 2]).unwrap();
        let out = Tensor::create([1, 2], DType::BF16, Device::Cpu).unwrap();
        linear(&mut ctx, &out, &input, &weight, None).unwrap();
        assert_eq!(out.to_vec::<bf16>().unwrap(), conv(&[1.0, 3.0]));
    }

    #[test]
    fn test_linear_shape_errors() {
        let mut ctx = Context::default();
        let input = Tensor::create([2, 3], DType::F32, Device::Cpu).unwrap();
        let weight = Tensor::create([4, 2], DType::F32, Device::Cpu).unwrap();
        let out = Tensor::create([2, 4], DType::F32, Device::Cpu).unwrap();
        let err = linear(&mut ctx, &out, &input, &weight, None).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { op: "linear", .. }));

        let weight = Tensor::create([4, 3], DType::F32, Device::Cpu).unwrap();
        let bias = Tensor::create([3], DType::F32, Device::Cpu).unwrap();
        assert!(linear(&mut ctx, &out, &input, &weight, Some(&bias)).is_err());
    }

    #[test]
    fn test_linear_dtype_mismatch() {
        let mut ctx = Context::default();
        let input = Tensor::create([1, 2], DType::F16, Device::Cpu).unwrap();
        let weight = Tensor::create([2, 2], DType::F32, Device::Cpu).unwrap();
        let out = Tensor::create([1, 2], DType::F32, Device::Cpu).unwrap();
        let err = linear(&mut ctx, &out, &input, &weight, None).unwrap_err();
        assert!(matches!(
            err,
            TensorError::DTypeMismatch { expected: DType::F32, got: DType::F16, .. }
        ));
    }

    #[test]
    fn test_linear_unsupported_dtype() {
        let mut ctx = Context::default();
        let input = Tensor::create([1, 2], DType::I32, Device::Cpu).unwrap();
        let weight = Tensor::create([2, 2], DType::I32, Device::Cpu).unwrap();
        let out = Tensor::create([1, 2], DType::I32, Device::Cpu).unwrap();
        let err = linear(&mut ctx, &out, &input, &weight, None).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedDType { .. }));
    }

    #[test]
    #[should_panic(expected = "linear: weight must be contiguous")]
    fn test_linear_requires_dense_weight() {
        let mut ctx = Context::default();
        let input = Tensor::create([1, 2], DType::F32, Device::Cpu).unwrap();
        let weight = Tensor::create([2, 2], DType::F32, Device::Cpu)
            .unwrap()
            .permute(&[1, 0])
            .unwrap();
        let out = Tensor::create([1, 2], DType::F32, Device::Cpu).unwrap();
        let _ = linear(&mut ctx, &out, &input, &weight, None);
    }

    #[test]
    fn test_linear_empty_reduction_writes_bias() {
        let mut ctx = Context::default();
        let input = Tensor::create([2, 0], DType::F32, Device::Cpu).unwrap();
        let weight = Tensor::create([2, 0], DType::F32, Device::Cpu).unwrap();
        let bias = Tensor::from_slice(&[3.0f32, 4.0], [2]).unwrap();
        let out = Tensor::create([2, 2], DType::F32, Device::Cpu).unwrap();
        linear(&mut ctx, &out, &input, &weight, Some(&bias)).unwrap();
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![3.0, 4.0, 3.0, 4.0]);
    }
}
