use super::{
    acquire, assert_contiguous, check_dtype, check_rank, check_same_device, check_shape, dispatch,
};
use crate::context::Context;
use crate::error::Result;
use crate::tensor::Tensor;

const OP: &str = "rms_norm";

/// Row-wise RMS normalization of `input` [R, C] scaled by `weight` [C].
pub fn rms_norm(
    ctx: &mut Context,
    out: &Tensor,
    input: &Tensor,
    weight: &Tensor,
    eps: f32,
) -> Result<()> {
    let device = check_same_device(OP, &[out, input, weight])?;

    check_rank(OP, "input", input, 2)?;
    let (rows, cols) = (input.shape()[0], input.shape()[1]);
    check_shape(OP, out, &[rows, cols])?;
    check_shape(OP, weight, &[cols])?;

    let dtype = out.dtype();
    check_dtype(OP, input, dtype)?;
    check_dtype(OP, weight, dtype)?;

    assert_contiguous(OP, &[("out", out), ("input", input), ("weight", weight)]);

    let backend = dispatch(ctx, OP, device, dtype)?;
    let input_bytes = acquire(input, &[out]);
    let weight_bytes = acquire(weight, &[out]);
    backend.rms_norm(
        &mut out.write_bytes(),
        &input_bytes,
        &weight_bytes,
        dtype,
        rows,
        cols,
        eps,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::dtype::DType;
    use approx::assert_abs_diff_eq;
    use half::f16;

    #[test]
    fn test_rms_norm() {
        let mut ctx = Context::default();
        let input = Tensor::from_slice(&[3.0f32, 4.0], [1, 2]).unwrap();
        let weight = Tensor::from_slice(&[1.0f32, 1.0], [2]).unwrap();
        let out = Tensor::create([1, 2], DType::F32, Device::Cpu).unwrap();
        rms_norm(&mut ctx, &out, &input, &weight, 0.0).unwrap();
        let got = out.to_vec::<f32>().unwrap();
        assert_abs_diff_eq!(got[0], 0.8485, epsilon = 1e-4);
        assert_abs_diff_eq!(got[1], 1.1314, epsilon = 1e-4);
    }

    #[test]
    fn test_in_place() {
        let mut ctx = Context::default();
        let x = Tensor::from_slice(&[3.0f32, 4.0, 1.0, 1.0], [2, 2]).unwrap();
        let weight = Tensor::from_slice(&[2.0f32, 2.0], [2]).unwrap();
        rms_norm(&mut ctx, &x, &x, &weight, 0.0).unwrap();
        let got = x.to_vec::<f32>().unwrap();
        assert_abs_diff_eq!(got[0], 1.6971, epsilon = 1e-4);
        assert_abs_diff_eq!(got[2], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_f16() {
        let mut ctx = Context::default();
        let h = |v: f32| f16::from_f32(v);
        let input = Tensor::from_slice(&[h(3.0), h(4.0)], [1, 2]).unwrap();
        let weight = Tensor::from_slice(&[h(1.0), h(1.0)], [2]).unwrap();
        let out = Tensor::create([1, 2], DType::F16, Device::Cpu).unwrap();
        rms_norm(&mut ctx, &out, &input, &weight, 0.0).unwrap();
        let got = out.to_vec::<f16>().unwrap();
        assert_abs_diff_eq!(got[1].to_f32(), 1.1314, epsilon = 1e-2);
    }

    #[test]
    fn test_empty_slice_is_noop() {
        let mut ctx = Context::default();
        let input = Tensor::create([4, 5], DType::F32, Device::Cpu)
            .unwrap()
            .slice(1, 0, 0)
            .unwrap();
        assert_eq!(input.strides(), &[5, 1]);
        let weight = Tensor::create([0], DType::F32, Device::Cpu).unwrap();
        let out = Tensor::create([4, 0], DType::F32, Device::Cpu).unwrap();
        rms_norm(&mut ctx, &out, &input, &weight, 1e-6).unwrap();
        assert!(out.to_vec::<f32>().unwrap().is_empty());
    }

    #[test]
    fn test_weight_shape() {
        let mut ctx = Context::default();
        let input = Tensor::create([2, 3], DType::F32, Device::Cpu).unwrap();
        let weight = Tensor::create([2], DType::F32, Device::Cpu).unwrap();
        let out = Tensor::create([2, 3], DType::F32, Device::Cpu).unwrap();
        let err = rms_norm(&mut ctx, &out, &input, &weight, 1e-6).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
