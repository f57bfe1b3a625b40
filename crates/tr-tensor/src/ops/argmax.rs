use super::{acquire, assert_contiguous, check_dtype, check_rank, check_same_device, dispatch};
use crate::context::Context;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

const OP: &str = "argmax";

/// Largest element of the 1-D `vals`, written to the single-element `max_val`
/// (same dtype) and `max_idx` (i64). Ties resolve to the lowest index.
pub fn argmax(ctx: &mut Context, max_idx: &Tensor, max_val: &Tensor, vals: &Tensor) -> Result<()> {
    let device = check_same_device(OP, &[max_idx, max_val, vals])?;

    check_rank(OP, "vals", vals, 1)?;
    if vals.numel() == 0 {
        return Err(TensorError::EmptyInput { op: OP });
    }
    for (name, t) in [("max_idx", max_idx), ("max_val", max_val)] {
        if t.numel() != 1 {
            return Err(TensorError::invalid(
                OP,
                format!("{} must hold one element, got shape {:?}", name, t.shape()),
            ));
        }
    }

    let dtype = vals.dtype();
    check_dtype(OP, max_val, dtype)?;
    check_dtype(OP, max_idx, DType::I64)?;

    assert_contiguous(OP, &[("vals", vals)]);

    let backend = dispatch(ctx, OP, device, dtype)?;
    let found = {
        let vals_bytes = acquire(vals, &[max_idx, max_val]);
        backend.argmax(&mut max_val.write_bytes(), &vals_bytes, dtype)?
    };
    let idx = found.ok_or(TensorError::EmptyInput { op: OP })? as i64;
    max_idx.write_bytes().copy_from_slice(bytemuck::bytes_of(&idx));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::device::Device;
    use crate::layout::TensorMeta;
    use crate::shape::Shape;
    use half::bf16;

    fn outputs(dtype: DType) -> (Tensor, Tensor) {
        (
            Tensor::create([1], DType::I64, Device::Cpu).unwrap(),
            Tensor::create(Vec::<usize>::new(), dtype, Device::Cpu).unwrap(),
        )
    }

    #[test]
    fn test_argmax() {
        let mut ctx = Context::default();
        let vals = Tensor::from_slice(&[1.0f32, 5.0, 3.0], [3]).unwrap();
        let (idx, val) = outputs(DType::F32);
        argmax(&mut ctx, &idx, &val, &vals).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![1]);
        assert_eq!(val.to_vec::<f32>().unwrap(), vec![5.0]);
    }

    #[test]
    fn test_ties_pick_first() {
        let mut ctx = Context::default();
        let data: Vec<bf16> = [2.0f32, 7.0, 7.0].iter().map(|&v| bf16::from_f32(v)).collect();
        let vals = Tensor::from_slice(&data, [3]).unwrap();
        let (idx, val) = outputs(DType::BF16);
        argmax(&mut ctx, &idx, &val, &vals).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![1]);
        assert_eq!(val.to_vec::<bf16>().unwrap(), vec![bf16::from_f32(7.0)]);
    }

    #[test]
    fn test_empty() {
        let mut ctx = Context::default();
        let vals = Tensor::create([0], DType::F32, Device::Cpu).unwrap();
        let (idx, val) = outputs(DType::F32);
        let err = argmax(&mut ctx, &idx, &val, &vals).unwrap_err();
        assert!(matches!(err, TensorError::EmptyInput { op: "argmax" }));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_outputs_in_one_storage() {
        let mut ctx = Context::default();
        let vals = Tensor::from_slice(&[0.5f32, -2.0], [2]).unwrap();
        // Idx and value packed into one 16-byte buffer.
        let buf = Tensor::create([2], DType::I64, Device::Cpu).unwrap();
        let idx = buf.slice(0, 0, 1).unwrap();
        let meta = TensorMeta::contiguous(Shape::from([1]), DType::F32);
        let val = Tensor::from_parts(meta, Arc::clone(buf.storage()), 8).unwrap();
        argmax(&mut ctx, &idx, &val, &vals).unwrap();
        assert_eq!(idx.to_vec::<i64>().unwrap(), vec![0]);
        assert_eq!(val.to_vec::<f32>().unwrap(), vec![0.5]);
    }

    #[test]
    fn test_output_checks() {
        let mut ctx = Context::default();
        let vals = Tensor::from_slice(&[1.0f32, 2.0], [2]).unwrap();
        let wide = Tensor::create([2], DType::I64, Device::Cpu).unwrap();
        let (idx, val) = outputs(DType::F32);
        assert!(argmax(&mut ctx, &wide, &val, &vals).unwrap_err().is_invalid_argument());
        let (_, f16_val) = outputs(DType::F16);
        assert!(matches!(
            argmax(&mut ctx, &idx, &f16_val, &vals),
            Err(TensorError::DTypeMismatch { .. })
        ));
    }
}
