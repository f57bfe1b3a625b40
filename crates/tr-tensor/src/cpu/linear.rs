use crate::element::Float;

/// Problem size for [`linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearDims {
    /// Rows of the input (tokens).
    pub rows: usize,
    pub in_features: usize,
    pub out_features: usize,
}

/// `out = input @ weightᵗ + bias`.
///
/// - `input`: [rows, in_features]
/// - `weight`: [out_features, in_features]
/// - `bias`: [out_features], optional
/// - `out`: [rows, out_features]
///
/// Dot products accumulate in f32 and are narrowed once on store.
pub fn linear<T: Float>(
    out: &mut [T],
    input: &[T],
    weight: &[T],
    bias: Option<&[T]>,
    dims: LinearDims,
) {
    let LinearDims {
        rows,
        in_features,
        out_features,
    } = dims;

    for i in 0..rows {
        let in_row = &input[i * in_features..(i + 1) * in_features];
        for j in 0..out_features {
            let w_row = &weight[j * in_features..(j + 1) * in_features];
            let mut acc = 0.0f32;
            for k in 0..in_features {
                acc += in_row[k].to_f32() * w_row[k].to_f32();
            }
            if let Some(bias) = bias {
                acc += bias[j].to_f32();
            }
            out[i * out_features + j] = T::from_f32(acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::bf16;

    #[test]
    fn test_linear_no_bias() {
        let mut out = [0.0f32; 2];
        let dims = LinearDims {
            rows: 1,
            in_features: 2,
            out_features: 2,
        };
        linear(&mut out, &[1.0, 0.0], &[1.0, 2.0, 3.0, 4.0], None, dims);
        assert_eq!(out, [1.0, 3.0]);
    }

    #[test]
    fn test_linear_bias() {
        let mut out = [0.0f32; 4];
        let dims = LinearDims {
            rows: 2,
            in_features: 2,
            out_features: 2,
        };
        linear(
            &mut out,
            &[1.0, 2.0, 3.0, 4.0],
            &[1.0, 0.0, 0.0, 1.0],
            Some(&[0.5, -0.5]),
            dims,
        );
        assert_eq!(out, [1.5, 1.5, 3.5, 3.5]);
    }

    #[test]
    fn test_linear_bf16() {
        let x: Vec<bf16> = [1.0f32, 2.0].iter().map(|&v| bf16::from_f32(v)).collect();
        let w: Vec<bf16> = [3.0f32, 4.0].iter().map(|&v| bf16::from_f32(v)).collect();
        let mut out = [bf16::ZERO];
        let dims = LinearDims {
            rows: 1,
            in_features: 2,
            out_features: 1,
        };
        linear(&mut out, &x, &w, None, dims);
        assert_eq!(out[0].to_f32(), 11.0);
    }
}
