use crate::element::Float;

/// Problem size for [`rope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopeDims {
    pub seq_len: usize,
    pub n_heads: usize,
    /// Must be even.
    pub head_dim: usize,
}

/// Rotary position embedding over `[seq_len, n_heads, head_dim]`.
///
/// Each head vector is split into halves `a = x[..d/2]`, `b = x[d/2..]`; pair `j`
/// is rotated by `pos / theta^(2j/d)`:
///
///   a'_j = a_j cos - b_j sin
///   b'_j = b_j cos + a_j sin
pub fn rope<T: Float>(out: &mut [T], input: &[T], pos_ids: &[i64], dims: RopeDims, theta: f32) {
    let RopeDims {
        seq_len,
        n_heads,
        head_dim,
    } = dims;
    let half = head_dim / 2;

    for s in 0..seq_len {
        let pos = pos_ids[s] as f32;
        for j in 0..half {
            let angle = pos / theta.powf(2.0 * j as f32 / head_dim as f32);
            let (sin, cos) = angle.sin_cos();
            for h in 0..n_heads {
                let base = (s * n_heads + h) * head_dim;
                let a = input[base + j].to_f32();
                let b = input[base + half + j].to_f32();
                out[base + j] = T::from_f32(a * cos - b * sin);
                out[base + half + j] = T::from_f32(b * cos + a * sin);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_position_is_identity() {
        let input = [1.0f32, 2.0, 3.0, 4.0];
        let mut out = [0.0f32; 4];
        let dims = RopeDims {
            seq_len: 1,
            n_heads: 1,
            head_dim: 4,
        };
        rope(&mut out, &input, &[0], dims, 10000.0);
        assert_eq!(out, input);
    }

    #[test]
    fn test_rotates_half_pairs() {
        // head_dim 2: one pair (x[0], x[1]) rotated by pos radians.
        let input = [1.0f32, 0.0];
        let mut out = [0.0f32; 2];
        let dims = RopeDims {
            seq_len: 1,
            n_heads: 1,
            head_dim: 2,
        };
        rope(&mut out, &input, &[1], dims, 10000.0);
        assert_abs_diff_eq!(out[0], 1.0f32.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 1.0f32.sin(), epsilon = 1e-6);
    }

    #[test]
    fn test_frequency_decays_with_pair_index() {
        // head_dim 4, theta 100: pair 1 uses pos / 100^(2/4) = pos / 10.
        let input = [0.0f32, 1.0, 0.0, 0.0];
        let mut out = [0.0f32; 4];
        let dims = RopeDims {
            seq_len: 1,
            n_heads: 1,
            head_dim: 4,
        };
        rope(&mut out, &input, &[5], dims, 100.0);
        assert_abs_diff_eq!(out[1], 0.5f32.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(out[3], 0.5f32.sin(), epsilon = 1e-6);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_preserves_norm() {
        let input = [0.3f32, -1.2, 2.0, 0.7, 1.0, 1.0, -1.0, 0.5];
        let mut out = [0.0f32; 8];
        let dims = RopeDims {
            seq_len: 2,
            n_heads: 1,
            head_dim: 4,
        };
        rope(&mut out, &input, &[3, 17], dims, 10000.0);
        for s in 0..2 {
            let n_in: f32 = input[s * 4..s * 4 + 4].iter().map(|v| v * v).sum();
            let n_out: f32 = out[s * 4..s * 4 + 4].iter().map(|v| v * v).sum();
            assert_abs_diff_eq!(n_in, n_out, epsilon = 1e-4);
        }
    }
}
