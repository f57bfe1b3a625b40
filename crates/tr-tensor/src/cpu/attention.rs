use crate::element::Float;

/// Problem size for [`self_attention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionDims {
    pub q_len: usize,
    pub kv_len: usize,
    pub n_heads: usize,
    /// Divides `n_heads`.
    pub n_kv_heads: usize,
    pub head_dim: usize,
}

/// Causal grouped-query attention.
///
/// - `q`, `out`: [q_len, n_heads, head_dim]
/// - `k`, `v`: [kv_len, n_kv_heads, head_dim]
///
/// Query head `h` reads kv head `h / (n_heads / n_kv_heads)`. Query position `i`
/// attends to kv positions `j <= i`. Scores, softmax and the weighted sum run in
/// f32; each output element is narrowed once.
pub fn self_attention<T: Float>(
    out: &mut [T],
    q: &[T],
    k: &[T],
    v: &[T],
    dims: AttentionDims,
    scale: f32,
) {
    let AttentionDims {
        q_len,
        kv_len,
        n_heads,
        n_kv_heads,
        head_dim,
    } = dims;
    if n_kv_heads == 0 {
        return;
    }
    let group = n_heads / n_kv_heads;

    let mut scores = vec![0.0f32; kv_len];
    let mut acc = vec![0.0f32; head_dim];

    for i in 0..q_len {
        let visible = (i + 1).min(kv_len);
        for h in 0..n_heads {
            let kv_h = h / group;
            let q_vec = &q[(i * n_heads + h) * head_dim..][..head_dim];

            let mut max_score = f32::NEG_INFINITY;
            for j in 0..visible {
                let k_vec = &k[(j * n_kv_heads + kv_h) * head_dim..][..head_dim];
                let mut dot = 0.0f32;
                for d in 0..head_dim {
                    dot += q_vec[d].to_f32() * k_vec[d].to_f32();
                }
                let score = dot * scale;
                scores[j] = score;
                max_score = max_score.max(score);
            }

            let mut sum = 0.0f32;
            for score in &mut scores[..visible] {
                *score = (*score - max_score).exp();
                sum += *score;
            }

            acc.fill(0.0);
            for j in 0..visible {
                let p = scores[j] / sum;
                let v_vec = &v[(j * n_kv_heads + kv_h) * head_dim..][..head_dim];
                for d in 0..head_dim {
                    acc[d] += p * v_vec[d].to_f32();
                }
            }

            let out_vec = &mut out[(i * n_heads + h) * head_dim..][..head_dim];
            for d in 0..head_dim {
                out_vec[d] = T::from_f32(acc[d]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dims(
        q_len: usize,
        kv_len: usize,
        n_heads: usize,
        n_kv_heads: usize,
        head_dim: usize,
    ) -> AttentionDims {
        AttentionDims {
            q_len,
            kv_len,
            n_heads,
            n_kv_heads,
            head_dim,
        }
    }

    #[test]
    fn test_first_position_copies_first_value() {
        let q = [1.0f32, 0.0, 0.0, 1.0];
        let k = [1.0f32, 0.0, 0.0, 1.0];
        let v = [5.0f32, 6.0, 7.0, 8.0];
        let mut out = [0.0f32; 4];
        self_attention(&mut out, &q, &k, &v, dims(2, 2, 1, 1, 2), 1.0);
        assert_abs_diff_eq!(out[0], 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_softmax_weights() {
        // Position 1 sees scores [0, 1] -> weights [1/(1+e), e/(1+e)].
        let q = [0.0f32, 1.0];
        let k = [0.0f32, 1.0];
        let v = [0.0f32, 1.0];
        let mut out = [0.0f32; 2];
        self_attention(&mut out, &q, &k, &v, dims(2, 2, 1, 1, 1), 1.0);
        let e = std::f32::consts::E;
        assert_abs_diff_eq!(out[1], e / (1.0 + e), epsilon = 1e-6);
    }

    #[test]
    fn test_grouped_heads_share_kv() {
        // Two query heads over one kv head read identical values.
        let q = [0.3f32, -0.1, 0.9, 0.4];
        let k = [0.5f32, 0.2];
        let v = [1.5f32, -2.5];
        let mut out = [0.0f32; 4];
        self_attention(&mut out, &q, &k, &v, dims(1, 1, 2, 1, 2), 0.7);
        assert_eq!(out, [1.5, -2.5, 1.5, -2.5]);
    }

    #[test]
    fn test_large_scores_stay_finite() {
        let q = [100.0f32, 100.0];
        let k = [100.0f32, 100.0];
        let v = [1.0f32, 3.0];
        let mut out = [0.0f32; 2];
        self_attention(&mut out, &q, &k, &v, dims(2, 2, 1, 1, 1), 1.0);
        assert!(out.iter().all(|x| x.is_finite()));
        assert_abs_diff_eq!(out[1], 2.0, epsilon = 1e-6);
    }
}
