use crate::element::Float;

/// Row-wise RMS normalization over `rows` rows of `cols` elements:
///
///   out[r, c] = in[r, c] / sqrt(mean(in[r, :]²) + eps) * weight[c]
pub fn rms_norm<T: Float>(
    out: &mut [T],
    input: &[T],
    weight: &[T],
    rows: usize,
    cols: usize,
    eps: f32,
) {
    if cols == 0 {
        return;
    }
    for r in 0..rows {
        let row = &input[r * cols..(r + 1) * cols];
        let sum_sq: f32 = row
            .iter()
            .map(|v| {
                let v = v.to_f32();
                v * v
            })
            .sum();
        let inv_rms = 1.0 / (sum_sq / cols as f32 + eps).sqrt();

        let out_row = &mut out[r * cols..(r + 1) * cols];
        for c in 0..cols {
            out_row[c] = T::from_f32(row[c].to_f32() * inv_rms * weight[c].to_f32());
        }
    }
}
