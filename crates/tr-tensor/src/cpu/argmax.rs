use crate::element::Float;

/// Index and value of the largest element; ties go to the lowest index.
/// Returns `None` for an empty slice.
pub fn argmax<T: Float>(vals: &[T]) -> Option<(usize, T)> {
    let (&first, rest) = vals.split_first()?;
    let mut best_idx = 0;
    let mut best = first;
    let mut best_f = first.to_f32();
    for (i, &v) in rest.iter().enumerate() {
        let f = v.to_f32();
        if f > best_f {
            best_idx = i + 1;
            best = v;
            best_f = f;
        }
    }
    Some((best_idx, best))
}
