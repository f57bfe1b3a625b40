/// Gathers `weight[index[i]]` into `out[i]` for rows of `dim` elements.
///
/// Indices outside `[0, vocab)` leave their output row untouched. Returns how
/// many rows were skipped.
pub fn embedding<T: Copy>(
    out: &mut [T],
    index: &[i64],
    weight: &[T],
    vocab: usize,
    dim: usize,
) -> usize {
    let mut skipped = 0;
    for (i, &idx) in index.iter().enumerate() {
        if idx < 0 || idx as u64 >= vocab as u64 {
            skipped += 1;
            continue;
        }
        let src = idx as usize * dim;
        out[i * dim..(i + 1) * dim].copy_from_slice(&weight[src..src + dim]);
    }
    skipped
}
