/// Strided element copy: `out[idx · out_strides] = input[idx · in_strides]` for
/// every multi-index `idx` of `shape`, walked in row-major order.
///
/// Both slices start at the first addressed element of their view. A rank-0
/// shape copies a single element.
pub fn rearrange<T: Copy>(
    out: &mut [T],
    input: &[T],
    shape: &[usize],
    out_strides: &[usize],
    in_strides: &[usize],
) {
    let numel: usize = shape.iter().product();
    if numel == 0 {
        return;
    }
    let ndim = shape.len();
    let mut index = vec![0usize; ndim];
    let mut out_pos = 0usize;
    let mut in_pos = 0usize;

    for _ in 0..numel {
        out[out_pos] = input[in_pos];

        // Odometer increment, carrying into outer dimensions.
        for dim in (0..ndim).rev() {
            index[dim] += 1;
            out_pos += out_strides[dim];
            in_pos += in_strides[dim];
            if index[dim] < shape[dim] {
                break;
            }
            out_pos -= out_strides[dim] * shape[dim];
            in_pos -= in_strides[dim] * shape[dim];
            index[dim] = 0;
        }
    }
}
