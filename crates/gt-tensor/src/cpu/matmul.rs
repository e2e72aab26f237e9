//! Cache-blocked matmul kernel for the CPU backend.

/// Edge length of the square tiles walked by [`blocked`].
pub const BLOCK: usize = 64;

/// Computes `c = a @ b` for row-major `a: [m, k]`, `b: [k, n]`.
///
/// Tiles over rows and the reduction dimension and runs an i-k-j inner loop,
/// so `b` and `c` are read along contiguous rows. Lengths must already be
/// validated by the caller.
pub fn blocked(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i0 in (0..m).step_by(BLOCK) {
        let i_end = (i0 + BLOCK).min(m);
        for p0 in (0..k).step_by(BLOCK) {
            let p_end = (p0 + BLOCK).min(k);
            for i in i0..i_end {
                let c_row = &mut c[i * n..(i + 1) * n];
                for p in p0..p_end {
                    let a_ip = a[i * k + p];
                    let b_row = &b[p * n..(p + 1) * n];
                    for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                        *c_ij += a_ip * b_pj;
                    }
                }
            }
        }
    }
    c
}
