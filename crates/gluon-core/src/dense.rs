//! Small dense matrix kernels.
//!
//! Fixed-size complex matrices (`[[Complex64; N]; N]`) cover the colour
//! algebra and the 6×6 clover blocks; a dynamically sized real LU covers
//! the `N5 × N5` fifth-dimension couplings of domain-wall operators.
//!
//! The matrix exponential uses scaling and squaring around a truncated
//! Taylor series, which is ample for the small-norm antihermitian
//! arguments produced by stout smearing.

use num_complex::Complex64;

/// Square complex matrix, row major.
pub type CMatrix<const N: usize> = [[Complex64; N]; N];

const TAYLOR_ORDER: usize = 24;
const TAYLOR_TOL: f64 = 1e-18;
const MAX_SQUARINGS: u32 = 64;

/// `N × N` zero matrix.
pub fn zero<const N: usize>() -> CMatrix<N> {
    [[Complex64::ZERO; N]; N]
}

/// `N × N` identity.
pub fn identity<const N: usize>() -> CMatrix<N> {
    let mut r = zero::<N>();
    for (i, row) in r.iter_mut().enumerate() {
        row[i] = Complex64::ONE;
    }
    r
}

/// Matrix product `a · b`.
pub fn mat_mul<const N: usize>(a: &CMatrix<N>, b: &CMatrix<N>) -> CMatrix<N> {
    let mut r = zero::<N>();
    for i in 0..N {
        for k in 0..N {
            let aik = a[i][k];
            if aik == Complex64::ZERO {
                continue;
            }
            for j in 0..N {
                r[i][j] += aik * b[k][j];
            }
        }
    }
    r
}

/// Conjugate transpose.
pub fn adjoint<const N: usize>(a: &CMatrix<N>) -> CMatrix<N> {
    let mut r = zero::<N>();
    for i in 0..N {
        for j in 0..N {
            r[i][j] = a[j][i].conj();
        }
    }
    r
}

/// Maximum absolute column sum.
pub fn one_norm<const N: usize>(a: &CMatrix<N>) -> f64 {
    (0..N)
        .map(|j| (0..N).map(|i| a[i][j].norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Matrix exponential `e^a`.
pub fn expm<const N: usize>(a: &CMatrix<N>) -> CMatrix<N> {
    let norm = one_norm(a);
    let mut squarings = 0u32;
    let mut scale = 1.0;
    while norm * scale > 0.5 && squarings < MAX_SQUARINGS {
        scale *= 0.5;
        squarings += 1;
    }

    let mut b = *a;
    for row in b.iter_mut() {
        for v in row.iter_mut() {
            *v = v.scale(scale);
        }
    }

    let mut result = identity::<N>();
    let mut term = identity::<N>();
    for k in 1..=TAYLOR_ORDER {
        term = mat_mul(&term, &b);
        let inv_k = 1.0 / k as f64;
        let mut term_norm = 0.0;
        for (rrow, trow) in result.iter_mut().zip(term.iter_mut()) {
            for (r, t) in rrow.iter_mut().zip(trow.iter_mut()) {
                *t = t.scale(inv_k);
                *r += *t;
                term_norm += t.norm_sqr();
            }
        }
        if term_norm < TAYLOR_TOL * TAYLOR_TOL {
            break;
        }
    }

    for _ in 0..squarings {
        result = mat_mul(&result, &result);
    }
    result
}

/// Lower Cholesky factor `L` with `a = L L†`.
///
/// Returns `None` when `a` is not Hermitian positive definite (a
/// non-positive or non-finite pivot is met).
pub fn cholesky<const N: usize>(a: &CMatrix<N>) -> Option<CMatrix<N>> {
    let mut l = zero::<N>();
    for j in 0..N {
        let mut d = a[j][j].re;
        for k in 0..j {
            d -= l[j][k].norm_sqr();
        }
        if d <= 0.0 || !d.is_finite() {
            return None;
        }
        let ljj = d.sqrt();
        l[j][j] = Complex64::new(ljj, 0.0);
        for i in (j + 1)..N {
            let mut s = a[i][j];
            for k in 0..j {
                s -= l[i][k] * l[j][k].conj();
            }
            l[i][j] = s / ljj;
        }
    }
    Some(l)
}

/// Inverse of `L L†` given the lower Cholesky factor `L`.
pub fn cholesky_inverse<const N: usize>(l: &CMatrix<N>) -> CMatrix<N> {
    // L^{-1} by forward substitution, column by column.
    let mut linv = zero::<N>();
    for j in 0..N {
        for i in j..N {
            let mut s = if i == j {
                Complex64::ONE
            } else {
                Complex64::ZERO
            };
            for k in j..i {
                s -= l[i][k] * linv[k][j];
            }
            linv[i][j] = s / l[i][i];
        }
    }
    // (L L†)^{-1} = L^{-†} L^{-1}
    let mut inv = zero::<N>();
    for i in 0..N {
        for j in 0..N {
            let mut s = Complex64::ZERO;
            for k in i.max(j)..N {
                s += linv[k][i].conj() * linv[k][j];
            }
            inv[i][j] = s;
        }
    }
    inv
}

/// `ln det (L L†) = 2 Σ ln L_ii`.
pub fn cholesky_log_det<const N: usize>(l: &CMatrix<N>) -> f64 {
    (0..N).map(|i| 2.0 * l[i][i].re.ln()).sum()
}

/// Inverse and determinant of a real square matrix by Gaussian
/// elimination with partial pivoting.
///
/// Returns `None` for a singular (or non-square) matrix.
pub fn real_inverse(a: &[Vec<f64>]) -> Option<(Vec<Vec<f64>>, f64)> {
    let n = a.len();
    if a.iter().any(|row| row.len() != n) {
        return None;
    }
    let mut m: Vec<Vec<f64>> = a.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();
    let mut det = 1.0;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| m[x][col].abs().total_cmp(&m[y][col].abs()))
            .unwrap_or(col);
        let p = m[pivot][col];
        if p == 0.0 || !p.is_finite() {
            return None;
        }
        if pivot != col {
            m.swap(pivot, col);
            inv.swap(pivot, col);
            det = -det;
        }
        det *= p;
        let inv_p = 1.0 / p;
        for j in 0..n {
            m[col][j] *= inv_p;
            inv[col][j] *= inv_p;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let f = m[row][col];
            if f == 0.0 {
                continue;
            }
            for j in 0..n {
                m[row][j] -= f * m[col][j];
                inv[row][j] -= f * inv[col][j];
            }
        }
    }
    Some((inv, det))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn max_diff<const N: usize>(a: &CMatrix<N>, b: &CMatrix<N>) -> f64 {
        let mut d: f64 = 0.0;
        for i in 0..N {
            for j in 0..N {
                d = d.max((a[i][j] - b[i][j]).norm());
            }
        }
        d
    }

    #[test]
    fn exp_of_diagonal_is_elementwise() {
        let mut a = zero::<3>();
        a[0][0] = c(0.0, 1.3);
        a[1][1] = c(0.5, 0.0);
        a[2][2] = c(-2.0, 0.7);
        let e = expm(&a);
        for i in 0..3 {
            assert!((e[i][i] - a[i][i].exp()).norm() < 1e-13);
        }
        assert!(e[0][1].norm() < 1e-15);
    }

    #[test]
    fn exp_of_nilpotent_truncates() {
        let mut a = zero::<2>();
        a[0][1] = c(3.0, -1.0);
        let e = expm(&a);
        assert!((e[0][1] - c(3.0, -1.0)).norm() < 1e-13);
        assert!((e[0][0] - Complex64::ONE).norm() < 1e-13);
    }

    #[test]
    fn cholesky_inverse_inverts() {
        let mut a = zero::<3>();
        a[0][0] = c(4.0, 0.0);
        a[1][1] = c(3.0, 0.0);
        a[2][2] = c(5.0, 0.0);
        a[0][1] = c(1.0, 0.5);
        a[1][0] = c(1.0, -0.5);
        a[1][2] = c(0.0, -0.3);
        a[2][1] = c(0.0, 0.3);
        let l = cholesky(&a).expect("positive definite");
        let prod = mat_mul(&a, &cholesky_inverse(&l));
        assert!(max_diff(&prod, &identity::<3>()) < 1e-13);

        let ll = mat_mul(&l, &adjoint(&l));
        assert!(max_diff(&ll, &a) < 1e-13);
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let mut a = identity::<2>();
        a[1][1] = c(-1.0, 0.0);
        assert!(cholesky(&a).is_none());
    }

    #[test]
    fn real_inverse_and_determinant() {
        let a = vec![vec![0.0, 2.0, 1.0], vec![1.0, 1.0, 0.0], vec![3.0, 0.0, 1.0]];
        let (inv, det) = real_inverse(&a).expect("invertible");
        assert!((det - (-5.0)).abs() < 1e-12);
        for i in 0..3 {
            for j in 0..3 {
                let s: f64 = (0..3).map(|k| a[i][k] * inv[k][j]).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((s - want).abs() < 1e-12);
            }
        }
        assert!(real_inverse(&[vec![1.0, 2.0], vec![2.0, 4.0]]).is_none());
    }
}
