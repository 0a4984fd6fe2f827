//! Euclidean gamma matrices in the DeGrand–Rossi (chiral) basis.
//!
//! Each `γ_μ` has exactly one non-zero entry per row, so it is stored as a
//! permutation plus a phase: `(γ_μ ψ)_r = phase[r] · ψ_{perm[r]}`. In this
//! basis `γ5 = γ1γ2γ3γ4 = diag(1, 1, −1, −1)`, and every `σ_μν` is block
//! diagonal in chirality, which is what splits the clover term into two
//! 6×6 blocks per site.

use num_complex::Complex64;

use crate::id::{ND, NS};
use crate::spinor::SpinMatrix;

/// One gamma matrix as a signed permutation.
#[derive(Clone, Copy, Debug)]
pub struct GammaTable {
    /// Column holding the non-zero entry of each row.
    pub perm: [usize; NS],
    /// Value of that entry.
    pub phase: [Complex64; NS],
}

const P1: Complex64 = Complex64::new(1.0, 0.0);
const M1: Complex64 = Complex64::new(-1.0, 0.0);
const PI: Complex64 = Complex64::new(0.0, 1.0);
const MI: Complex64 = Complex64::new(0.0, -1.0);

/// `γ_μ` for `μ = 0..4` (x, y, z, t).
pub const GAMMA: [GammaTable; ND] = [
    GammaTable {
        perm: [3, 2, 1, 0],
        phase: [PI, PI, MI, MI],
    },
    GammaTable {
        perm: [3, 2, 1, 0],
        phase: [M1, P1, P1, M1],
    },
    GammaTable {
        perm: [2, 3, 0, 1],
        phase: [PI, MI, MI, PI],
    },
    GammaTable {
        perm: [2, 3, 0, 1],
        phase: [P1, P1, P1, P1],
    },
];

/// Diagonal of `γ5`.
pub const GAMMA5_DIAG: [f64; NS] = [1.0, 1.0, -1.0, -1.0];

/// Spin components of positive chirality (`P₊ = (1+γ5)/2` projects onto them).
pub const CHIRAL_PLUS: [usize; 2] = [0, 1];

/// Spin components of negative chirality.
pub const CHIRAL_MINUS: [usize; 2] = [2, 3];

/// Dense 4×4 form of `γ_μ`.
pub fn gamma_matrix(mu: usize) -> SpinMatrix {
    let g = &GAMMA[mu];
    let mut m = [[Complex64::ZERO; NS]; NS];
    for r in 0..NS {
        m[r][g.perm[r]] = g.phase[r];
    }
    m
}

/// Dense 4×4 form of `γ5`.
pub fn gamma5_matrix() -> SpinMatrix {
    let mut m = [[Complex64::ZERO; NS]; NS];
    for (r, row) in m.iter_mut().enumerate() {
        row[r] = Complex64::new(GAMMA5_DIAG[r], 0.0);
    }
    m
}

fn spin_mul(a: &SpinMatrix, b: &SpinMatrix) -> SpinMatrix {
    let mut r = [[Complex64::ZERO; NS]; NS];
    for i in 0..NS {
        for k in 0..NS {
            for j in 0..NS {
                r[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    r
}

/// `σ_μν = (i/2)[γ_μ, γ_ν]`, Hermitian.
pub fn sigma(mu: usize, nu: usize) -> SpinMatrix {
    let gm = gamma_matrix(mu);
    let gn = gamma_matrix(nu);
    let ab = spin_mul(&gm, &gn);
    let ba = spin_mul(&gn, &gm);
    let half_i = Complex64::new(0.0, 0.5);
    let mut r = [[Complex64::ZERO; NS]; NS];
    for i in 0..NS {
        for j in 0..NS {
            r[i][j] = half_i * (ab[i][j] - ba[i][j]);
        }
    }
    r
}

/// The six planes `(μ, ν)` with `μ < ν`, in lexicographic order.
pub const PLANES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &SpinMatrix, b: &SpinMatrix) -> bool {
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).norm() < 1e-14)
    }

    fn identity_times(c: f64) -> SpinMatrix {
        let mut m = [[Complex64::ZERO; NS]; NS];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = Complex64::new(c, 0.0);
        }
        m
    }

    #[test]
    fn clifford_algebra() {
        for mu in 0..ND {
            for nu in 0..ND {
                let gm = gamma_matrix(mu);
                let gn = gamma_matrix(nu);
                let mut anti = spin_mul(&gm, &gn);
                let ba = spin_mul(&gn, &gm);
                for i in 0..NS {
                    for j in 0..NS {
                        anti[i][j] += ba[i][j];
                    }
                }
                let want = identity_times(if mu == nu { 2.0 } else { 0.0 });
                assert!(close(&anti, &want), "{{γ{mu}, γ{nu}}}");
            }
        }
    }

    #[test]
    fn gamma5_is_product_of_all_four() {
        let g = spin_mul(
            &spin_mul(&gamma_matrix(0), &gamma_matrix(1)),
            &spin_mul(&gamma_matrix(2), &gamma_matrix(3)),
        );
        assert!(close(&g, &gamma5_matrix()));
    }

    #[test]
    fn sigma_is_chirally_block_diagonal_and_hermitian() {
        for &(mu, nu) in PLANES.iter() {
            let s = sigma(mu, nu);
            for &a in CHIRAL_PLUS.iter() {
                for &b in CHIRAL_MINUS.iter() {
                    assert!(s[a][b].norm() < 1e-14 && s[b][a].norm() < 1e-14);
                }
            }
            for i in 0..NS {
                for j in 0..NS {
                    assert!((s[i][j] - s[j][i].conj()).norm() < 1e-14);
                }
            }
        }
    }
}
