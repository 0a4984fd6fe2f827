//! Dirac spinors: four spin components, each a colour triplet.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use num_complex::Complex64;

use crate::color::{ColorMatrix, ColorVector};
use crate::gamma::{GAMMA, GAMMA5_DIAG};
use crate::id::{NC, NS};

/// 4×4 matrix acting on spin indices.
pub type SpinMatrix = [[Complex64; NS]; NS];

/// One lattice site's worth of a fermion field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spinor {
    /// `s[spin][colour]`.
    pub s: [ColorVector; NS],
}

impl Default for Spinor {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Spinor {
    /// The zero spinor.
    pub const ZERO: Self = Self {
        s: [[Complex64::ZERO; NC]; NS],
    };

    /// `ψ† χ`.
    pub fn inner(&self, other: &Self) -> Complex64 {
        let mut acc = Complex64::ZERO;
        for (a, b) in self.s.iter().flatten().zip(other.s.iter().flatten()) {
            acc += a.conj() * b;
        }
        acc
    }

    /// `|ψ|²`.
    pub fn norm_sq(&self) -> f64 {
        self.s.iter().flatten().map(|v| v.norm_sqr()).sum()
    }

    /// Multiply by a real number.
    pub fn scale(&self, a: f64) -> Self {
        let mut r = *self;
        for v in r.s.iter_mut().flatten() {
            *v = v.scale(a);
        }
        r
    }

    /// Multiply by a complex number.
    pub fn scale_complex(&self, a: Complex64) -> Self {
        let mut r = *self;
        for v in r.s.iter_mut().flatten() {
            *v *= a;
        }
        r
    }

    /// `self += a · x`.
    pub fn axpy(&mut self, a: Complex64, x: &Self) {
        for (v, w) in self.s.iter_mut().flatten().zip(x.s.iter().flatten()) {
            *v += a * w;
        }
    }

    /// `U` applied to every spin component.
    pub fn color_mul(&self, u: &ColorMatrix) -> Self {
        let mut r = Self::ZERO;
        for (out, inp) in r.s.iter_mut().zip(self.s.iter()) {
            *out = u.mul_vec(inp);
        }
        r
    }

    /// `U†` applied to every spin component.
    pub fn color_adj_mul(&self, u: &ColorMatrix) -> Self {
        let mut r = Self::ZERO;
        for (out, inp) in r.s.iter_mut().zip(self.s.iter()) {
            *out = u.adj_mul_vec(inp);
        }
        r
    }

    /// `γ_μ ψ`.
    pub fn gamma(&self, mu: usize) -> Self {
        let g = &GAMMA[mu];
        let mut r = Self::ZERO;
        for row in 0..NS {
            let src = &self.s[g.perm[row]];
            let ph = g.phase[row];
            for c in 0..NC {
                r.s[row][c] = ph * src[c];
            }
        }
        r
    }

    /// `γ5 ψ`.
    pub fn gamma5(&self) -> Self {
        let mut r = *self;
        for (spin, comp) in r.s.iter_mut().enumerate() {
            if GAMMA5_DIAG[spin] < 0.0 {
                for v in comp.iter_mut() {
                    *v = -*v;
                }
            }
        }
        r
    }

    /// `(1 − sign·γ_μ) ψ`, the Wilson spin projector up to a factor 2.
    pub fn one_minus_gamma(&self, mu: usize, sign: f64) -> Self {
        let g = self.gamma(mu);
        let mut r = *self;
        for (v, w) in r.s.iter_mut().flatten().zip(g.s.iter().flatten()) {
            *v -= w.scale(sign);
        }
        r
    }

    /// `P₊ ψ = (1 + γ5)/2 ψ`.
    pub fn chiral_plus(&self) -> Self {
        let mut r = *self;
        r.s[2] = [Complex64::ZERO; NC];
        r.s[3] = [Complex64::ZERO; NC];
        r
    }

    /// `P₋ ψ = (1 − γ5)/2 ψ`.
    pub fn chiral_minus(&self) -> Self {
        let mut r = *self;
        r.s[0] = [Complex64::ZERO; NC];
        r.s[1] = [Complex64::ZERO; NC];
        r
    }

    /// General spin matrix applied on the spin index.
    pub fn spin_mul(&self, m: &SpinMatrix) -> Self {
        let mut r = Self::ZERO;
        for (a, row) in m.iter().enumerate() {
            for (b, &mab) in row.iter().enumerate() {
                if mab == Complex64::ZERO {
                    continue;
                }
                for c in 0..NC {
                    r.s[a][c] += mab * self.s[b][c];
                }
            }
        }
        r
    }

    /// Spin-traced colour outer product `Σ_s self_s χ_s†`.
    ///
    /// This is the colour matrix `M` with `χ† (U ψ) = tr(U M)` for
    /// `M = Σ_s ψ_s χ_s†`; every link derivative reduces to it.
    pub fn spin_trace_outer(&self, chi: &Self) -> ColorMatrix {
        let mut r = ColorMatrix::ZERO;
        for (p, c) in self.s.iter().zip(chi.s.iter()) {
            r += ColorMatrix::outer(p, c);
        }
        r
    }
}

impl Add for Spinor {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub for Spinor {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl AddAssign for Spinor {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.s.iter_mut().flatten().zip(rhs.s.iter().flatten()) {
            *a += *b;
        }
    }
}

impl SubAssign for Spinor {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.s.iter_mut().flatten().zip(rhs.s.iter().flatten()) {
            *a -= *b;
        }
    }
}

impl Neg for Spinor {
    type Output = Self;
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::gamma_matrix;

    fn sample() -> Spinor {
        let mut p = Spinor::ZERO;
        for s in 0..NS {
            for c in 0..NC {
                p.s[s][c] = Complex64::new((s * 3 + c) as f64 * 0.25 - 1.0, (c as f64) - 0.5 * s as f64);
            }
        }
        p
    }

    #[test]
    fn table_gamma_matches_dense_gamma() {
        let p = sample();
        for mu in 0..4 {
            let a = p.gamma(mu);
            let b = p.spin_mul(&gamma_matrix(mu));
            assert!((a - b).norm_sq() < 1e-28);
        }
    }

    #[test]
    fn chiral_projectors_split_the_spinor() {
        let p = sample();
        let sum = p.chiral_plus() + p.chiral_minus();
        assert_eq!(sum, p);
        let diff = p.chiral_plus() - p.chiral_minus();
        assert!((diff - p.gamma5()).norm_sq() < 1e-28);
    }

    #[test]
    fn outer_product_represents_the_bilinear() {
        let psi = sample();
        let chi = sample().gamma(2).scale(0.7);
        let mut u = ColorMatrix::ZERO;
        u.m[0][1] = Complex64::new(0.3, -0.2);
        u.m[2][0] = Complex64::new(1.1, 0.4);
        u.m[1][1] = Complex64::new(-0.5, 0.0);
        let lhs = chi.inner(&psi.color_mul(&u));
        let rhs = (u * psi.spin_trace_outer(&chi)).trace();
        assert!((lhs - rhs).norm() < 1e-13);
    }
}
