//! SU(3) colour algebra.
//!
//! A link variable `U_μ(x)` is a 3×3 unitary matrix with unit determinant,
//! the parallel transporter from `x` to `x+μ`. Forces and staples live in
//! the same storage type without the group constraint.
//!
//! Storage: row major, `m[row][col]`.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use num_complex::Complex64;
use rand::Rng;

use crate::dense::{self, CMatrix};
use crate::id::NC;
use crate::random::gaussian;

/// A colour triplet.
pub type ColorVector = [Complex64; NC];

/// 3×3 complex matrix: links, staples, forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix {
    /// Matrix elements `m[row][col]`.
    pub m: CMatrix<NC>,
}

impl ColorMatrix {
    /// Zero matrix.
    pub const ZERO: Self = Self {
        m: [[Complex64::ZERO; NC]; NC],
    };

    /// 3×3 identity.
    pub const IDENTITY: Self = Self {
        m: [
            [Complex64::ONE, Complex64::ZERO, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ONE, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ZERO, Complex64::ONE],
        ],
    };

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        Self {
            m: dense::adjoint(&self.m),
        }
    }

    /// `tr U`.
    pub fn trace(&self) -> Complex64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    /// `Re tr U`.
    pub fn re_trace(&self) -> f64 {
        self.m[0][0].re + self.m[1][1].re + self.m[2][2].re
    }

    /// Determinant.
    pub fn det(&self) -> Complex64 {
        let m = &self.m;
        let a = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]);
        let b = m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]);
        let c = m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        a - b + c
    }

    /// Scale by a real number.
    pub fn scale(&self, s: f64) -> Self {
        let mut r = *self;
        for v in r.m.iter_mut().flatten() {
            *v = v.scale(s);
        }
        r
    }

    /// Scale by a complex number.
    pub fn scale_complex(&self, s: Complex64) -> Self {
        let mut r = *self;
        for v in r.m.iter_mut().flatten() {
            *v *= s;
        }
        r
    }

    /// Frobenius norm squared.
    pub fn norm_sq(&self) -> f64 {
        self.m.iter().flatten().map(|v| v.norm_sqr()).sum()
    }

    /// Largest elementwise distance to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Traceless antihermitian projection `(M − M†)/2 − tr(M − M†)/(2·Nc)`.
    ///
    /// Self-adjoint under the pairing `Re tr(A B)`, which is what lets the
    /// stout chain rule move it from one side of a trace to the other.
    pub fn traceless_antihermitian(&self) -> Self {
        let mut r = (*self - self.adjoint()).scale(0.5);
        let t = r.trace() / NC as f64;
        for i in 0..NC {
            r.m[i][i] -= t;
        }
        r
    }

    /// `e^M`.
    pub fn exp(&self) -> Self {
        Self {
            m: dense::expm(&self.m),
        }
    }

    /// `(e^A, L_A(E))`, where `L_A(E) = ∫₀¹ e^{sA} E e^{(1−s)A} ds` is the
    /// Fréchet derivative of the exponential at `A` in direction `E`.
    ///
    /// Read off the upper-right block of `exp([[A, E], [0, A]])`.
    pub fn exp_frechet(&self, dir: &Self) -> (Self, Self) {
        let mut big: CMatrix<{ 2 * NC }> = dense::zero();
        for i in 0..NC {
            for j in 0..NC {
                big[i][j] = self.m[i][j];
                big[i + NC][j + NC] = self.m[i][j];
                big[i][j + NC] = dir.m[i][j];
            }
        }
        let e = dense::expm(&big);
        let mut exp_a = Self::ZERO;
        let mut frechet = Self::ZERO;
        for i in 0..NC {
            for j in 0..NC {
                exp_a.m[i][j] = e[i][j];
                frechet.m[i][j] = e[i][j + NC];
            }
        }
        (exp_a, frechet)
    }

    /// `U v`.
    pub fn mul_vec(&self, v: &ColorVector) -> ColorVector {
        let mut r = [Complex64::ZERO; NC];
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = self.m[i][0] * v[0] + self.m[i][1] * v[1] + self.m[i][2] * v[2];
        }
        r
    }

    /// `U† v`.
    pub fn adj_mul_vec(&self, v: &ColorVector) -> ColorVector {
        let mut r = [Complex64::ZERO; NC];
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = self.m[0][i].conj() * v[0]
                + self.m[1][i].conj() * v[1]
                + self.m[2][i].conj() * v[2];
        }
        r
    }

    /// Colour outer product `a b†`.
    pub fn outer(a: &ColorVector, b: &ColorVector) -> Self {
        let mut r = Self::ZERO;
        for i in 0..NC {
            for j in 0..NC {
                r.m[i][j] = a[i] * b[j].conj();
            }
        }
        r
    }

    /// Project back onto SU(3) by Gram–Schmidt on the first two rows.
    pub fn reunitarize(&self) -> Self {
        let mut u = *self;
        normalize_row(&mut u, 0);
        let dot: Complex64 = (0..NC).map(|j| u.m[0][j].conj() * u.m[1][j]).sum();
        for j in 0..NC {
            let sub = u.m[0][j] * dot;
            u.m[1][j] -= sub;
        }
        normalize_row(&mut u, 1);
        // Row 2 = conj(row 0 × row 1) fixes det = 1.
        u.m[2][0] = (u.m[0][1] * u.m[1][2] - u.m[0][2] * u.m[1][1]).conj();
        u.m[2][1] = (u.m[0][2] * u.m[1][0] - u.m[0][0] * u.m[1][2]).conj();
        u.m[2][2] = (u.m[0][0] * u.m[1][1] - u.m[0][1] * u.m[1][0]).conj();
        u
    }

    /// Random traceless antihermitian matrix with Gaussian components of
    /// width `scale`.
    pub fn random_algebra<R: Rng + ?Sized>(rng: &mut R, scale: f64) -> Self {
        let mut h = Self::ZERO;
        for i in 0..NC {
            h.m[i][i] = Complex64::new(gaussian(rng) * scale, 0.0);
            for j in (i + 1)..NC {
                let v = Complex64::new(gaussian(rng) * scale, gaussian(rng) * scale);
                h.m[i][j] = v;
                h.m[j][i] = v.conj();
            }
        }
        // i·H is antihermitian; drop the trace.
        h.scale_complex(Complex64::i()).traceless_antihermitian()
    }

    /// Random SU(3) element `exp(ε·T)` with `T` from
    /// [`random_algebra`](Self::random_algebra).
    pub fn random_su3<R: Rng + ?Sized>(rng: &mut R, epsilon: f64) -> Self {
        Self::random_algebra(rng, epsilon).exp().reunitarize()
    }
}

fn normalize_row(u: &mut ColorMatrix, row: usize) {
    let n: f64 = u.m[row].iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
    if n > 0.0 {
        for v in u.m[row].iter_mut() {
            *v = v.unscale(n);
        }
    }
}

impl Mul for ColorMatrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            m: dense::mat_mul(&self.m, &rhs.m),
        }
    }
}

impl Add for ColorMatrix {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub for ColorMatrix {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl AddAssign for ColorMatrix {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.m.iter_mut().flatten().zip(rhs.m.iter().flatten()) {
            *a += *b;
        }
    }
}

impl SubAssign for ColorMatrix {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.m.iter_mut().flatten().zip(rhs.m.iter().flatten()) {
            *a -= *b;
        }
    }
}

impl Neg for ColorMatrix {
    type Output = Self;
    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}
