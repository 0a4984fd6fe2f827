//! Dense lattice fields.
//!
//! Every field holds exactly one value per site of the local volume and
//! never resizes. Checkerboard-restricted arithmetic takes the site list
//! of the relevant half explicitly (see `gluon_layout::Layout::sites`),
//! so the same storage serves full-lattice and single-parity vectors.

use std::ops::{Index, IndexMut};

use num_complex::Complex64;

use crate::color::ColorMatrix;
use crate::id::ND;
use crate::spinor::Spinor;

/// Vector-space operations a fermion field offers to operators and solvers.
///
/// All operations act only on the listed sites; other sites keep their
/// values. Implemented by [`LatticeFermion`] (4D) and [`FermionArray`]
/// (a stack of 4D fields along the fifth dimension).
pub trait FermionField: Clone + Send + Sync + 'static {
    /// Number of sites per 4D slice.
    fn volume(&self) -> usize;

    /// A zero field of the same shape.
    fn zeros_like(&self) -> Self;

    /// Zero the listed sites.
    fn set_zero_on(&mut self, sites: &[usize]);

    /// Copy `src` into `self` on the listed sites.
    fn copy_on(&mut self, src: &Self, sites: &[usize]);

    /// `self += a · x` on the listed sites.
    fn axpy_on(&mut self, a: Complex64, x: &Self, sites: &[usize]);

    /// `self *= a` on the listed sites.
    fn scale_on(&mut self, a: f64, sites: &[usize]);

    /// `Σ self† other` over the listed sites.
    fn inner_on(&self, other: &Self, sites: &[usize]) -> Complex64;

    /// `Σ |self|²` over the listed sites.
    fn norm_sq_on(&self, sites: &[usize]) -> f64 {
        self.inner_on(self, sites).re
    }
}

/// A 4D fermion field: one [`Spinor`] per site.
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeFermion {
    data: Vec<Spinor>,
}

impl LatticeFermion {
    /// Zero field on `volume` sites.
    pub fn new(volume: usize) -> Self {
        Self {
            data: vec![Spinor::ZERO; volume],
        }
    }

    /// Wrap existing per-site data.
    pub fn from_vec(data: Vec<Spinor>) -> Self {
        Self { data }
    }

    /// Per-site data.
    pub fn as_slice(&self) -> &[Spinor] {
        &self.data
    }

    /// Mutable per-site data.
    pub fn as_mut_slice(&mut self) -> &mut [Spinor] {
        &mut self.data
    }

    /// Write per-site values computed elsewhere back into the field.
    pub fn scatter(&mut self, sites: &[usize], values: Vec<Spinor>) {
        for (&x, v) in sites.iter().zip(values) {
            self.data[x] = v;
        }
    }
}

impl Index<usize> for LatticeFermion {
    type Output = Spinor;
    fn index(&self, site: usize) -> &Spinor {
        &self.data[site]
    }
}

impl IndexMut<usize> for LatticeFermion {
    fn index_mut(&mut self, site: usize) -> &mut Spinor {
        &mut self.data[site]
    }
}

impl FermionField for LatticeFermion {
    fn volume(&self) -> usize {
        self.data.len()
    }

    fn zeros_like(&self) -> Self {
        Self::new(self.data.len())
    }

    fn set_zero_on(&mut self, sites: &[usize]) {
        for &x in sites {
            self.data[x] = Spinor::ZERO;
        }
    }

    fn copy_on(&mut self, src: &Self, sites: &[usize]) {
        for &x in sites {
            self.data[x] = src.data[x];
        }
    }

    fn axpy_on(&mut self, a: Complex64, x: &Self, sites: &[usize]) {
        for &s in sites {
            self.data[s].axpy(a, &x.data[s]);
        }
    }

    fn scale_on(&mut self, a: f64, sites: &[usize]) {
        for &x in sites {
            self.data[x] = self.data[x].scale(a);
        }
    }

    fn inner_on(&self, other: &Self, sites: &[usize]) -> Complex64 {
        sites
            .iter()
            .map(|&x| self.data[x].inner(&other.data[x]))
            .sum()
    }
}

/// A stack of `N5` 4D fermion fields (domain-wall fifth dimension).
#[derive(Clone, Debug, PartialEq)]
pub struct FermionArray {
    slices: Vec<LatticeFermion>,
}

impl FermionArray {
    /// Zero array of `n5` slices on `volume` sites.
    pub fn new(n5: usize, volume: usize) -> Self {
        Self {
            slices: (0..n5).map(|_| LatticeFermion::new(volume)).collect(),
        }
    }

    /// Wrap existing slices.
    pub fn from_slices(slices: Vec<LatticeFermion>) -> Self {
        Self { slices }
    }

    /// Extent of the fifth dimension.
    pub fn n5(&self) -> usize {
        self.slices.len()
    }

    /// Slice `s`.
    pub fn slice(&self, s: usize) -> &LatticeFermion {
        &self.slices[s]
    }

    /// Mutable slice `s`.
    pub fn slice_mut(&mut self, s: usize) -> &mut LatticeFermion {
        &mut self.slices[s]
    }

    /// All slices.
    pub fn slices(&self) -> &[LatticeFermion] {
        &self.slices
    }

    /// All slices, mutably.
    pub fn slices_mut(&mut self) -> &mut [LatticeFermion] {
        &mut self.slices
    }
}

impl FermionField for FermionArray {
    fn volume(&self) -> usize {
        self.slices.first().map_or(0, |f| f.volume())
    }

    fn zeros_like(&self) -> Self {
        Self::new(self.n5(), self.volume())
    }

    fn set_zero_on(&mut self, sites: &[usize]) {
        for f in &mut self.slices {
            f.set_zero_on(sites);
        }
    }

    fn copy_on(&mut self, src: &Self, sites: &[usize]) {
        for (f, g) in self.slices.iter_mut().zip(&src.slices) {
            f.copy_on(g, sites);
        }
    }

    fn axpy_on(&mut self, a: Complex64, x: &Self, sites: &[usize]) {
        for (f, g) in self.slices.iter_mut().zip(&x.slices) {
            f.axpy_on(a, g, sites);
        }
    }

    fn scale_on(&mut self, a: f64, sites: &[usize]) {
        for f in &mut self.slices {
            f.scale_on(a, sites);
        }
    }

    fn inner_on(&self, other: &Self, sites: &[usize]) -> Complex64 {
        self.slices
            .iter()
            .zip(&other.slices)
            .map(|(f, g)| f.inner_on(g, sites))
            .sum()
    }
}

/// One colour matrix per direction per site.
///
/// Used for gauge links `U_μ(x)` and for forces (link derivatives), which
/// share the storage shape.
#[derive(Clone, Debug, PartialEq)]
pub struct GaugeField {
    dirs: [Vec<ColorMatrix>; ND],
}

impl GaugeField {
    /// All links zero (the neutral force).
    pub fn zeros(volume: usize) -> Self {
        Self {
            dirs: std::array::from_fn(|_| vec![ColorMatrix::ZERO; volume]),
        }
    }

    /// All links unity (cold start).
    pub fn identity(volume: usize) -> Self {
        Self {
            dirs: std::array::from_fn(|_| vec![ColorMatrix::IDENTITY; volume]),
        }
    }

    /// Build from per-direction arrays.
    pub fn from_dirs(dirs: [Vec<ColorMatrix>; ND]) -> Self {
        Self { dirs }
    }

    /// Sites per direction.
    pub fn volume(&self) -> usize {
        self.dirs[0].len()
    }

    /// Links in direction `mu`.
    pub fn dir(&self, mu: usize) -> &[ColorMatrix] {
        &self.dirs[mu]
    }

    /// Mutable links in direction `mu`.
    pub fn dir_mut(&mut self, mu: usize) -> &mut [ColorMatrix] {
        &mut self.dirs[mu]
    }

    /// `U_μ(x)`.
    pub fn link(&self, mu: usize, site: usize) -> &ColorMatrix {
        &self.dirs[mu][site]
    }

    /// Mutable `U_μ(x)`.
    pub fn link_mut(&mut self, mu: usize, site: usize) -> &mut ColorMatrix {
        &mut self.dirs[mu][site]
    }

    /// `self += other`.
    pub fn add_assign(&mut self, other: &Self) {
        for (a, b) in self.dirs.iter_mut().zip(other.dirs.iter()) {
            for (x, y) in a.iter_mut().zip(b) {
                *x += *y;
            }
        }
    }

    /// `self += a · other`.
    pub fn add_scaled(&mut self, a: f64, other: &Self) {
        for (d, o) in self.dirs.iter_mut().zip(other.dirs.iter()) {
            for (x, y) in d.iter_mut().zip(o) {
                *x += y.scale(a);
            }
        }
    }

    /// `self *= a`.
    pub fn scale(&mut self, a: f64) {
        for m in self.dirs.iter_mut().flatten() {
            *m = m.scale(a);
        }
    }

    /// `Σ |X_μ(x)|²`.
    pub fn norm_sq(&self) -> f64 {
        self.dirs.iter().flatten().map(ColorMatrix::norm_sq).sum()
    }

    /// Largest elementwise distance to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.dirs
            .iter()
            .flatten()
            .zip(other.dirs.iter().flatten())
            .map(|(a, b)| a.max_abs_diff(b))
            .fold(0.0, f64::max)
    }

    /// `Σ_{μ,x} Re tr(X_μ(x) Y_μ(x))`, the pairing between a raw force and
    /// a link variation.
    pub fn re_trace_pairing(&self, other: &Self) -> f64 {
        self.dirs
            .iter()
            .flatten()
            .zip(other.dirs.iter().flatten())
            .map(|(a, b)| (*a * *b).re_trace())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spinor_from(seed: f64) -> Spinor {
        let mut p = Spinor::ZERO;
        for (k, v) in p.s.iter_mut().flatten().enumerate() {
            *v = Complex64::new((seed + k as f64).sin(), (seed * 0.5 - k as f64).cos());
        }
        p
    }

    #[test]
    fn subset_ops_leave_other_sites_alone() {
        let mut f = LatticeFermion::from_vec((0..4).map(|i| spinor_from(i as f64)).collect());
        let g = f.clone();
        f.scale_on(2.0, &[1, 3]);
        assert_eq!(f[0], g[0]);
        assert_eq!(f[2], g[2]);
        assert_eq!(f[1], g[1].scale(2.0));
        f.set_zero_on(&[0]);
        assert_eq!(f[0], Spinor::ZERO);
    }

    #[test]
    fn array_inner_sums_over_slices() {
        let a = FermionArray::from_slices(vec![
            LatticeFermion::from_vec(vec![spinor_from(0.1), spinor_from(0.2)]),
            LatticeFermion::from_vec(vec![spinor_from(0.3), spinor_from(0.4)]),
        ]);
        let n = a.norm_sq_on(&[0, 1]);
        let direct: f64 = a
            .slices()
            .iter()
            .map(|f| f.as_slice().iter().map(Spinor::norm_sq).sum::<f64>())
            .sum();
        assert!((n - direct).abs() < 1e-12);
        assert_eq!(a.zeros_like().n5(), 2);
    }

    proptest! {
        #[test]
        fn axpy_then_inverse_axpy_restores(re in -3.0f64..3.0, im in -3.0f64..3.0, seed in 0.0f64..10.0) {
            let x = LatticeFermion::from_vec(vec![spinor_from(seed), spinor_from(seed + 1.0)]);
            let mut y = LatticeFermion::from_vec(vec![spinor_from(-seed), spinor_from(2.0 * seed)]);
            let orig = y.clone();
            let a = Complex64::new(re, im);
            y.axpy_on(a, &x, &[0, 1]);
            y.axpy_on(-a, &x, &[0, 1]);
            for i in 0..2 {
                prop_assert!((y[i] - orig[i]).norm_sq() < 1e-20);
            }
        }

        #[test]
        fn inner_is_conjugate_symmetric(s1 in 0.0f64..5.0, s2 in 0.0f64..5.0) {
            let x = LatticeFermion::from_vec(vec![spinor_from(s1)]);
            let y = LatticeFermion::from_vec(vec![spinor_from(s2)]);
            let a = x.inner_on(&y, &[0]);
            let b = y.inner_on(&x, &[0]);
            prop_assert!((a - b.conj()).norm() < 1e-12);
        }
    }
}
