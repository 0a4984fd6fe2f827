//! Lattices, fields and states.

use std::sync::Arc;

use gluon_core::{
    random::gaussian, Complex64, FermionArray, GaugeField, LatticeFermion, Parity, Spinor, NC, NS,
};
use gluon_layout::Layout;
use gluon_state::gauge::hot_start;
use gluon_state::{FermBc, FermState, SimpleFermBc, SimpleFermState, SlicFermState, StoutParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A 2×2×2×4 lattice: 64 sites, the smallest with a distinct time extent.
pub fn small_layout() -> Arc<Layout> {
    Arc::new(Layout::new([2, 2, 2, 4]).expect("valid extents"))
}

/// A 4⁴ lattice for the benches and the slower scenarios.
pub fn medium_layout() -> Arc<Layout> {
    Arc::new(Layout::new([4, 4, 4, 4]).expect("valid extents"))
}

/// Random SU(3) configuration, moderately rough.
pub fn random_gauge(layout: &Layout, seed: u64) -> GaugeField {
    hot_start(layout, seed, 0.5)
}

pub fn random_spinor(rng: &mut ChaCha8Rng) -> Spinor {
    let mut p = Spinor::ZERO;
    for s in 0..NS {
        for c in 0..NC {
            p.s[s][c] = Complex64::new(gaussian(rng), gaussian(rng));
        }
    }
    p
}

/// Gaussian fermion on every site.
pub fn random_fermion(layout: &Layout, seed: u64) -> LatticeFermion {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    LatticeFermion::from_vec((0..layout.volume()).map(|_| random_spinor(&mut rng)).collect())
}

/// Gaussian fermion on one checkerboard, zero elsewhere.
pub fn random_fermion_on(layout: &Layout, parity: Parity, seed: u64) -> LatticeFermion {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut f = LatticeFermion::new(layout.volume());
    for &s in layout.sites(parity) {
        f[s] = random_spinor(&mut rng);
    }
    f
}

/// Gaussian 5D fermion on every site of every slice.
pub fn random_array(layout: &Layout, n5: usize, seed: u64) -> FermionArray {
    FermionArray::from_slices(
        (0..n5)
            .map(|s| random_fermion(layout, seed.wrapping_mul(31).wrapping_add(s as u64)))
            .collect(),
    )
}

pub fn default_bc() -> Arc<dyn FermBc> {
    Arc::new(SimpleFermBc::default())
}

pub fn simple_state(layout: &Arc<Layout>, gauge: &GaugeField) -> Arc<dyn FermState> {
    Arc::new(SimpleFermState::new(layout.clone(), default_bc(), gauge).expect("matching volume"))
}

pub fn slic_state(layout: &Arc<Layout>, gauge: &GaugeField, params: StoutParams) -> Arc<dyn FermState> {
    Arc::new(
        SlicFermState::new(layout.clone(), default_bc(), gauge, params).expect("matching volume"),
    )
}

/// A random perturbation direction for finite-difference checks.
pub fn random_direction(layout: &Layout, seed: u64) -> GaugeField {
    hot_start(layout, seed, 1.0)
}

/// `f(U + hD) − f(U − hD)) / 2h`.
pub fn central_difference(
    u: &GaugeField,
    dir: &GaugeField,
    h: f64,
    mut f: impl FnMut(&GaugeField) -> f64,
) -> f64 {
    let mut plus = u.clone();
    plus.add_scaled(h, dir);
    let mut minus = u.clone();
    minus.add_scaled(-h, dir);
    (f(&plus) - f(&minus)) / (2.0 * h)
}
