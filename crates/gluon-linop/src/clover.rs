//! The Sheikholeslami–Wohlert clover term.
//!
//! ```text
//! A(x) = d·1 − ½ Σ_{μ<ν} c_μν σ_μν ⊗ F_μν(x),   F_μν = (Q_μν − Q_μν†) / 8i
//! ```
//!
//! where `Q_μν(x)` is the sum of the four plaquette leaves at `x`. `σ_μν`
//! commutes with `γ5`, so `A(x)` splits into one Hermitian 6×6 block per
//! chirality, indexed `(local spin)·3 + colour`. Both blocks are built
//! once per site at construction; inverses and determinants come from
//! their Cholesky factors.

use std::sync::Arc;

use gluon_core::dense::{self, CMatrix};
use gluon_core::gamma::{sigma, CHIRAL_MINUS, CHIRAL_PLUS, PLANES};
use gluon_core::{
    ColorMatrix, Complex64, ConfigError, GaugeField, LatticeFermion, Parity, SpinMatrix, Spinor,
    NC, ND,
};
use gluon_layout::Layout;
use gluon_state::paths::{clover_leaves, path_derivative, path_product};
use rayon::prelude::*;

const BLOCK: usize = 6;
const CHIRAL_SPINS: [[usize; 2]; 2] = [CHIRAL_PLUS, CHIRAL_MINUS];

type Block = CMatrix<BLOCK>;

/// Coefficients of the clover term and the matching hopping weights.
#[derive(Clone, Debug, PartialEq)]
pub struct CloverCoeffs {
    /// Site-diagonal term `d`.
    pub diag: f64,
    /// `c_μν`, symmetric; only `μ < ν` is read.
    pub plane: [[f64; ND]; ND],
    /// Dslash weights `c_μ`.
    pub hop: [f64; ND],
}

impl CloverCoeffs {
    /// `d = Nd + m`, `c_μν = csw / u0³`, unit hopping weights.
    pub fn isotropic(mass: f64, clov_coeff: f64, u0: f64) -> Self {
        let c = clov_coeff / u0.powi(3);
        Self {
            diag: ND as f64 + mass,
            plane: [[c; ND]; ND],
            hop: [1.0; ND],
        }
    }

    /// Anisotropic lattice with temporal direction `t_dir`, bare
    /// anisotropy `xi_0` and speed of light `nu`.
    ///
    /// Spatial hops carry `ν/ξ0` and the temporal hop 1. Spatial planes
    /// use `clovCoeffR·ν/ξ0/u0³`, temporal planes
    /// `½(ν/ξ0 + 1/ξ0)·clovCoeffT/u0³`, and `d = m + Σ_μ c_μ`.
    pub fn anisotropic(
        mass: f64,
        clov_coeff_r: f64,
        clov_coeff_t: f64,
        u0: f64,
        t_dir: usize,
        xi_0: f64,
        nu: f64,
    ) -> Self {
        let u03 = u0.powi(3);
        let spatial_hop = nu / xi_0;
        let hop: [f64; ND] =
            std::array::from_fn(|mu| if mu == t_dir { 1.0 } else { spatial_hop });
        let spatial = clov_coeff_r * spatial_hop / u03;
        let temporal = 0.5 * (spatial_hop + 1.0 / xi_0) * clov_coeff_t / u03;
        let plane: [[f64; ND]; ND] = std::array::from_fn(|mu| {
            std::array::from_fn(|nu| if mu == t_dir || nu == t_dir { temporal } else { spatial })
        });
        Self {
            diag: mass + hop.iter().sum::<f64>(),
            plane,
            hop,
        }
    }
}

/// The clover term of one gauge configuration.
#[derive(Clone, Debug)]
pub struct CloverTerm {
    layout: Arc<Layout>,
    coeffs: CloverCoeffs,
    sigmas: [SpinMatrix; 6],
    blocks: Vec<[Block; 2]>,
}

/// Cholesky inverse of a clover term on one checkerboard.
#[derive(Clone, Debug)]
pub struct CloverInverse {
    layout: Arc<Layout>,
    parity: Parity,
    inverse: Vec<[Block; 2]>,
    log_det: f64,
}

fn gather(psi: &Spinor, k: usize) -> [Complex64; BLOCK] {
    let spins = CHIRAL_SPINS[k];
    std::array::from_fn(|i| psi.s[spins[i / NC]][i % NC])
}

fn block_apply(blocks: &[Block; 2], psi: &Spinor) -> Spinor {
    let mut out = Spinor::ZERO;
    for (k, blk) in blocks.iter().enumerate() {
        let v = gather(psi, k);
        let spins = CHIRAL_SPINS[k];
        for (i, row) in blk.iter().enumerate() {
            let acc: Complex64 = row.iter().zip(&v).map(|(a, b)| a * b).sum();
            out.s[spins[i / NC]][i % NC] = acc;
        }
    }
    out
}

/// `W − W†` for `W = (i c/16) M`: the leaf weight of `Re(c' tr(δF M))`.
fn leaf_weight(m: &ColorMatrix, c: f64) -> ColorMatrix {
    let w = m.scale_complex(Complex64::new(0.0, c / 16.0));
    w - w.adjoint()
}

impl CloverTerm {
    /// Build both chiral blocks on every site from links `u`.
    pub fn new(layout: Arc<Layout>, u: &GaugeField, coeffs: CloverCoeffs) -> Self {
        let sigmas: [SpinMatrix; 6] = std::array::from_fn(|p| sigma(PLANES[p].0, PLANES[p].1));
        let blocks = (0..layout.volume())
            .into_par_iter()
            .map(|x| site_blocks(&layout, u, &coeffs, &sigmas, x))
            .collect();
        tracing::debug!(diag = coeffs.diag, "clover term built");
        Self {
            layout,
            coeffs,
            sigmas,
            blocks,
        }
    }

    /// The coefficients this term was built with.
    pub fn coeffs(&self) -> &CloverCoeffs {
        &self.coeffs
    }

    /// `chi_cb = A psi_cb`. `A` is Hermitian, so there is no sign.
    pub fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, cb: Parity) {
        let sites = self.layout.sites(cb);
        let values: Vec<Spinor> = sites
            .par_iter()
            .map(|&x| block_apply(&self.blocks[x], &psi[x]))
            .collect();
        chi.scatter(sites, values);
    }

    /// Cholesky-invert every block on checkerboard `cb`.
    ///
    /// Fails with [`ConfigError::Numerical`] when a block is not positive
    /// definite.
    pub fn invert(&self, cb: Parity) -> Result<CloverInverse, ConfigError> {
        let factors: Vec<Option<([Block; 2], f64)>> = self
            .layout
            .sites(cb)
            .par_iter()
            .map(|&x| {
                let [plus, minus] = &self.blocks[x];
                let lp = dense::cholesky(plus)?;
                let lm = dense::cholesky(minus)?;
                let ld = dense::cholesky_log_det(&lp) + dense::cholesky_log_det(&lm);
                Some(([dense::cholesky_inverse(&lp), dense::cholesky_inverse(&lm)], ld))
            })
            .collect();

        let mut inverse = Vec::with_capacity(factors.len());
        let mut log_det = 0.0;
        for (f, &x) in factors.into_iter().zip(self.layout.sites(cb)) {
            let Some((inv, ld)) = f else {
                let reason = format!("clover block at site {x} is not positive definite");
                tracing::error!(%reason, "clover inversion failed");
                return Err(ConfigError::Numerical { reason });
            };
            inverse.push(inv);
            log_det += ld;
        }
        tracing::debug!(parity = %cb, log_det, "clover blocks inverted");
        Ok(CloverInverse {
            layout: self.layout.clone(),
            parity: cb,
            inverse,
            log_det,
        })
    }

    /// Raw force of `Re(χ_cb† A ψ_cb)` w.r.t. the links `u` the term was
    /// built from.
    pub fn deriv(
        &self,
        u: &GaugeField,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        cb: Parity,
    ) -> GaugeField {
        let sites = self.layout.sites(cb);
        let weights: Vec<[ColorMatrix; 6]> = sites
            .par_iter()
            .map(|&x| {
                std::array::from_fn(|p| {
                    let (mu, nu) = PLANES[p];
                    let m = psi[x].spin_mul(&self.sigmas[p]).spin_trace_outer(&chi[x]);
                    leaf_weight(&m, self.coeffs.plane[mu][nu])
                })
            })
            .collect();
        self.scatter_leaves(u, sites, &weights)
    }

    /// Raw force of `ln det A` on the checkerboard of `inv`.
    pub fn deriv_trlog(&self, u: &GaugeField, inv: &CloverInverse) -> GaugeField {
        let sites = self.layout.sites(inv.parity);
        let weights: Vec<[ColorMatrix; 6]> = inv
            .inverse
            .par_iter()
            .map(|blocks| {
                std::array::from_fn(|p| {
                    let (mu, nu) = PLANES[p];
                    let n = trace_sigma(&self.sigmas[p], blocks);
                    leaf_weight(&n, self.coeffs.plane[mu][nu])
                })
            })
            .collect();
        self.scatter_leaves(u, sites, &weights)
    }

    fn scatter_leaves(
        &self,
        u: &GaugeField,
        sites: &[usize],
        weights: &[[ColorMatrix; 6]],
    ) -> GaugeField {
        let mut ds = GaugeField::zeros(self.layout.volume());
        for (&x, w) in sites.iter().zip(weights) {
            for (p, &(mu, nu)) in PLANES.iter().enumerate() {
                for leaf in clover_leaves(mu, nu) {
                    path_derivative(&self.layout, u, x, &leaf, &w[p], &mut ds);
                }
            }
        }
        ds
    }
}

/// `N[c][c'] = Σ_{s,s'} σ[s'][s] O[(s,c),(s',c')]`, so that
/// `tr(O (σ ⊗ δF)) = tr(δF N)`.
fn trace_sigma(sig: &SpinMatrix, blocks: &[Block; 2]) -> ColorMatrix {
    let mut n = ColorMatrix::ZERO;
    for (k, blk) in blocks.iter().enumerate() {
        let spins = CHIRAL_SPINS[k];
        for (la, &s) in spins.iter().enumerate() {
            for (lb, &sp) in spins.iter().enumerate() {
                let g = sig[sp][s];
                if g == Complex64::ZERO {
                    continue;
                }
                for c in 0..NC {
                    for cp in 0..NC {
                        n.m[c][cp] += g * blk[la * NC + c][lb * NC + cp];
                    }
                }
            }
        }
    }
    n
}

fn site_blocks(
    layout: &Layout,
    u: &GaugeField,
    coeffs: &CloverCoeffs,
    sigmas: &[SpinMatrix; 6],
    x: usize,
) -> [Block; 2] {
    let minus_i_eighth = Complex64::new(0.0, -0.125);
    let fields: [ColorMatrix; 6] = std::array::from_fn(|p| {
        let (mu, nu) = PLANES[p];
        let mut q = ColorMatrix::ZERO;
        for leaf in clover_leaves(mu, nu) {
            q += path_product(layout, u, x, &leaf);
        }
        (q - q.adjoint()).scale_complex(minus_i_eighth)
    });

    std::array::from_fn(|k| {
        let spins = CHIRAL_SPINS[k];
        let mut blk = dense::zero::<BLOCK>();
        for (i, row) in blk.iter_mut().enumerate() {
            row[i] = Complex64::new(coeffs.diag, 0.0);
        }
        for (p, &(mu, nu)) in PLANES.iter().enumerate() {
            let half_c = -0.5 * coeffs.plane[mu][nu];
            for (la, &s) in spins.iter().enumerate() {
                for (lb, &sp) in spins.iter().enumerate() {
                    let g = sigmas[p][s][sp];
                    if g == Complex64::ZERO {
                        continue;
                    }
                    for c in 0..NC {
                        for cp in 0..NC {
                            blk[la * NC + c][lb * NC + cp] += g * fields[p].m[c][cp] * half_c;
                        }
                    }
                }
            }
        }
        blk
    })
}

impl CloverInverse {
    /// `chi_cb = A⁻¹ psi_cb`.
    pub fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion) {
        let sites = self.layout.sites(self.parity);
        let values: Vec<Spinor> = sites
            .par_iter()
            .zip(self.inverse.par_iter())
            .map(|(&x, blocks)| block_apply(blocks, &psi[x]))
            .collect();
        chi.scatter(sites, values);
    }

    /// Checkerboard the blocks belong to.
    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// `ln det A` over the checkerboard.
    pub fn log_det(&self) -> f64 {
        self.log_det
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_core::FermionField;
    use gluon_test_utils::{
        central_difference, random_direction, random_fermion, random_gauge, small_layout,
    };

    fn term(seed: u64) -> (Arc<Layout>, GaugeField, CloverTerm) {
        let layout = small_layout();
        let u = random_gauge(&layout, seed);
        let t = CloverTerm::new(layout.clone(), &u, CloverCoeffs::isotropic(0.1, 1.2, 1.0));
        (layout, u, t)
    }

    #[test]
    fn unit_links_give_a_pure_mass_term() {
        let layout = small_layout();
        let u = GaugeField::identity(layout.volume());
        let t = CloverTerm::new(layout.clone(), &u, CloverCoeffs::isotropic(0.25, 1.0, 1.0));
        let psi = random_fermion(&layout, 1);
        let mut chi = LatticeFermion::new(layout.volume());
        t.apply(&mut chi, &psi, Parity::Even);
        let x = layout.sites(Parity::Even)[2];
        assert_eq!(chi[x], psi[x].scale(4.25));
    }

    #[test]
    fn blocks_are_hermitian() {
        let (layout, _, t) = term(2);
        let psi = random_fermion(&layout, 3);
        let chi = random_fermion(&layout, 4);
        let mut a_psi = LatticeFermion::new(layout.volume());
        let mut a_chi = LatticeFermion::new(layout.volume());
        t.apply(&mut a_psi, &psi, Parity::Odd);
        t.apply(&mut a_chi, &chi, Parity::Odd);
        let odd = layout.sites(Parity::Odd);
        let lhs = chi.inner_on(&a_psi, odd);
        let rhs = a_chi.inner_on(&psi, odd);
        assert!((lhs - rhs).norm() < 1e-10);
    }

    #[test]
    fn inverse_undoes_the_block() {
        let (layout, _, t) = term(5);
        let inv = t.invert(Parity::Even).unwrap();
        let psi = random_fermion(&layout, 6);
        let mut a_psi = LatticeFermion::new(layout.volume());
        let mut back = LatticeFermion::new(layout.volume());
        t.apply(&mut a_psi, &psi, Parity::Even);
        inv.apply(&mut back, &a_psi);
        for &x in layout.sites(Parity::Even) {
            assert!((back[x] - psi[x]).norm_sq() < 1e-22);
        }
    }

    #[test]
    fn negative_mass_beyond_the_spectrum_is_reported() {
        let layout = small_layout();
        let u = random_gauge(&layout, 7);
        let t = CloverTerm::new(layout, &u, CloverCoeffs::isotropic(-6.0, 1.0, 1.0));
        assert!(matches!(t.invert(Parity::Even), Err(ConfigError::Numerical { .. })));
    }

    #[test]
    fn anisotropic_coefficients() {
        let c = CloverCoeffs::anisotropic(0.1, 1.5, 0.9, 1.0, 3, 2.0, 1.0);
        assert_eq!(c.hop, [0.5, 0.5, 0.5, 1.0]);
        assert!((c.diag - 2.6).abs() < 1e-15);
        assert!((c.plane[0][1] - 0.75).abs() < 1e-15);
        assert!((c.plane[1][3] - 0.45).abs() < 1e-15);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let (layout, u, t) = term(8);
        let chi = random_fermion(&layout, 9);
        let psi = random_fermion(&layout, 10);
        let dir = random_direction(&layout, 11);
        let coeffs = t.coeffs().clone();
        let ds = t.deriv(&u, &chi, &psi, Parity::Odd);
        let fd = central_difference(&u, &dir, 1e-5, |g| {
            let tg = CloverTerm::new(layout.clone(), g, coeffs.clone());
            let mut out = LatticeFermion::new(layout.volume());
            tg.apply(&mut out, &psi, Parity::Odd);
            chi.inner_on(&out, layout.sites(Parity::Odd)).re
        });
        let an = ds.re_trace_pairing(&dir);
        assert!((fd - an).abs() < 1e-6 * an.abs().max(1.0), "{fd} vs {an}");
    }

    #[test]
    fn trace_log_derivative_matches_finite_difference() {
        let (layout, u, t) = term(12);
        let inv = t.invert(Parity::Even).unwrap();
        let dir = random_direction(&layout, 13);
        let coeffs = t.coeffs().clone();
        let ds = t.deriv_trlog(&u, &inv);
        let fd = central_difference(&u, &dir, 1e-5, |g| {
            CloverTerm::new(layout.clone(), g, coeffs.clone())
                .invert(Parity::Even)
                .unwrap()
                .log_det()
        });
        let an = ds.re_trace_pairing(&dir);
        assert!((fd - an).abs() < 1e-6 * an.abs().max(1.0), "{fd} vs {an}");
    }
}
