//! The Wilson hopping term and its link derivative.
//!
//! ```text
//! D ψ(x) = Σ_μ c_μ [ (1 − sγ_μ) U_μ(x) ψ(x+μ̂) + (1 + sγ_μ) U_μ(x−μ̂)† ψ(x−μ̂) ]
//! ```
//!
//! with `s = +1` for `Plus` and `−1` for `Minus`, so that flipping the
//! sign gives the hermitian conjugate. `c_μ` are anisotropy weights.

use std::sync::Arc;

use gluon_core::{ColorMatrix, GaugeField, LatticeFermion, Parity, PlusMinus, Spinor, ND};
use gluon_layout::Layout;
use rayon::prelude::*;

/// Nearest-neighbour Wilson hopping operator.
///
/// The links are passed on every call so the same dslash can run on thin
/// or fat links.
#[derive(Clone, Debug)]
pub struct WilsonDslash {
    layout: Arc<Layout>,
    coeffs: [f64; ND],
}

impl WilsonDslash {
    /// Dslash with per-direction weights `coeffs`.
    pub fn new(layout: Arc<Layout>, coeffs: [f64; ND]) -> Self {
        Self { layout, coeffs }
    }

    /// All weights 1.
    pub fn isotropic(layout: Arc<Layout>) -> Self {
        Self::new(layout, [1.0; ND])
    }

    /// Lattice geometry.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Per-direction weights.
    pub fn coeffs(&self) -> [f64; ND] {
        self.coeffs
    }

    fn site_apply(&self, u: &GaugeField, psi: &LatticeFermion, x: usize, sign: f64) -> Spinor {
        let mut r = Spinor::ZERO;
        for mu in 0..ND {
            let fwd = self.layout.forward(x, mu);
            let bwd = self.layout.backward(x, mu);
            let hop = psi[fwd].one_minus_gamma(mu, sign).color_mul(u.link(mu, x))
                + psi[bwd]
                    .one_minus_gamma(mu, -sign)
                    .color_adj_mul(u.link(mu, bwd));
            r += hop.scale(self.coeffs[mu]);
        }
        r
    }

    /// `chi_cb = D psi` on checkerboard `cb`; reads `psi` on the other one.
    pub fn apply(
        &self,
        u: &GaugeField,
        chi: &mut LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
        cb: Parity,
    ) {
        let sign = isign.sign();
        let sites = self.layout.sites(cb);
        let values: Vec<Spinor> = sites
            .par_iter()
            .map(|&x| self.site_apply(u, psi, x, sign))
            .collect();
        chi.scatter(sites, values);
    }

    /// Raw force of `Re(χ_cb† D ψ)`.
    ///
    /// The derivative of a hopping term does not depend on the links, so
    /// none are taken.
    pub fn deriv(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
        cb: Parity,
    ) -> GaugeField {
        let layout = &self.layout;
        let sign = isign.sign();
        let sites = layout.sites(cb);
        // (forward link at x, backward link at x−μ̂) per direction.
        let per_site: Vec<[(ColorMatrix, ColorMatrix); ND]> = sites
            .par_iter()
            .map(|&x| {
                std::array::from_fn(|mu| {
                    let c = self.coeffs[mu];
                    let fwd = psi[layout.forward(x, mu)].one_minus_gamma(mu, sign);
                    let bwd = psi[layout.backward(x, mu)].one_minus_gamma(mu, -sign);
                    (
                        fwd.spin_trace_outer(&chi[x]).scale(c),
                        bwd.spin_trace_outer(&chi[x]).adjoint().scale(c),
                    )
                })
            })
            .collect();

        let mut ds = GaugeField::zeros(layout.volume());
        for (&x, links) in sites.iter().zip(&per_site) {
            for (mu, (f, b)) in links.iter().enumerate() {
                *ds.link_mut(mu, x) += *f;
                *ds.link_mut(mu, layout.backward(x, mu)) += *b;
            }
        }
        ds
    }
}
