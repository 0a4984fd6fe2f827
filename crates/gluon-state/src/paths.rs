//! Products of links along lattice paths, and their derivatives.
//!
//! A path is a list of unit steps from a starting site. A forward step in
//! `μ` from `y` multiplies by `U_μ(y)` and moves to `y+μ̂`; a backward step
//! moves to `y−μ̂` and multiplies by `U_μ(y−μ̂)†`.
//!
//! [`path_derivative`] is the adjoint of [`path_product`] under the
//! pairing `Re tr(X δU)`: for a weight `W`, it accumulates into `X` the
//! raw force of `Re tr(W · P)` where `P` is the path product. Staples,
//! clover leaves and stout smearing are all expressed this way.

use gluon_core::{ColorMatrix, GaugeField};
use gluon_layout::Layout;
use smallvec::{smallvec, SmallVec};

/// One unit step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Direction.
    pub mu: usize,
    /// `true` for `+μ̂`.
    pub forward: bool,
}

impl Step {
    /// `+μ̂`.
    pub const fn fwd(mu: usize) -> Self {
        Self { mu, forward: true }
    }

    /// `−μ̂`.
    pub const fn bwd(mu: usize) -> Self {
        Self { mu, forward: false }
    }
}

/// A short path. Plaquette-sized paths stay on the stack.
pub type Path = SmallVec<[Step; 4]>;

/// One traversed link: where it is stored and whether it enters daggered.
#[derive(Clone, Copy, Debug)]
struct Traversed {
    mu: usize,
    site: usize,
    forward: bool,
}

fn walk(layout: &Layout, start: usize, steps: &[Step]) -> SmallVec<[Traversed; 4]> {
    let mut y = start;
    let mut out = SmallVec::new();
    for s in steps {
        if s.forward {
            out.push(Traversed {
                mu: s.mu,
                site: y,
                forward: true,
            });
            y = layout.forward(y, s.mu);
        } else {
            y = layout.backward(y, s.mu);
            out.push(Traversed {
                mu: s.mu,
                site: y,
                forward: false,
            });
        }
    }
    out
}

fn link_factor(u: &GaugeField, t: &Traversed) -> ColorMatrix {
    let l = u.link(t.mu, t.site);
    if t.forward {
        *l
    } else {
        l.adjoint()
    }
}

/// Ordered product of links along `steps` starting at `start`.
pub fn path_product(layout: &Layout, u: &GaugeField, start: usize, steps: &[Step]) -> ColorMatrix {
    walk(layout, start, steps)
        .iter()
        .fold(ColorMatrix::IDENTITY, |acc, t| acc * link_factor(u, t))
}

/// Accumulate into `x` the raw force of `Re tr(W · P)`, with `P` the
/// product along `steps` from `start`.
///
/// For link `k` of `P = L₁⋯Lₙ` the contribution is
/// `M_k = L_{k+1}⋯Lₙ · W · L₁⋯L_{k−1}`, stored as is for forward links
/// and as `M_k†` for daggered ones.
pub fn path_derivative(
    layout: &Layout,
    u: &GaugeField,
    start: usize,
    steps: &[Step],
    w: &ColorMatrix,
    x: &mut GaugeField,
) {
    let links = walk(layout, start, steps);
    let n = links.len();
    let factors: SmallVec<[ColorMatrix; 4]> = links.iter().map(|t| link_factor(u, t)).collect();

    // suffix[k] = L_k ⋯ L_{n-1} (0-based), suffix[n] = 1.
    let mut suffix: SmallVec<[ColorMatrix; 5]> = smallvec![ColorMatrix::IDENTITY; n + 1];
    for k in (0..n).rev() {
        suffix[k] = factors[k] * suffix[k + 1];
    }

    let mut prefix = ColorMatrix::IDENTITY;
    for (k, t) in links.iter().enumerate() {
        let m = suffix[k + 1] * *w * prefix;
        let slot = x.link_mut(t.mu, t.site);
        if t.forward {
            *slot += m;
        } else {
            *slot += m.adjoint();
        }
        prefix = prefix * factors[k];
    }
}

/// The upper and lower staples of `U_μ(x)` in the `μν` plane.
///
/// Each runs from `x` to `x+μ̂`, so `staple · U_μ(x)†` is a closed loop.
pub fn staples(mu: usize, nu: usize) -> [Path; 2] {
    [
        smallvec![Step::fwd(nu), Step::fwd(mu), Step::bwd(nu)],
        smallvec![Step::bwd(nu), Step::fwd(mu), Step::fwd(nu)],
    ]
}

/// The four plaquette leaves at a site in the `μν` plane, all with the
/// same orientation; their sum is the clover `Q_μν`.
pub fn clover_leaves(mu: usize, nu: usize) -> [Path; 4] {
    [
        smallvec![Step::fwd(mu), Step::fwd(nu), Step::bwd(mu), Step::bwd(nu)],
        smallvec![Step::fwd(nu), Step::bwd(mu), Step::bwd(nu), Step::fwd(mu)],
        smallvec![Step::bwd(mu), Step::bwd(nu), Step::fwd(mu), Step::fwd(nu)],
        smallvec![Step::bwd(nu), Step::fwd(mu), Step::fwd(nu), Step::bwd(mu)],
    ]
}

/// `U_μ(x) U_ν(x+μ̂) U_μ(x+ν̂)† U_ν(x)†`.
pub fn plaquette(layout: &Layout, u: &GaugeField, site: usize, mu: usize, nu: usize) -> ColorMatrix {
    path_product(layout, u, site, &clover_leaves(mu, nu)[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_core::{Complex64, ND};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_links(layout: &Layout, seed: u64) -> GaugeField {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut u = GaugeField::identity(layout.volume());
        for mu in 0..ND {
            for l in u.dir_mut(mu) {
                *l = ColorMatrix::random_su3(&mut rng, 0.9);
            }
        }
        u
    }

    #[test]
    fn staple_closes_into_plaquettes() {
        let layout = Layout::new([4, 4, 2, 2]).unwrap();
        let u = random_links(&layout, 1);
        let x = layout.site([1, 2, 0, 1]);
        let [up, _] = staples(0, 1);
        let loop_ = path_product(&layout, &u, x, &up) * u.link(0, x).adjoint();
        let p = plaquette(&layout, &u, x, 1, 0);
        assert!(loop_.max_abs_diff(&p) < 1e-12);
    }

    #[test]
    fn leaves_have_equal_trace_on_trivial_links() {
        let layout = Layout::new([2, 2, 2, 2]).unwrap();
        let u = GaugeField::identity(layout.volume());
        for leaf in clover_leaves(1, 3) {
            let p = path_product(&layout, &u, 3, &leaf);
            assert!(p.max_abs_diff(&ColorMatrix::IDENTITY) < 1e-15);
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let layout = Layout::new([2, 4, 2, 2]).unwrap();
        let u = random_links(&layout, 9);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let w = ColorMatrix::random_su3(&mut rng, 1.0).scale(0.7);
        let start = layout.site([1, 1, 0, 1]);
        let path: Path = smallvec![Step::fwd(1), Step::bwd(0), Step::bwd(1), Step::fwd(3), Step::fwd(0)];

        let mut x = GaugeField::zeros(layout.volume());
        path_derivative(&layout, &u, start, &path, &w, &mut x);

        let f = |g: &GaugeField| (w * path_product(&layout, g, start, &path)).re_trace();
        let h = 1e-6;
        for mu in 0..ND {
            for site in 0..layout.volume() {
                let dir = ColorMatrix::random_su3(&mut rng, 1.0)
                    + ColorMatrix::IDENTITY.scale_complex(Complex64::new(0.2, 0.1));
                let mut plus = u.clone();
                let mut minus = u.clone();
                *plus.link_mut(mu, site) += dir.scale(h);
                *minus.link_mut(mu, site) -= dir.scale(h);
                let fd = (f(&plus) - f(&minus)) / (2.0 * h);
                let an = (*x.link(mu, site) * dir).re_trace();
                assert!((fd - an).abs() < 1e-7, "mu={mu} site={site}: {fd} vs {an}");
            }
        }
    }
}
