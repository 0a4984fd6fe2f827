//! Stout link smearing and its chain rule.
//!
//! One level maps thin links `U` to fat links
//! `V_μ(x) = exp(A_μ(x)) U_μ(x)` with `A = TA(C U†)` and
//! `C_μ(x) = ρ Σ_{ν≠μ} (upper + lower staple)`. Directions excluded from
//! smearing are copied unchanged and contribute no staples.
//!
//! The chain rule pulls a raw force `X_V` (w.r.t. `V`) back to `X_U`:
//! with `(E, L) = (exp A, L_A(U X_V))` and `Γ = TA(L)`,
//!
//! ```text
//! X_U(ℓ)  += X_V(ℓ) E − C(ℓ)† Γ(ℓ)
//! X_U(ℓ') += path derivative of Re tr(ρ U(ℓ)† Γ(ℓ) · staple)   for each staple link ℓ'
//! ```

use gluon_core::{ColorMatrix, ConfigError, GaugeField, ND};
use gluon_layout::Layout;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};
use rayon::prelude::*;

use crate::paths::{path_derivative, path_product, staples};

/// Stout smearing parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct StoutParams {
    /// Number of smearing levels.
    pub n_smear: usize,
    /// Staple weight.
    pub rho: f64,
    /// Which directions are smeared.
    pub smear_dirs: [bool; ND],
}

impl StoutParams {
    /// Smear in every direction.
    pub fn new(n_smear: usize, rho: f64) -> Self {
        Self {
            n_smear,
            rho,
            smear_dirs: [true; ND],
        }
    }

    /// Leave `dir` unsmeared (and out of every staple sum).
    pub fn with_orthog_dir(mut self, dir: usize) -> Self {
        self.smear_dirs = [true; ND];
        if dir < ND {
            self.smear_dirs[dir] = false;
        }
        self
    }

    fn orthog_dir(&self) -> i32 {
        self.smear_dirs
            .iter()
            .position(|&s| !s)
            .map_or(-1, |d| d as i32)
    }
}

impl ReadXml for StoutParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let n_smear: usize = block.read("n_smear")?;
        let rho: f64 = block.read("rho")?;
        let orthog: i32 = block.read_or("orthog_dir", -1)?;
        if !(-1..ND as i32).contains(&orthog) {
            return Err(ConfigError::invalid(
                block.full_path("orthog_dir"),
                format!("expected -1 or a direction below {ND}, found {orthog}"),
            ));
        }
        let params = Self::new(n_smear, rho);
        Ok(if orthog >= 0 {
            params.with_orthog_dir(orthog as usize)
        } else {
            params
        })
    }
}

impl WriteXml for StoutParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("n_smear", &self.n_smear);
        xml.write("rho", &self.rho);
        xml.write("orthog_dir", &self.orthog_dir());
        xml.pop();
    }
}

/// Per-link staple sums `C = ρ Σ staples` of one level.
fn staple_sums(layout: &Layout, params: &StoutParams, u: &GaugeField, mu: usize) -> Vec<ColorMatrix> {
    (0..layout.volume())
        .into_par_iter()
        .map(|site| {
            let mut c = ColorMatrix::ZERO;
            for nu in (0..ND).filter(|&nu| nu != mu && params.smear_dirs[nu]) {
                for path in staples(mu, nu) {
                    c += path_product(layout, u, site, &path);
                }
            }
            c.scale(params.rho)
        })
        .collect()
}

/// One smearing level: `U → V`.
pub fn smear_once(layout: &Layout, params: &StoutParams, u: &GaugeField) -> GaugeField {
    let mut v = u.clone();
    for mu in (0..ND).filter(|&mu| params.smear_dirs[mu]) {
        let c = staple_sums(layout, params, u, mu);
        let fat: Vec<ColorMatrix> = u
            .dir(mu)
            .par_iter()
            .zip(c.par_iter())
            .map(|(link, cs)| (*cs * link.adjoint()).traceless_antihermitian().exp() * *link)
            .collect();
        v.dir_mut(mu).copy_from_slice(&fat);
    }
    v
}

/// All levels `[U, V₁, …, V_n]`, thin first.
pub fn smear_levels(layout: &Layout, params: &StoutParams, u: &GaugeField) -> Vec<GaugeField> {
    let mut levels = Vec::with_capacity(params.n_smear + 1);
    levels.push(u.clone());
    for _ in 0..params.n_smear {
        let next = match levels.last() {
            Some(prev) => smear_once(layout, params, prev),
            None => u.clone(),
        };
        levels.push(next);
    }
    levels
}

/// Pull `x_v`, a raw force w.r.t. `smear_once(u)`, back to a raw force
/// w.r.t. `u`.
pub fn chain_rule_once(
    layout: &Layout,
    params: &StoutParams,
    u: &GaugeField,
    x_v: &GaugeField,
) -> GaugeField {
    let mut x_u = GaugeField::zeros(layout.volume());
    for mu in 0..ND {
        if !params.smear_dirs[mu] {
            x_u.dir_mut(mu).copy_from_slice(x_v.dir(mu));
            continue;
        }
        let c = staple_sums(layout, params, u, mu);
        // (local contribution, staple weight ρ U†Γ) per site.
        let per_site: Vec<(ColorMatrix, ColorMatrix)> = (0..layout.volume())
            .into_par_iter()
            .map(|site| {
                let link = u.link(mu, site);
                let xv = x_v.link(mu, site);
                let a = (c[site] * link.adjoint()).traceless_antihermitian();
                let (e, l) = a.exp_frechet(&(*link * *xv));
                let gamma = l.traceless_antihermitian();
                let local = *xv * e - c[site].adjoint() * gamma;
                (local, (link.adjoint() * gamma).scale(params.rho))
            })
            .collect();

        for (site, (local, w)) in per_site.iter().enumerate() {
            *x_u.link_mut(mu, site) += *local;
            for nu in (0..ND).filter(|&nu| nu != mu && params.smear_dirs[nu]) {
                for path in staples(mu, nu) {
                    path_derivative(layout, u, site, &path, w, &mut x_u);
                }
            }
        }
    }
    x_u
}

/// Pull a force w.r.t. the last level of `levels` back to the first.
pub fn chain_rule(
    layout: &Layout,
    params: &StoutParams,
    levels: &[GaugeField],
    x_fat: &GaugeField,
) -> GaugeField {
    let mut x = x_fat.clone();
    for thin in levels.iter().rev().skip(1) {
        x = chain_rule_once(layout, params, thin, &x);
    }
    x
}
